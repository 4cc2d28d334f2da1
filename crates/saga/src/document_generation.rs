//! Document generation saga constants and key schemes.

use common::TransactionId;

/// Step name: fetch the student record.
pub const STEP_OBTENER_ALUMNO: &str = "obtener_alumno";

/// Step name: fetch the specialty record.
pub const STEP_OBTENER_ESPECIALIDAD: &str = "obtener_especialidad";

/// Step name: render the document.
pub const STEP_GENERAR_DOCUMENTO: &str = "generar_documento";

/// Cache key for a fetched student record.
pub fn alumno_cache_key(alumno_id: u64) -> String {
    format!("cache:alumno:{alumno_id}")
}

/// Cache key for a fetched specialty record.
pub fn especialidad_cache_key(especialidad_id: u64) -> String {
    format!("cache:especialidad:{especialidad_id}")
}

/// Key for temporary rendering artifacts of a transaction.
pub fn documento_temp_key(transaction_id: &TransactionId) -> String {
    format!("temp:documento:{transaction_id}")
}

/// Template family for a document type. Renderers resolve the rest.
pub fn template_name(tipo_documento: &str) -> String {
    format!("{}.html", tipo_documento.to_lowercase())
}
