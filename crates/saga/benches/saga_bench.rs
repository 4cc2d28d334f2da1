use criterion::{Criterion, criterion_group, criterion_main};
use kv_store::InMemoryKvBackend;
use saga::{InMemoryRemoteService, InMemoryRenderer, SagaOrchestrator, SagaTransaction};
use serde_json::{Map, Value, json};

fn bench_transaction_bookkeeping(c: &mut Criterion) {
    c.bench_function("saga/step_and_compensation_queue", |b| {
        b.iter(|| {
            let mut metadata = Map::new();
            metadata.insert("formato".to_string(), Value::from("pdf"));
            let mut saga = SagaTransaction::new(1, 2, "CERTIFICADO_REGULAR", metadata);

            saga.add_completed_step("obtener_alumno");
            saga.add_completed_step("obtener_especialidad");
            saga.add_completed_step("generar_documento");
            while saga.next_compensation().is_some() {}
        });
    });
}

fn bench_record_roundtrip(c: &mut Criterion) {
    let mut metadata = Map::new();
    metadata.insert("formato".to_string(), Value::from("pdf"));
    let mut saga = SagaTransaction::new(1, 2, "CERTIFICADO_REGULAR", metadata);
    saga.add_completed_step("obtener_alumno");
    saga.add_completed_step("obtener_especialidad");

    c.bench_function("saga/record_json_roundtrip", |b| {
        b.iter(|| {
            let json = serde_json::to_string(&saga).unwrap();
            let _: SagaTransaction = serde_json::from_str(&json).unwrap();
        });
    });
}

fn bench_full_orchestration(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let backend = InMemoryKvBackend::new();
    let alumnos = InMemoryRemoteService::new();
    alumnos.insert(1, json!({"nombre": "MARIANO", "apellido": "SOSA"}));
    let especialidades = InMemoryRemoteService::new();
    especialidades.insert(2, json!({"nombre": "Ingeniería en Sistemas"}));
    let orchestrator =
        SagaOrchestrator::new(backend, alumnos, especialidades, InMemoryRenderer::new());

    c.bench_function("saga/full_run_happy_path", |b| {
        b.iter(|| {
            rt.block_on(async {
                orchestrator
                    .run(1, 2, "CERTIFICADO_REGULAR", "pdf")
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_transaction_bookkeeping,
    bench_record_roundtrip,
    bench_full_orchestration
);
criterion_main!(benches);
