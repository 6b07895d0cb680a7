//! Criterion micro-benchmarks for registry and schedule operations.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use silt_bench::reference_mesh;
use silt_core::{GhostWidth, Level, SlotIndex, StructureId};
use silt_coupling::{StructureActivationTable, TransferAlgorithmRegistry};
use silt_mesh::TransferAlgorithm;

fn populated_registry(entries: u32) -> TransferAlgorithmRegistry {
    let mut reg = TransferAlgorithmRegistry::new();
    for i in 0..entries {
        let algorithm =
            TransferAlgorithm::new(vec![SlotIndex(i)], GhostWidth(4), "linear_refine");
        reg.register_ghost_fill(format!("field-{i}"), algorithm.clone(), None)
            .unwrap();
        reg.register_prolongation(format!("field-{i}"), algorithm.clone(), None)
            .unwrap();
        reg.register_coarsening(format!("field-{i}"), algorithm, None)
            .unwrap();
    }
    reg
}

fn bench_schedule_rebuild(c: &mut Criterion) {
    let config = reference_mesh();
    let mut group = c.benchmark_group("schedule_rebuild");
    for entries in [4u32, 16, 64] {
        group.bench_function(format!("{entries}_entries"), |b| {
            let mut reg = populated_registry(entries);
            b.iter(|| {
                reg.rebuild_schedules(black_box(&config)).unwrap();
            });
        });
    }
    group.finish();
}

fn bench_activation_churn(c: &mut Criterion) {
    let config = reference_mesh();
    c.bench_function("activation_toggle_256", |b| {
        let mut table = StructureActivationTable::new();
        b.iter(|| {
            for id in 0..256u32 {
                table
                    .deactivate(StructureId(id), Level::Finest, &config)
                    .unwrap();
                table
                    .activate(StructureId(id), Level::Finest, &config)
                    .unwrap();
            }
            black_box(table.len())
        });
    });

    c.bench_function("activation_query_miss", |b| {
        let table = StructureActivationTable::new();
        b.iter(|| {
            let mut active = 0u32;
            for id in 0..256u32 {
                if table
                    .is_activated(StructureId(id), Level::Number(1), &config)
                    .unwrap()
                {
                    active += 1;
                }
            }
            black_box(active)
        });
    });
}

criterion_group!(benches, bench_schedule_rebuild, bench_activation_churn);
criterion_main!(benches);
