//! Lookout Benchmark Suite
//!
//! Performance targets:
//!   entity_first_refresh ............. < 20μs
//!   entity_steady_refresh ............ < 5μs
//!   area_tick_200_entities ........... < 2ms
//!   zone_assess ...................... < 10ns

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use lookout_area::{AreaInstance, AreaSnapshot, RawEntity};
use lookout_bench::{chest, monster, player};
use lookout_core::config::LookoutConfig;
use lookout_core::zone::assess;
use lookout_core::{Entity, EntityId, RefreshContext, SnapshotMemory};

fn ctx(config: &LookoutConfig) -> RefreshContext<'_> {
    RefreshContext {
        config,
        local_player_id: Some(EntityId(1)),
        address_changed: false,
    }
}

/// Benchmark: first refresh of an entity (rebuild plus all three stages).
fn bench_first_refresh(c: &mut Criterion) {
    let mem = Arc::new(SnapshotMemory::new());
    let config = LookoutConfig::default();
    let written = monster(2, 10.0).write(&mem);

    c.bench_function("entity_first_refresh", |b| {
        b.iter_batched(
            || Entity::new(written.address, mem.clone(), &config),
            |mut entity| black_box(entity.refresh(&ctx(&config))),
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark: refresh of an already classified entity.
fn bench_steady_refresh(c: &mut Criterion) {
    let mem = Arc::new(SnapshotMemory::new());
    let config = LookoutConfig::default();
    let written = monster(2, 10.0).write(&mem);
    let mut entity = Entity::new(written.address, mem.clone(), &config);
    entity.refresh(&ctx(&config));

    c.bench_function("entity_steady_refresh", |b| {
        b.iter(|| black_box(entity.refresh(black_box(&ctx(&config)))));
    });
}

/// Benchmark: one area tick over 200 already known entities.
fn bench_area_tick(c: &mut Criterion) {
    let mem = Arc::new(SnapshotMemory::new());
    let config = LookoutConfig::default();
    let me = player().write(&mem);
    let entities: Vec<RawEntity> = (2..202u32)
        .map(|id| {
            #[allow(clippy::cast_precision_loss)]
            let x = (id % 80) as f32;
            let spec = if id % 3 == 0 { chest(id, x) } else { monster(id, x) };
            RawEntity::new(u64::from(id), spec.write(&mem).address)
        })
        .collect();
    let snapshot = AreaSnapshot {
        area_hash: 1,
        player: Some(RawEntity::new(1, me.address)),
        entities,
    };
    let mut area = AreaInstance::new(1, mem.clone());
    area.tick(&config, &snapshot);

    c.bench_function("area_tick_200_entities", |b| {
        b.iter(|| black_box(area.tick(&config, black_box(&snapshot))));
    });
}

/// Benchmark: zone assessment.
fn bench_zone_assess(c: &mut Criterion) {
    let config = LookoutConfig::default();
    c.bench_function("zone_assess", |b| {
        b.iter(|| black_box(assess(black_box(45), &config.zones)));
    });
}

criterion_group!(
    benches,
    bench_first_refresh,
    bench_steady_refresh,
    bench_area_tick,
    bench_zone_assess,
);
criterion_main!(benches);
