use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::Utc;
use stockledger_catalog::{NewProduct, NewWarehouse};
use stockledger_core::{MovementId, ProductId, Quantity, WarehouseId};
use stockledger_infra::db;
use stockledger_infra::{AppConfig, CatalogStore, MovementProcessor, TransactionCoordinator};
use stockledger_inventory::{replay, MovementRequest, MovementType, StockMovement};
use tempfile::TempDir;
use tokio::runtime::Runtime;

struct Fixture {
    _dir: TempDir,
    processor: MovementProcessor,
    warehouses: (WarehouseId, WarehouseId),
    product: ProductId,
}

fn fixture(rt: &Runtime) -> Fixture {
    rt.block_on(async {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::for_database(format!("sqlite://{}", dir.path().join("bench.db").display()));
        let pool = db::connect(&config).await.unwrap();
        let catalog = CatalogStore::new(pool.clone());

        let w1 = catalog
            .create_warehouse(&NewWarehouse::new("Main", "WH-1", None).unwrap())
            .await
            .unwrap()
            .id;
        let w2 = catalog
            .create_warehouse(&NewWarehouse::new("Overflow", "WH-2", None).unwrap())
            .await
            .unwrap()
            .id;
        let product = catalog
            .create_product(&NewProduct::new("SKU-1", "Bolt", None, None).unwrap())
            .await
            .unwrap()
            .id;

        Fixture {
            _dir: dir,
            processor: MovementProcessor::new(catalog, TransactionCoordinator::new(pool, config.lock_timeout)),
            warehouses: (w1, w2),
            product,
        }
    })
}

fn movement(t: MovementType, w: WarehouseId, to: Option<WarehouseId>, p: ProductId, qty: i64) -> MovementRequest {
    MovementRequest {
        movement_type: t,
        warehouse_id: w,
        warehouse_to_id: to,
        product_id: p,
        qty,
        reason: None,
        ref_no: Some("BENCH".to_string()),
    }
}

fn bench_movement_latency(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let f = fixture(&rt);
    let (w1, w2) = f.warehouses;

    let mut group = c.benchmark_group("movement_latency");
    group.throughput(Throughput::Elements(1));

    group.bench_function("in", |b| {
        b.iter(|| {
            let outcome = rt
                .block_on(f.processor.process(movement(MovementType::In, w1, None, f.product, 1)))
                .unwrap();
            black_box(outcome);
        });
    });

    group.bench_function("transfer", |b| {
        rt.block_on(f.processor.process(movement(MovementType::In, w1, None, f.product, 1_000_000)))
            .unwrap();
        b.iter(|| {
            let outcome = rt
                .block_on(f.processor.process(movement(MovementType::Transfer, w1, Some(w2), f.product, 1)))
                .unwrap();
            black_box(outcome);
        });
    });

    group.bench_function("rejected_overdraw", |b| {
        b.iter(|| {
            let err = rt
                .block_on(f.processor.process(movement(MovementType::Out, w2, None, f.product, i64::MAX / 2)))
                .unwrap_err();
            black_box(err);
        });
    });

    group.finish();
}

fn synthetic_log(len: usize) -> Vec<StockMovement> {
    let (w1, w2, p) = (WarehouseId::new(1), WarehouseId::new(2), ProductId::new(1));
    (0..len)
        .map(|i| {
            let (movement_type, to) = match i % 3 {
                0 => (MovementType::In, None),
                1 => (MovementType::Transfer, Some(w2)),
                _ => (MovementType::Out, None),
            };
            StockMovement {
                id: MovementId::new(i as i64 + 1),
                movement_type,
                warehouse_id: w1,
                warehouse_to_id: to,
                product_id: p,
                qty: Quantity::new(1).unwrap(),
                reason: None,
                ref_no: None,
                created_at: Utc::now(),
                src_qty_before: 0,
                src_qty_after: 0,
                dst_qty_before: to.map(|_| 0),
                dst_qty_after: to.map(|_| 0),
            }
        })
        .collect()
}

fn bench_log_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("log_replay");
    for len in [100usize, 1_000, 10_000] {
        let log = synthetic_log(len);
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &log, |b, log| {
            b.iter(|| black_box(replay(log, WarehouseId::new(1), ProductId::new(1))));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_movement_latency, bench_log_replay);
criterion_main!(benches);
