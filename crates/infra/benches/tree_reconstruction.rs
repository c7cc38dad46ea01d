use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::{Duration, Utc};
use pvz_core::{PickupPointId, ProductId, ReceptionId};
use pvz_infra::read_model::{reconstruct, FlatRow, ProductColumns, ReceptionColumns};
use pvz_pickup_points::City;
use pvz_products::ProductType;
use pvz_receptions::ReceptionStatus;

/// Rows of a left join over `points` pickup-points, each with `receptions`
/// receptions of `products` products.
fn joined_rows(points: usize, receptions: usize, products: usize) -> Vec<FlatRow> {
    let start = Utc::now() - Duration::days(30);
    let mut rows = Vec::with_capacity(points * receptions * products.max(1));

    for p in 0..points {
        let pickup_point_id = PickupPointId::new();
        let registered_at = start + Duration::minutes(p as i64);

        for r in 0..receptions {
            let reception = ReceptionColumns {
                id: ReceptionId::new(),
                status: if r + 1 == receptions { ReceptionStatus::InProgress } else { ReceptionStatus::Closed },
                created_at: registered_at + Duration::hours(r as i64),
            };
            for i in 0..products {
                rows.push(FlatRow {
                    pickup_point_id,
                    city: City::SaintPetersburg,
                    registered_at,
                    reception: Some(reception.clone()),
                    product: Some(ProductColumns {
                        id: ProductId::new(),
                        product_type: ProductType::Electronics,
                        created_at: reception.created_at + Duration::seconds(i as i64),
                    }),
                });
            }
        }
    }
    rows
}

fn bench_reconstruct(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconstruct");

    for &(points, receptions, products) in &[(10, 2, 10), (10, 5, 50), (100, 5, 50)] {
        let rows = joined_rows(points, receptions, products);
        group.throughput(Throughput::Elements(rows.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{points}x{receptions}x{products}")),
            &rows,
            |b, rows| b.iter(|| reconstruct(black_box(rows.clone()))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_reconstruct);
criterion_main!(benches);
