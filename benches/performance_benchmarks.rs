use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use treadlog::{aggregate, database, metrics, steps};
use treadlog::{StepCount, UserProfile, WorkoutInput, WorkoutRecord};

/// Performance benchmarks for workout metrics and aggregation
///
/// History sizes cover a few weeks up to several years of daily sessions.

fn create_workout_history(count: usize) -> Vec<WorkoutRecord> {
    let start = Utc.with_ymd_and_hms(2020, 1, 1, 7, 0, 0).unwrap();
    (0..count)
        .map(|i| {
            let input = WorkoutInput {
                total_duration_minutes: 30.0 + (i % 40) as f64,
                running_duration_minutes: (i % 25) as f64,
                running_speed_kmh: 8.0 + (i % 9) as f64,
                walking_speed_kmh: 3.0 + (i % 4) as f64,
            };
            WorkoutRecord::with_date(input, start + Duration::hours(20 * i as i64))
        })
        .collect()
}

fn bench_workout_metrics(c: &mut Criterion) {
    let profile = UserProfile::default();
    let mut group = c.benchmark_group("Workout Metrics");

    for &size in &[1, 10, 100, 1000] {
        let workouts = create_workout_history(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("compute", size), &workouts, |b, workouts| {
            b.iter(|| {
                for workout in workouts {
                    black_box(metrics::WorkoutMetrics::compute(workout, &profile));
                }
            });
        });
    }

    group.finish();
}

fn bench_daily_summary(c: &mut Criterion) {
    let profile = UserProfile::default();
    let day_start = Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap();
    let mut group = c.benchmark_group("Daily Summary");

    for &size in &[30, 365, 1825] {
        let workouts = create_workout_history(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("build", size), &workouts, |b, workouts| {
            b.iter(|| {
                aggregate::DailySummary::build(
                    black_box(workouts),
                    &profile,
                    StepCount::Available(8_500),
                    day_start,
                )
            });
        });
    }

    group.finish();
}

fn bench_met_lookup(c: &mut Criterion) {
    c.bench_function("met_lookup_sweep", |b| {
        b.iter(|| {
            let mut total = 0.0;
            for tenth in 0..250 {
                let speed = f64::from(tenth) / 10.0;
                total += metrics::walking_met(black_box(speed)) + metrics::running_met(black_box(speed));
            }
            total
        });
    });

    c.bench_function("step_estimate", |b| {
        b.iter(|| steps::StepEstimate::compute(black_box(12_345), 72.0, 10_000));
    });
}

fn bench_database_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("Database Operations");
    group.sample_size(20);

    for &size in &[100, 1000] {
        let workouts = create_workout_history(size);

        group.bench_with_input(
            BenchmarkId::new("insert_and_list", size),
            &workouts,
            |b, workouts| {
                b.iter(|| {
                    let mut db = database::Database::in_memory().unwrap();
                    for workout in workouts {
                        db.insert_workout(workout).unwrap();
                    }
                    black_box(db.list_workouts().unwrap())
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_workout_metrics,
    bench_daily_summary,
    bench_met_lookup,
    bench_database_operations
);
criterion_main!(benches);
