//! 积分与排行榜性能基准测试
//!
//! 测试覆盖：
//! - 单日积分计算
//! - 不同参与人数下的排名计算
//! - 排行榜推送消息序列化

use challenge_service::models::{UserTotal, rank_standings};
use challenge_service::realtime::ServerMessage;
use challenge_service::scoring::{ActivityCounts, ActivityKind, MAX_GENERIC_COUNT, score};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

/// 典型的一天
fn typical_day() -> ActivityCounts {
    ActivityCounts {
        daily_prayers: 5,
        tahajud: 1,
        tarawih20: 1,
        fasting: 1,
        quran_arabic_pages: 3,
        islamic_book_pages: 5,
        podcast_minutes: 10,
        salawat: 100,
        ..Default::default()
    }
}

/// 生成参与者总分，包含大量并列分数
fn create_totals(count: usize) -> Vec<UserTotal> {
    (0..count)
        .map(|i| UserTotal {
            user_id: i as i64 + 1,
            user_name: if i % 7 == 0 {
                None
            } else {
                Some(format!("participant_{}", i))
            },
            total_points: ((i * 37) % 500) as i64 * 10,
        })
        .collect()
}

fn bench_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("score");

    let typical = typical_day();
    group.bench_function("typical_day", |b| b.iter(|| score(black_box(&typical))));

    let maxed = ActivityKind::ALL
        .iter()
        .fold(ActivityCounts::default(), |counts, kind| {
            counts.with(*kind, MAX_GENERIC_COUNT)
        });
    group.bench_function("max_counts", |b| b.iter(|| score(black_box(&maxed))));

    group.finish();
}

fn bench_rank_standings(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank_standings");

    for count in [10, 100, 1000, 10000].iter() {
        let totals = create_totals(*count);

        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| rank_standings(black_box(totals.clone())))
        });
    }

    group.finish();
}

fn bench_update_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("leaderboard_update_json");

    for count in [10, 100, 1000].iter() {
        let entries = rank_standings(create_totals(*count));

        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| {
                let json =
                    serde_json::to_string(&ServerMessage::LeaderboardUpdate(black_box(&entries)));
                black_box(json)
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_score,
    bench_rank_standings,
    bench_update_serialization,
);

criterion_main!(benches);
