use criterion::{Criterion, black_box, criterion_group, criterion_main};
use lathe_core::{FeedRequest, JoystickDirection, Position, SoftLimits, plan_feed};

// Spread of tool positions across the envelope, deterministic.
fn positions(n: usize, limits: &SoftLimits) -> Vec<Position> {
    let mut state = 0x2545_F491_u32;
    let mut next = || {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        f64::from(state) / (f64::from(u32::MAX) + 1.0)
    };
    (0..n)
        .map(|_| {
            let x = limits.x_min + next() * (limits.x_max - limits.x_min);
            let z = limits.z_min + next() * (limits.z_max - limits.z_min);
            Position::new(x, z)
        })
        .collect()
}

pub fn bench_plan_feed(c: &mut Criterion) {
    let mut g = c.benchmark_group("plan_feed");
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE")
        && let Ok(n) = ss.parse::<usize>()
    {
        g.sample_size(n.max(10));
    }

    let limits = SoftLimits::new(0.0, 140.0, -500.0, 0.0);
    let points = positions(1024, &limits);

    for (name, angle) in [("straight", None), ("taper_30", Some(30.0)), ("taper_60", Some(60.0))] {
        g.bench_function(name, |b| {
            b.iter(|| {
                for (i, &pos) in points.iter().enumerate() {
                    let req = FeedRequest {
                        direction: JoystickDirection::DEFLECTED[i % 4],
                        feed_per_rev: 0.1,
                        taper_angle_deg: angle,
                        position: Some(pos),
                    };
                    let _ = black_box(plan_feed(black_box(&req), &limits));
                }
            });
        });
    }
    g.finish();
}

criterion_group!(path_planner, bench_plan_feed);
criterion_main!(path_planner);
