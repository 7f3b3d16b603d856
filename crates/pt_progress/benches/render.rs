use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use pt_progress::{
    BarRenderer, BarWidth, FillBuffer, ManualProbe, MonitorConfig, ProgressSource, ResizeStrategy, Session,
    SharedProgress,
};
use std::io::sink;
use std::time::Duration;
use tokio::runtime::Runtime;

fn bench_draw_source(c: &mut Criterion) {
    let mut group = c.benchmark_group("draw_source");

    // a full 0 -> 100 sweep, the worst case for one pass
    for width in [40usize, 80, 200].iter() {
        group.bench_with_input(BenchmarkId::new("full_sweep", width), width, |b, &width| {
            let renderer = BarRenderer::new('>', BarWidth::Terminal);
            let fill = FillBuffer::new('=', width);
            let progress = SharedProgress::new();
            progress.set(100);
            let mut out = Vec::with_capacity(64 * 1024);
            b.iter(|| {
                out.clear();
                let mut source = ProgressSource::new(0, progress.clone());
                renderer.draw_source(&mut out, &mut source, &fill, width).unwrap();
            });
        });
    }

    group.bench_function("steady_state", |b| {
        let renderer = BarRenderer::new('>', BarWidth::Fixed(50));
        let fill = FillBuffer::new('=', 50);
        let progress = SharedProgress::new();
        progress.set(42);
        let mut source = ProgressSource::new(0, progress);
        let mut out = sink();
        b.iter(|| renderer.draw_source(&mut out, &mut source, &fill, 80).unwrap());
    });

    group.finish();
}

fn bench_session(c: &mut Criterion) {
    let mut group = c.benchmark_group("session");
    group.measurement_time(Duration::from_secs(10));
    let rt = Runtime::new().unwrap();

    for sources in [1usize, 10, 50].iter() {
        group.bench_with_input(BenchmarkId::new("run_to_completion", sources), sources, |b, &sources| {
            b.iter(|| {
                rt.block_on(async {
                    let config = MonitorConfig::builder()
                        .refresh_rate_ms(1)
                        .bar_length(50)
                        .resize(ResizeStrategy::Disabled)
                        .restore_on_signal(false)
                        .build()
                        .unwrap();
                    let mut session = Session::with_output(config, sink(), ManualProbe::default()).unwrap();
                    let progress: Vec<SharedProgress> = (0..sources).map(|_| SharedProgress::new()).collect();
                    for (i, p) in progress.iter().enumerate() {
                        session.add_source(i, p.clone()).unwrap();
                    }
                    session.start().unwrap();
                    for step in 0..=10u64 {
                        for p in &progress {
                            p.set_ratio(step, 10);
                        }
                        tokio::time::sleep(Duration::from_millis(1)).await;
                    }
                    session.finish().await.unwrap();
                })
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_draw_source, bench_session);
criterion_main!(benches);
