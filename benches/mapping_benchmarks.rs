//! Benchmarks for the pose to MIDI mapping path

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use head_pose_midi::{
    calibration::CalibrationSet,
    mapping::map_value,
    midi::{
        emitter::{preview, MidiEmitter},
        NullTransport,
    },
    pose::Pose,
};

fn random_poses(count: usize) -> Vec<Pose> {
    (0..count)
        .map(|_| {
            Pose::new(
                60.0 * rand::random::<f64>() - 30.0,
                60.0 * rand::random::<f64>() - 30.0,
                60.0 * rand::random::<f64>() - 30.0,
            )
        })
        .collect()
}

fn benchmark_map_value(c: &mut Criterion) {
    c.bench_function("map_value", |b| {
        b.iter(|| black_box(map_value(black_box(12.3), black_box(-30.0), black_box(30.0), 0, 127)));
    });
}

fn benchmark_emitter(c: &mut Criterion) {
    let mut group = c.benchmark_group("emitter");
    let calibration = CalibrationSet::default();
    let poses = random_poses(100);

    group.bench_function("process_changing_100", |b| {
        let mut emitter = MidiEmitter::new(NullTransport);
        b.iter(|| {
            for pose in &poses {
                black_box(emitter.process(pose, &calibration));
            }
        });
    });

    group.bench_function("process_steady_100", |b| {
        let mut emitter = MidiEmitter::new(NullTransport);
        let pose = poses[0];
        b.iter(|| {
            for _ in 0..100 {
                black_box(emitter.process(&pose, &calibration));
            }
        });
    });

    group.bench_function("preview_100", |b| {
        b.iter(|| {
            for pose in &poses {
                black_box(preview(pose, &calibration));
            }
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_map_value, benchmark_emitter);
criterion_main!(benches);
