//! Merge Operations Benchmarks
//!
//! Benchmarks for coverage merging, LCOV parsing and report rendering.
//!
//! Run with: `cargo bench --bench merge_ops`

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fuzzcov::{
    ArtifactFormat, CoverageMerger, CoverageProfile, FuzzTarget, MergedCoverageModel,
    NavigationPatcher, ReportGenerator,
};

fn profile(target: usize, files: usize, lines: u32) -> CoverageProfile {
    let mut profile = CoverageProfile::new(FuzzTarget::new(&format!("fuzz_{target}")).unwrap());
    for f in 0..files {
        let file = profile.file_mut(&format!("/src/proj/file_{f}.c"));
        for line in 1..=lines {
            let hits = u64::from((line as usize + target) % 3 == 0);
            file.record_line(line, hits);
        }
    }
    profile
}

fn lcov_text(files: usize, lines: u32) -> String {
    let mut out = String::new();
    for f in 0..files {
        out.push_str(&format!("SF:/src/proj/file_{f}.c\n"));
        for line in 1..=lines {
            out.push_str(&format!("DA:{},{}\n", line, line % 4));
        }
        out.push_str("end_of_record\n");
    }
    out
}

fn merged(targets: usize) -> MergedCoverageModel {
    CoverageMerger::new(ArtifactFormat::Lcov)
        .merge_profiles("proj", (0..targets).map(|t| profile(t, 20, 200)))
        .unwrap()
}

fn bench_merge_profiles(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_profiles");

    for targets in [2, 8, 32] {
        let profiles: Vec<_> = (0..targets).map(|t| profile(t, 20, 200)).collect();
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_targets", targets)),
            &profiles,
            |bench, profiles| {
                bench.iter(|| {
                    let model = CoverageMerger::new(ArtifactFormat::Lcov)
                        .merge_profiles("proj", black_box(profiles.clone()));
                    black_box(model)
                });
            },
        );
    }

    group.finish();
}

fn bench_lcov_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("lcov_parse");

    for (files, lines) in [(10, 100), (50, 500)] {
        let text = lcov_text(files, lines);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", files, lines)),
            &text,
            |bench, text| {
                bench.iter(|| {
                    let target = FuzzTarget::new("fuzz").unwrap();
                    black_box(ArtifactFormat::Lcov.parse(target, black_box(text)))
                });
            },
        );
    }

    group.finish();
}

fn bench_model_digest(c: &mut Criterion) {
    let model = merged(8);
    c.bench_function("model_digest", |bench| {
        bench.iter(|| black_box(black_box(&model).digest()));
    });
}

fn bench_render_and_patch(c: &mut Criterion) {
    let model = merged(4);
    let generator = ReportGenerator::new();
    c.bench_function("render_and_patch", |bench| {
        bench.iter(|| {
            let doc = generator.render(black_box(&model));
            let patched = doc.map(|d| NavigationPatcher::new().patch(&d));
            black_box(patched)
        });
    });
}

criterion_group!(
    benches,
    bench_merge_profiles,
    bench_lcov_parse,
    bench_model_digest,
    bench_render_and_patch
);
criterion_main!(benches);
