use criterion::{black_box, criterion_group, criterion_main, Criterion};
use optolog::align::align;
use optolog::collect::heartbeat::{decode_aps, decode_fixed};
use optolog::collect::CollectorSet;
use optolog::index::EventIndex;
use optolog::store::LineStore;

const NPO_ROW: &str =
    "    *   * -0.050 -1.200 12 0.010 0.020 3 4 0.300 5 1.2e+06 1234.5 5000 120 80";

const APS_ROW: &str =
    "  OPT 0:00:12 -0.10 -5.00 1234.5 0.30 0.02 100 200 50 12.5 2048 -0.03";

/// A synthetic place_opt run repeated `rounds` times.
fn synthetic_log(rounds: usize) -> String {
    let mut lines = Vec::with_capacity(rounds * 24);
    lines.push("                IC Compiler II (TM)".to_string());
    lines.push("    Version T-2022.03 for linux64".to_string());

    for i in 0..rounds {
        let elapse = 100 + i * 30;
        lines.push(format!("START_CMD: place_opt CPU: {i}.0 s"));
        lines.push("Running initial placement".to_string());
        lines.push(format!(
            "START_FUNC: legalize_placement CPU: 1 s ELAPSE: {elapse} s MEM-PEAK: 900 Mb"
        ));
        lines.push("Starting legalizer.".to_string());
        lines.push("number of cells aggregated:  1000".to_string());
        lines.push("max cell displacement:  3.4".to_string());
        lines.push("avg cell displacement:  0.12".to_string());
        lines.push(format!("number of cells moved:  {}", i % 50));
        lines.push("number of large displacements:  0".to_string());
        lines.push(format!(
            "END_FUNC: legalize_placement CPU: 2 s ELAPSE: {} s MEM-PEAK: 950 Mb",
            elapse + 10
        ));
        lines.push("npo-place-opt initial QoR".to_string());
        lines.push(NPO_ROW.to_string());
        lines.push(format!("npo-place-opt optimization Phase {} Iter  1", i % 9 + 1));
        lines.push(NPO_ROW.to_string());
        lines.push("npo-place-opt final QoR".to_string());
        lines.push(NPO_ROW.to_string());
        lines.push("START_CMD: report_timing CPU: 20 s".to_string());
        lines.push("START_CMD: report_timing CPU: 21 s".to_string());
        lines.push("Start Global Route ...".to_string());
        lines.push("Start GR phase 1".to_string());
        lines.push(
            "phase1. Both Dirs: Overflow =   120 Max =    3 GRCs =    45 (0.50%)".to_string(),
        );
        lines.push("Start DR iteration 1: full".to_string());
        lines.push("Information: nothing interesting here".to_string());
        lines.push("Error: something odd".to_string());
    }

    lines.join("\n")
}

fn build_index(store: &LineStore, set: &CollectorSet) -> EventIndex {
    let collectors = set.build(false, None).expect("build collectors");
    EventIndex::build(store, &collectors)
}

fn bench_decode(c: &mut Criterion) {
    c.bench_function("heartbeat/decode_fixed", |b| {
        b.iter(|| decode_fixed(black_box(10), black_box(NPO_ROW)).expect("decode npo"))
    });

    c.bench_function("heartbeat/decode_aps", |b| {
        b.iter(|| decode_aps(black_box(10), black_box(APS_ROW)))
    });
}

fn bench_collect(c: &mut Criterion) {
    let store = LineStore::from_text(&synthetic_log(400));
    let set = CollectorSet {
        cellmap: true,
        flow: true,
        regex: Some("^Error".into()),
        ..CollectorSet::default_bundle()
    };

    c.bench_function("index/build_medium_log", |b| {
        b.iter(|| {
            let index = build_index(black_box(&store), &set);
            black_box(index.len())
        })
    });
}

fn bench_align(c: &mut Criterion) {
    let set = CollectorSet::comparison();
    let left = build_index(&LineStore::from_text(&synthetic_log(40)), &set);
    let right = build_index(&LineStore::from_text(&synthetic_log(36)), &set);

    c.bench_function("align/two_runs", |b| {
        b.iter(|| {
            let pairs = align(black_box(&left), black_box(&right));
            black_box(pairs.len())
        })
    });
}

fn bench_suite(c: &mut Criterion) {
    bench_decode(c);
    bench_collect(c);
    bench_align(c);
}

criterion_group!(benches, bench_suite);
criterion_main!(benches);
