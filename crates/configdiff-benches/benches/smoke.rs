use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use configdiff_benches::available_corpora;
use configdiff_core::{compare, Patch};

fn bench_compare(c: &mut Criterion) {
    let mut group = c.benchmark_group("compare");
    for corpus in available_corpora() {
        let dataset = corpus.load();
        group.throughput(Throughput::Bytes(dataset.byte_len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(corpus.name()), &dataset, |b, dataset| {
            b.iter(|| black_box(compare(dataset.old(), dataset.new_document(), dataset.options())));
        });
    }
    group.finish();
}

fn bench_unsorted_compare(c: &mut Criterion) {
    let mut group = c.benchmark_group("compare-unsorted");
    for corpus in available_corpora() {
        let dataset = corpus.load();
        let options = dataset.options().clone().with_stable_order(false);
        group.bench_function(corpus.name(), |b| {
            b.iter(|| black_box(compare(dataset.old(), dataset.new_document(), &options)));
        });
    }
    group.finish();
}

fn bench_patch(c: &mut Criterion) {
    let mut assemble = c.benchmark_group("patch-assemble");
    for corpus in available_corpora() {
        let changes = corpus.load().compare();
        assemble.throughput(Throughput::Elements(changes.len() as u64));
        assemble.bench_function(corpus.name(), |b| {
            b.iter(|| black_box(Patch::from_changes(&changes)));
        });
    }
    assemble.finish();

    let mut apply = c.benchmark_group("patch-apply");
    for corpus in available_corpora() {
        let dataset = corpus.load();
        let patch = dataset.patch();
        apply.throughput(Throughput::Elements(patch.len() as u64));
        apply.bench_function(corpus.name(), |b| {
            b.iter(|| black_box(dataset.old().apply_patch(&patch).expect("patch applies")));
        });
    }
    apply.finish();
}

fn bench_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("report");
    for corpus in available_corpora() {
        let dataset = corpus.load();
        let changes = dataset.compare();
        group.throughput(Throughput::Elements(changes.len() as u64));
        group.bench_function(corpus.name(), |b| {
            b.iter(|| black_box(dataset.render(&changes)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compare, bench_unsorted_compare, bench_patch, bench_report);
criterion_main!(benches);
