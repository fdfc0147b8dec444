use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mptest::generate::generate;
use mptest::partition::Partition;
use mptest::reduce::{wrapping_total, ThreadedReducer};

pub fn reduction_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("reduction");
    group.sample_size(20);

    let values_per_process = 1 << 22;
    let dataset = generate(values_per_process);

    group.bench_function("Serial sum of 2^22 values", |b| {
        b.iter(|| black_box(wrapping_total(&dataset.values)))
    });

    for threads in [1, 2, 4, 8] {
        let partition = Partition::new(threads, values_per_process / threads).unwrap();
        let reducer = ThreadedReducer::new(threads).unwrap();
        group.bench_function(
            format!("Sum of 2^22 values on {threads} threads"),
            |b| b.iter(|| black_box(reducer.sum(&partition, &dataset.values).unwrap())),
        );
    }
    group.finish();
}

criterion_group!(benches, reduction_benchmark);
criterion_main!(benches);
