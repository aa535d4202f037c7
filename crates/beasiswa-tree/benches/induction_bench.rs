//! Criterion benchmarks for beasiswa-tree: induction and batch evaluation.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use beasiswa_tree::{Attribute, DecisionTreeConfig, Features, Label, Record, evaluate};

fn make_applicants(n_samples: usize, seed: u64) -> Vec<Record> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let brackets = ["rendah", "sedang", "tinggi"];
    (0..n_samples)
        .map(|_| {
            let ipk = 2.0 + rng.r#gen::<f64>() * 2.0;
            let penghasilan = brackets[rng.gen_range(0..brackets.len())];
            let tanggungan = rng.gen_range(0..6u32) as f64;
            let organisasi = if rng.gen_bool(0.4) { "aktif" } else { "pasif" };
            let accept = ipk >= 3.3 && (penghasilan != "tinggi" || tanggungan >= 4.0);
            Record::new(
                Features::new()
                    .with("ipk", ipk)
                    .with("penghasilan", penghasilan)
                    .with("tanggungan", tanggungan)
                    .with("organisasi", organisasi),
                if accept { Label::Accept } else { Label::Reject },
            )
        })
        .collect()
}

fn attributes() -> Vec<Attribute> {
    vec![
        Attribute::continuous("ipk"),
        Attribute::categorical("penghasilan"),
        Attribute::continuous("tanggungan"),
        Attribute::categorical("organisasi"),
    ]
}

fn bench_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit");
    let config = DecisionTreeConfig::new(attributes());
    for n in [100usize, 1_000, 10_000] {
        let data = make_applicants(n, 42);
        group.bench_with_input(BenchmarkId::from_parameter(n), &data, |b, data| {
            b.iter(|| config.fit(data).unwrap());
        });
    }
    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let train = make_applicants(1_000, 42);
    let test = make_applicants(10_000, 7);
    let tree = DecisionTreeConfig::new(attributes())
        .fit(&train)
        .unwrap()
        .into_parts()
        .0;

    c.bench_function("evaluate_10000", |b| {
        b.iter(|| evaluate(&tree, &test));
    });
}

criterion_group!(benches, bench_fit, bench_evaluate);
criterion_main!(benches);
