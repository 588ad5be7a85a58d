use criterion::{black_box, criterion_group, criterion_main, Criterion};

use lfg::Grammar;

const GRAMMAR_SRC: &str = include_str!("../grammars/agreement.lfg");
const ADJUNCTS_SRC: &str = include_str!("../grammars/adjuncts.lfg");

fn parse(g: &Grammar, input: &[&str]) -> usize {
  g.parse(input).len()
}

fn criterion_benchmark(c: &mut Criterion) {
  let agreement = GRAMMAR_SRC.parse::<Grammar>().unwrap();
  let adjuncts = ADJUNCTS_SRC.parse::<Grammar>().unwrap();

  let simple_input = "john sleeps".split(' ').collect::<Vec<_>>();
  let transitive_input = "john kisses mary".split(' ').collect::<Vec<_>>();
  let adjunct_input = "mary sleeps quickly quietly quickly"
    .split(' ')
    .collect::<Vec<_>>();

  c.bench_function("parse intransitive", |b| {
    b.iter(|| parse(black_box(&agreement), black_box(&simple_input)))
  });

  c.bench_function("parse transitive", |b| {
    b.iter(|| parse(black_box(&agreement), black_box(&transitive_input)))
  });

  c.bench_function("parse stacked adjuncts", |b| {
    b.iter(|| parse(black_box(&adjuncts), black_box(&adjunct_input)))
  });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
