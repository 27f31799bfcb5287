use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hydrate::analyzer::parse_expression;
use hydrate::{Hydrator, InMemoryTemplateSource, Value};

const TEMPLATE: &str = include_str!("../tests/fixtures/web_app_template.yaml");
const INSTANCE: &str = include_str!("../tests/fixtures/web_app_instance.yaml");

fn load(text: &str) -> Value {
    let document: serde_json::Value = serde_yaml::from_str(text).unwrap();
    Value::from(document)
}

fn bench_parse_expression(c: &mut Criterion) {
    c.bench_function("parse expression", |b| {
        b.iter(|| parse_expression(black_box("default(.spec.tag, 'latest') + '-' + lower(.metadata.name)")))
    });
    c.bench_function("parse reference", |b| {
        b.iter(|| parse_expression(black_box("resource(v1, Service, .metadata.name + '-svc').spec.ports[0].port")))
    });
}

fn bench_hydrate(c: &mut Criterion) {
    let hydrator = Hydrator::new(InMemoryTemplateSource::new());
    let template = load(TEMPLATE);
    let instance = load(INSTANCE);
    c.bench_function("hydrate web app", |b| {
        b.iter(|| hydrator.hydrate_with_template(black_box(&template), black_box(&instance)))
    });
}

criterion_group!(benches, bench_parse_expression, bench_hydrate);
criterion_main!(benches);
