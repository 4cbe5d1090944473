use criterion::{Criterion, black_box, criterion_group, criterion_main};

use wayline::{Advance, Coordinator, FlowPath, FlowStep, Logger, NullSink, Screen, query};

struct Blank;

impl Screen for Blank {}

fn flow_path(len: usize) -> FlowPath {
    let steps = (0..len)
        .map(|i| FlowStep::push(format!("step-{i}"), || Some(Box::new(Blank) as Box<dyn Screen>)))
        .collect();
    FlowPath::new(steps).expect("unique step ids")
}

fn build_coordinator(len: usize) -> Coordinator {
    let mut coordinator =
        Coordinator::new(Some("bench".into()), flow_path(len), None).expect("coordinator");
    coordinator.config_mut().logger = Some(Logger::new(NullSink));
    coordinator
}

fn flow_traversal(c: &mut Criterion) {
    c.bench_function("flow_traversal_12_steps", |b| {
        b.iter(|| {
            let mut coordinator = build_coordinator(12);
            loop {
                let outcome = coordinator
                    .advance(Some(black_box("user=a&count=3".into())), false)
                    .expect("advance");
                if matches!(outcome, Advance::Completed) {
                    break;
                }
            }
        });
    });
}

fn attach_collapse_cycle(c: &mut Criterion) {
    c.bench_function("attach_collapse_cycle", |b| {
        b.iter(|| {
            let mut coordinator = build_coordinator(2);
            coordinator.advance(None, false).expect("advance");
            for _ in 0..8 {
                coordinator
                    .attach(flow_path_suffix())
                    .expect("attach");
                coordinator.advance(None, false).expect("enter overlay");
                coordinator.advance(None, false).expect("walk overlay");
                coordinator.advance(None, false).expect("collapse");
            }
        });
    });
}

fn flow_path_suffix() -> FlowPath {
    let steps = vec![
        FlowStep::push("extra-a", || Some(Box::new(Blank) as Box<dyn Screen>)),
        FlowStep::push("extra-b", || Some(Box::new(Blank) as Box<dyn Screen>)),
    ];
    FlowPath::new(steps).expect("unique step ids")
}

fn payload_codec(c: &mut Criterion) {
    let payload = "user=ada&accepted=true&count=42&ratio=1.5&note=x%20y";
    c.bench_function("query_decode", |b| {
        b.iter(|| query::decode(black_box(payload)));
    });
    c.bench_function("payloads_differ", |b| {
        b.iter(|| {
            query::payloads_differ(
                black_box(Some(payload)),
                black_box(Some("count=42&user=ada&accepted=true&ratio=1.5&note=x y")),
            )
        });
    });
}

criterion_group!(benches, flow_traversal, attach_collapse_cycle, payload_codec);
criterion_main!(benches);
