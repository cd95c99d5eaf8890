use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ratemail::Message;

fn message(recipients: usize) -> Message {
    (0..recipients)
        .fold(
            Message::builder().from("Alerts <alerts@example.com>".parse().unwrap()),
            |builder, i| builder.to(format!("ops{i}@example.com").parse().unwrap()),
        )
        .subject("Disk almost full on db-1")
        .body("<p>/var is at <b>97%</b></p>".repeat(20))
        .unwrap()
}

fn criterion_benchmark(c: &mut Criterion) {
    let single = message(1);
    c.bench_function("format single recipient", |b| {
        b.iter(|| black_box(&single).formatted())
    });

    let many = message(10);
    c.bench_function("format ten recipients", |b| {
        b.iter(|| black_box(&many).formatted())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
