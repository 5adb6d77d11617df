use criterion::{black_box, criterion_group, criterion_main, Criterion};

const SOURCE: &str = "
class Main {
    static int total;

    function void main() {
        var int i;
        let i = 0;
        while (i < 100) {
            let total = total + (i * i);
            let i = i + 1;
        }
        do Output.printInt(total);
        return;
    }
}
";

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("compile Main", |b| {
        b.iter(|| jackc::compile(black_box(SOURCE)).unwrap())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
