use criterion::{black_box, criterion_group, criterion_main, Criterion};
use websketch_capture::dom::memory::{MemoryDocument, MemoryElement};
use websketch_capture::{capture, Limits, Viewport};

fn wide_tree(rows: usize, cells: usize) -> MemoryElement {
    let mut body = MemoryElement::new("BODY");
    for r in 0..rows {
        let mut row = MemoryElement::new("DIV").with_class("row striped");
        for c in 0..cells {
            row.add_child(
                MemoryElement::new("SPAN")
                    .with_id(format!("cell-{}-{}", r, c))
                    .with_text("lorem ipsum dolor sit amet")
                    .with_bounds(c as f64 * 40.0, r as f64 * 20.0, 40.0, 20.0),
            );
        }
        body.add_child(row);
    }
    MemoryElement::new("HTML").with_child(body)
}

fn bench_wide_capture(c: &mut Criterion) {
    let document = MemoryDocument::new(wide_tree(200, 40)).with_url("https://bench.local/");
    let limits = Limits::default();

    c.bench_function("capture_wide_8k", |b| {
        b.iter(|| {
            let snapshot = capture(black_box(&document), &limits).unwrap();
            black_box(snapshot.node_count());
        })
    });

    // Hits the node limit part-way through
    let tight = Limits {
        max_nodes: 1_000,
        ..Default::default()
    };
    c.bench_function("capture_wide_node_limited", |b| {
        b.iter(|| {
            let snapshot = capture(black_box(&document), &tight).unwrap();
            black_box(snapshot.warnings);
        })
    });
}

fn bench_deep_capture(c: &mut Criterion) {
    let document = MemoryDocument::new(MemoryElement::chain("DIV", 2_000));
    let limits = Limits::default();

    c.bench_function("capture_deep_depth_limited", |b| {
        b.iter(|| {
            let snapshot = capture(black_box(&document), &limits).unwrap();
            black_box(snapshot.node_count());
        })
    });
}

fn bench_html_capture(c: &mut Criterion) {
    let mut html = String::from("<html><head><title>Bench</title></head><body>");
    for i in 0..500 {
        html.push_str(&format!(
            "<div class=\"card\" id=\"c{}\"><h2>Card {}</h2><p>Hello <b>RF</b> world</p></div>",
            i, i
        ));
    }
    html.push_str("</body></html>");

    c.bench_function("capture_html_500_cards", |b| {
        b.iter(|| {
            let snapshot = websketch_capture::capture_html(
                black_box(&html),
                "https://bench.local/",
                Viewport::default(),
                &Limits::default(),
            )
            .unwrap();
            black_box(snapshot.node_count());
        })
    });
}

criterion_group!(benches, bench_wide_capture, bench_deep_capture, bench_html_capture);
criterion_main!(benches);
