//! Throughput benchmarks for the decode → parse → page pipeline.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use emberterm_core::{Attr, History, Page, Parser, TermChar, Utf8Decoder};

/// A representative output mix: text, SGR runs, cursor motion, erases.
fn sample_stream() -> Vec<u8> {
    let mut out = Vec::new();
    for i in 0..200 {
        out.extend_from_slice(format!("\x1b[{};1H", (i % 24) + 1).as_bytes());
        out.extend_from_slice(b"\x1b[1;38;5;141m");
        out.extend_from_slice("fn main() { println!(\"\u{3053}\u{3093}\u{306b}\u{3061}\u{306f}\"); }".as_bytes());
        out.extend_from_slice(b"\x1b[m\x1b[K\r\n");
    }
    out
}

fn bench_parser(c: &mut Criterion) {
    let stream = sample_stream();
    let mut group = c.benchmark_group("parser");
    group.throughput(Throughput::Bytes(stream.len() as u64));

    group.bench_function("feed_stream", |b| {
        b.iter(|| {
            let mut decoder = Utf8Decoder::new();
            let mut parser = Parser::new(true);
            let mut count = 0usize;
            for &byte in &stream {
                for &cp in decoder.feed(byte) {
                    if parser.feed(cp).is_some() {
                        count += 1;
                    }
                }
            }
            black_box(count)
        });
    });
    group.finish();
}

fn bench_scroll(c: &mut Criterion) {
    c.bench_function("page_scroll_with_history", |b| {
        b.iter(|| {
            let mut page = Page::new(80, 24);
            let mut history = History::new(1000);
            let attr = Attr::default();
            for i in 0..500u32 {
                page.write(0, 23, TermChar::from_base(u32::from('a') + (i % 26)), 1, attr, false);
                page.scroll_up(1, attr, Some(&mut history));
            }
            black_box(page.age())
        });
    });
}

criterion_group!(benches, bench_parser, bench_scroll);
criterion_main!(benches);
