//! Benchmarks for the Markdown extension pipeline.

#![allow(clippy::format_push_string)] // Benchmark setup code, performance not critical

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use tome_renderer::{LinkContext, MarkdownOptions, MarkdownPipeline};

/// Generate a page exercising most extensions.
fn generate_markdown(sections: usize) -> String {
    let mut md = String::from("# Document Title\n\n");
    for i in 0..sections {
        md.push_str(&format!("## Section {i}\n\n"));
        md.push_str("Some **bold**, *italic* and `#!php echo` text :rocket:.[^1]\n\n");
        md.push_str("!!! note \"Remember\"\n    Admonition body with [a link](other.md).\n\n");
        md.push_str("=== \"PHP\"\n    ```php hl_lines=\"1\"\n    echo 1;\n    ```\n\n");
        md.push_str("=== \"Python\"\n    ```py\n    print(1)\n    ```\n\n");
        md.push_str("| A | B |\n|---|---|\n| 1 | 2 |\n\n- [x] done\n- [ ] todo\n\n");
    }
    md.push_str("[^1]: Footnote.\n");
    md
}

fn bench_render_plain(c: &mut Criterion) {
    let pipeline = MarkdownPipeline::new(MarkdownOptions::default());
    c.bench_function("render_plain_markdown", |b| {
        b.iter(|| pipeline.render("# Hello\n\nSimple content.", None));
    });
}

fn bench_render_by_size(c: &mut Criterion) {
    let pipeline = MarkdownPipeline::new(MarkdownOptions::all());
    let context = LinkContext::new("guide/page.md", true);
    let mut group = c.benchmark_group("render_all_extensions");

    for sections in [5, 20, 50] {
        let markdown = generate_markdown(sections);
        group.throughput(Throughput::Bytes(markdown.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("sections", sections),
            &markdown,
            |b, md| b.iter(|| pipeline.render(md, Some(&context))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_render_plain, bench_render_by_size);
criterion_main!(benches);
