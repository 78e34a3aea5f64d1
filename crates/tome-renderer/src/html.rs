//! HTML backend for markdown rendering.

use std::borrow::Cow;
use std::fmt::Write;

use crate::backend::{CodeBlock, LinkContext, RenderBackend};
use crate::state::escape_html;
use crate::util::{is_markdown, page_url, relative_path, resolve_relative};

/// HTML render backend.
///
/// Produces semantic HTML5 with:
/// - `<pre><code>` for code blocks
/// - `<blockquote>` for blockquotes
/// - `<img>` for images
/// - relative links to `.md` sources rewritten to the published page URL
pub struct HtmlBackend;

impl RenderBackend for HtmlBackend {
    fn code_block(block: &CodeBlock<'_>, out: &mut String) {
        if let Some(lang) = block.lang {
            write!(
                out,
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                escape_html(lang),
                escape_html(block.content)
            )
            .unwrap();
        } else {
            write!(out, "<pre><code>{}</code></pre>", escape_html(block.content)).unwrap();
        }
    }

    fn blockquote_start(out: &mut String) {
        out.push_str("<blockquote>");
    }

    fn blockquote_end(out: &mut String) {
        out.push_str("</blockquote>");
    }

    fn image(src: &str, alt: &str, title: &str, out: &mut String) {
        let title_attr = if title.is_empty() {
            String::new()
        } else {
            format!(r#" title="{}""#, escape_html(title))
        };
        write!(
            out,
            r#"<img src="{}"{title_attr} alt="{}">"#,
            escape_html(src),
            escape_html(alt)
        )
        .unwrap();
    }

    fn transform_link<'a>(url: &'a str, context: Option<&LinkContext>) -> Cow<'a, str> {
        match context.and_then(|ctx| resolve_link(url, ctx)) {
            Some(resolved) => Cow::Owned(resolved),
            None => Cow::Borrowed(url),
        }
    }
}

/// Rewrite a relative link from the source tree to the published tree.
///
/// - `arrays.md` from `php/index.md` → `arrays/`
/// - `../index.md#setup` from `php/arrays.md` → `../../#setup`
/// - `img/a.png` from `php/arrays.md` → `../img/a.png`
///
/// External links, fragment-only links, absolute paths and links escaping the
/// content root are left alone (`None`).
fn resolve_link(url: &str, ctx: &LinkContext) -> Option<String> {
    if url.is_empty()
        || url.contains("://")
        || url.starts_with("//")
        || url.starts_with("mailto:")
        || url.starts_with("tel:")
        || url.starts_with('#')
        || url.starts_with('/')
    {
        return None;
    }

    let (path, fragment) = match url.find(['#', '?']) {
        Some(pos) => url.split_at(pos),
        None => (url, ""),
    };
    if path.is_empty() {
        return None;
    }

    let target = resolve_relative(&ctx.source, path)?;
    let target_url = if is_markdown(&target) {
        page_url(&target, ctx.directory_urls)
    } else {
        target
    };
    let from_url = page_url(&ctx.source, ctx.directory_urls);

    Some(format!("{}{fragment}", relative_path(&from_url, &target_url)))
}
