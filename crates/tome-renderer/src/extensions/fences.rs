//! Custom fences: diagram sources passed through for client-side rendering.

use std::collections::HashMap;

use crate::code_block::{CodeBlockProcessor, ProcessResult};
use crate::options::CustomFence;
use crate::state::escape_html;

/// Renders fences named in `custom_fences` as `<pre class="{class}">`.
///
/// The source is escaped but otherwise untouched, so a script such as
/// Mermaid can pick it up from the page.
pub struct CustomFenceProcessor {
    fences: Vec<CustomFence>,
}

impl CustomFenceProcessor {
    /// Create a processor for the given fences.
    #[must_use]
    pub fn new(fences: Vec<CustomFence>) -> Self {
        Self { fences }
    }
}

impl CodeBlockProcessor for CustomFenceProcessor {
    fn process(
        &mut self,
        language: &str,
        _attrs: &HashMap<String, String>,
        source: &str,
        _index: usize,
    ) -> ProcessResult {
        match self.fences.iter().find(|fence| fence.name == language) {
            Some(fence) => ProcessResult::Inline(format!(
                r#"<pre class="{}"><code>{}</code></pre>"#,
                escape_html(&fence.class),
                escape_html(source)
            )),
            None => ProcessResult::PassThrough,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mermaid() -> CustomFenceProcessor {
        CustomFenceProcessor::new(vec![CustomFence {
            name: "mermaid".to_owned(),
            class: "mermaid".to_owned(),
        }])
    }

    #[test]
    fn test_configured_fence_inlined() {
        let result = mermaid().process("mermaid", &HashMap::new(), "graph TD\nA-->B\n", 0);
        assert_eq!(
            result,
            ProcessResult::Inline(
                "<pre class=\"mermaid\"><code>graph TD\nA--&gt;B\n</code></pre>".to_owned()
            )
        );
    }

    #[test]
    fn test_other_language_passes_through() {
        let result = mermaid().process("python", &HashMap::new(), "print()", 0);
        assert_eq!(result, ProcessResult::PassThrough);
    }
}
