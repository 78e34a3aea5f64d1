//! Code fence tracking for line-based preprocessors.
//!
//! Block markers (`!!!`, `???`, `===`) inside fenced code are literal text,
//! so every preprocessor runs its input through a [`FenceTracker`].

/// How a line relates to fenced code.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum FenceLine<'a> {
    /// Opens a fence; carries the trimmed info string (`py title="a.py"`).
    Open(&'a str),
    /// Closes the current fence.
    Close,
    /// Content inside a fence.
    Code,
    /// Ordinary Markdown.
    Text,
}

/// An open fence: marker character and run length.
///
/// A fence closes on a line of the same character at least as long, with
/// nothing but whitespace after it. Indentation is ignored so fences nested
/// in block bodies are still seen.
#[derive(Clone, Copy, Debug)]
struct Fence {
    marker: char,
    len: usize,
}

impl Fence {
    /// Parse an opening fence, returning it with its info string.
    fn open(line: &str) -> Option<(Self, &str)> {
        let line = line.trim_start();
        let marker = line.chars().next().filter(|c| matches!(c, '`' | '~'))?;
        let len = line.chars().take_while(|&c| c == marker).count();
        let info = &line[len..];
        // Backtick info strings cannot contain backticks, else it is inline code.
        if len < 3 || (marker == '`' && info.contains('`')) {
            return None;
        }
        Some((Self { marker, len }, info.trim()))
    }

    fn closed_by(self, line: &str) -> bool {
        let line = line.trim_start();
        let run = line.chars().take_while(|&c| c == self.marker).count();
        run >= self.len && line[run..].trim().is_empty()
    }
}

/// Follows fence state across the lines of one document.
#[derive(Debug, Default)]
pub(crate) struct FenceTracker {
    open: Option<Fence>,
}

impl FenceTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn in_fence(&self) -> bool {
        self.open.is_some()
    }

    /// Classify `line` and advance the state.
    pub(crate) fn update<'a>(&mut self, line: &'a str) -> FenceLine<'a> {
        match self.open {
            Some(fence) if fence.closed_by(line) => {
                self.open = None;
                FenceLine::Close
            }
            Some(_) => FenceLine::Code,
            None => match Fence::open(line) {
                Some((fence, info)) => {
                    self.open = Some(fence);
                    FenceLine::Open(info)
                }
                None => FenceLine::Text,
            },
        }
    }
}
