//! Colored terminal output on stderr.

use console::{Style, Term};
use tome_site::BuildReport;

pub(crate) struct Output {
    term: Term,
    ok: Style,
    warn: Style,
    err: Style,
    label: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            ok: Style::new().green(),
            warn: Style::new().yellow(),
            err: Style::new().red(),
            label: Style::new().cyan().bold(),
        }
    }

    fn line(&self, text: &str) {
        let _ = self.term.write_line(text);
    }

    pub(crate) fn info(&self, msg: &str) {
        self.line(msg);
    }

    pub(crate) fn success(&self, msg: &str) {
        self.line(&self.ok.apply_to(msg).to_string());
    }

    pub(crate) fn error(&self, msg: &str) {
        self.line(&self.err.apply_to(msg).to_string());
    }

    /// `Label: value` with a bold label.
    pub(crate) fn field(&self, label: &str, value: impl std::fmt::Display) {
        self.line(&format!("{} {value}", self.label.apply_to(format!("{label}:"))));
    }

    /// Each failed page, then the `N succeeded, M failed` summary in green
    /// or yellow.
    pub(crate) fn report(&self, report: &BuildReport) {
        for failure in &report.failed {
            self.error(&failure.to_string());
        }
        let style = if report.is_success() { &self.ok } else { &self.warn };
        self.line(&style.apply_to(report.summary()).to_string());
    }
}
