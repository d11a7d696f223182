use super::InitializationError;
use ariadne::{Color, Label, Report, ReportKind, Source};
use std::path::Path;

const ARIADNE_MSG: &str = "Ariadne produces valid utf-8 strings";
const ARIADNE_WRITE_MSG: &str = "Write into buffer should not fail.";

pub trait InitializationErrorFormatter {
    fn format_error(&self, error: &InitializationError) -> String;
}

/// `[line N] message`, one line per error.
pub struct BasicFormatter;

impl InitializationErrorFormatter for BasicFormatter {
    fn format_error(&self, error: &InitializationError) -> String {
        error.to_string()
    }
}

/// Renders the error against its source with a labelled span.
pub struct PrettyFormatter<'src> {
    text: &'src str,
    path: &'src Path,
}

impl<'src> PrettyFormatter<'src> {
    pub fn new(text: &'src str, path: &'src Path) -> Self {
        Self { text, path }
    }
}

impl<'src> InitializationErrorFormatter for PrettyFormatter<'src> {
    fn format_error(&self, error: &InitializationError) -> String {
        let path = &self.path.to_string_lossy();
        let mut output = std::io::Cursor::new(Vec::new());
        // Zero width spans at the end of input still need a visible caret.
        let span = if error.span.is_empty() {
            error.span.start..error.span.start.saturating_add(1)
        } else {
            error.span.clone()
        };
        let (title, detail) = error
            .message
            .split_once(": ")
            .unwrap_or(("SyntaxError", error.message.as_str()));

        Report::build(ReportKind::Error, (path, span.clone()))
            .with_code(error.code)
            .with_message(title)
            .with_label(
                Label::new((path, span))
                    .with_message(detail)
                    .with_color(Color::BrightRed),
            )
            .finish()
            .write((path, Source::from(self.text)), &mut output)
            .expect(ARIADNE_WRITE_MSG);
        String::from_utf8(output.into_inner()).expect(ARIADNE_MSG)
    }
}
