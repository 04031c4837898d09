pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod email;
pub mod extract;
pub mod global;
pub mod prompt;
pub mod summarize;
pub mod transcript;

/// Render an error and its sources as one line, outermost first.
///
/// Sources whose text is already part of the rendered line are skipped, since
/// reqwest, hyper and lettre print their sources in their own `Display`.
pub(crate) fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        let text = inner.to_string();
        if !out.contains(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        source = inner.source();
    }
    out
}
