use super::ExtractError;
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

/// Extract the text layer of a PDF held in memory.
pub(super) fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    debug!("Processing PDF file ({} bytes)", bytes.len());

    // pdf-extract panics on some malformed inputs instead of returning an error
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(bytes)
    }));

    match outcome {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ExtractError::Failed(e.to_string())),
        Err(payload) => Err(ExtractError::Failed(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "PDF parser aborted".to_string()
    }
}
