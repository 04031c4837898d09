//! `recap doctor`: credential presence and provider connectivity checks.

use crate::cli::args::DoctorCliArgs;
use crate::config::Config;
use crate::extract::SUPPORTED_MIME_TYPES;
use crate::prompt;
use crate::summarize::{GeminiClient, Summarizer, SummaryError};
use crate::transcript::Transcript;
use anyhow::{bail, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Visible prefix of the API key when reporting it.
const KEY_PREFIX_CHARS: usize = 10;

pub async fn handle_doctor_command(args: DoctorCliArgs) -> Result<()> {
    let config = Config::load()?;

    println!();
    println!("Recap Doctor");
    println!("============");

    let failures = run_checks(&config, args.skip_generation).await;

    println!();
    if failures > 0 {
        bail!("{} check(s) failed", failures);
    }
    println!("All checks passed.");
    Ok(())
}

/// Run every check, printing as it goes. Returns the number of failed checks.
async fn run_checks(config: &Config, skip_generation: bool) -> usize {
    let mut failures = 0;

    println!();
    println!("Credentials:");
    match config.gemini.api_key.as_deref().filter(|key| !key.is_empty()) {
        Some(key) => println!("  Gemini API key:  set ({}...)", key_prefix(key)),
        None => {
            println!("  Gemini API key:  NOT SET");
            failures += 1;
        }
    }
    if config.email.is_configured() {
        println!(
            "  Email account:   set ({} via {}:{})",
            config.email.user.as_deref().unwrap_or_default(),
            config.email.smtp_host,
            config.email.smtp_port
        );
    } else {
        println!("  Email account:   not configured (sending email is disabled)");
    }

    println!();
    println!("Uploads:");
    println!("  Limit:           {} bytes", config.upload.max_file_size);
    for mime in SUPPORTED_MIME_TYPES {
        println!("  Accepts:         {}", mime);
    }

    let Ok(client) = GeminiClient::new(&config.gemini) else {
        println!();
        println!("Skipping provider checks: no Gemini API key.");
        return failures;
    };

    println!();
    println!("Provider ({} / {}):", config.gemini.endpoint, client.model());
    match client.probe(PROBE_TIMEOUT).await {
        Ok(status) if status.is_success() => println!("  Models endpoint: accessible"),
        Ok(status) => println!("  Models endpoint: reachable, limited access (status {})", status),
        Err(e) => {
            println!("  Models endpoint: FAILED");
            print_failure(&e);
            failures += 1;
        }
    }

    if skip_generation {
        println!("  Generation:      skipped");
        return failures;
    }

    let summarizer = Summarizer::new(Arc::new(client), config.gemini.timeout());
    let prompt = prompt::compose(
        &Transcript::new("Alice: Hello everyone. Bob: Hi, let's ship on Friday."),
        "Reply with one short sentence.",
    );

    let start = Instant::now();
    match summarizer.summarize(&prompt).await {
        Ok(text) => {
            println!(
                "  Generation:      OK ({:.2}s, {} characters)",
                start.elapsed().as_secs_f64(),
                text.chars().count()
            );
        }
        Err(e) => {
            println!("  Generation:      FAILED");
            print_failure(&e);
            failures += 1;
        }
    }

    failures
}

fn print_failure(err: &SummaryError) {
    if let Some(message) = err.user_message() {
        println!("    {}", message);
    }
    println!("    Error: {}", err.cause());
}

fn key_prefix(key: &str) -> String {
    key.chars().take(KEY_PREFIX_CHARS).collect()
}
