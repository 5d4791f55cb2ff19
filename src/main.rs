use anyhow::Result;
use inquire::{InquireError, Select, Text};
use log::{info, warn};
use scriptify::core::config::{Config, LlmConfig};
use scriptify::core::error::ScriptError;
use scriptify::core::state::Session;
use scriptify::services::schema::{GenerationRequest, Script, VideoFormat, VideoStyle};
use scriptify::services::script::{create_script_service, ScriptService};
use std::time::Duration;

const ACTION_ADJUST: &str = "Adjust script";
const ACTION_SAVE: &str = "Save to file";
const ACTION_NEW: &str = "New script";
const ACTION_QUIT: &str = "Quit";

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {:#}", e);
            eprintln!("Please ensure 'config.yml' exists with valid LLM settings.");
            return Err(e);
        }
    };

    let service = create_script_service(&config)?;
    let retry = RetryPolicy::from_config(&config.llm);
    let mut session = Session::new();

    loop {
        if session.script().is_none() {
            let Some(request) = ask_request(&config)? else {
                break;
            };
            generate(&mut session, &service, &request, &retry).await;
            continue;
        }

        let actions = vec![ACTION_ADJUST, ACTION_SAVE, ACTION_NEW, ACTION_QUIT];
        let Some(action) = ask(Select::new("What next?", actions).prompt())? else {
            break;
        };

        match action {
            ACTION_ADJUST => {
                let Some(text) = ask(
                    Text::new("Describe the changes:")
                        .with_help_message("e.g. 'Make the hook funnier', 'Change scene 2 to be about dogs'")
                        .prompt(),
                )?
                else {
                    continue;
                };
                adjust(&mut session, &service, &text, &retry).await;
            }
            ACTION_SAVE => {
                if let Some(script) = session.script() {
                    save(script).await?;
                }
            }
            ACTION_NEW => session.clear(),
            _ => break,
        }
    }

    Ok(())
}

/// Caller-side retry policy; the script operations themselves never retry.
struct RetryPolicy {
    retries: usize,
    delay: Duration,
}

impl RetryPolicy {
    fn from_config(config: &LlmConfig) -> Self {
        Self {
            retries: config.retry_count,
            delay: Duration::from_secs(config.retry_delay_seconds),
        }
    }

    async fn should_retry(&self, attempt: usize, err: &ScriptError) -> bool {
        // credential problems do not fix themselves
        if !err.is_retryable() || err.hint().is_some() || attempt >= self.retries {
            return false;
        }
        warn!(
            "{} (attempt {}/{}), retrying in {}s...",
            err,
            attempt + 1,
            self.retries + 1,
            self.delay.as_secs()
        );
        tokio::time::sleep(self.delay).await;
        true
    }
}

async fn generate(session: &mut Session, service: &ScriptService, request: &GenerationRequest, retry: &RetryPolicy) {
    let mut attempt = 0;
    loop {
        let err = match session.generate(service, request).await {
            Ok(script) => {
                println!("\nScript generated!\n\n{}\n", script.to_plain_text());
                return;
            }
            Err(e) => e,
        };
        if !retry.should_retry(attempt, &err).await {
            eprintln!("There was a problem generating your script: {}", err);
            return;
        }
        attempt += 1;
    }
}

async fn adjust(session: &mut Session, service: &ScriptService, text: &str, retry: &RetryPolicy) {
    let mut attempt = 0;
    loop {
        let err = match session.adjust(service, text).await {
            Ok(script) => {
                println!("\nScript adjusted!\n\n{}\n", script.to_plain_text());
                return;
            }
            Err(e) => e,
        };
        if !retry.should_retry(attempt, &err).await {
            eprintln!("There was a problem adjusting your script: {}", err);
            if session.script().is_some() {
                println!("Your previous script is unchanged.");
            }
            return;
        }
        attempt += 1;
    }
}

fn ask_request(config: &Config) -> Result<Option<GenerationRequest>> {
    let Some(topic) = ask(
        Text::new("Video topic:")
            .with_placeholder("e.g. student budgeting")
            .prompt(),
    )?
    else {
        return Ok(None);
    };

    let format_cursor = VideoFormat::ALL
        .iter()
        .position(|f| *f == config.generation.default_format)
        .unwrap_or(0);
    let Some(format) = ask(
        Select::new("Format:", VideoFormat::ALL.to_vec())
            .with_starting_cursor(format_cursor)
            .prompt(),
    )?
    else {
        return Ok(None);
    };

    let style_cursor = VideoStyle::ALL
        .iter()
        .position(|s| *s == config.generation.default_style)
        .unwrap_or(0);
    let Some(style) = ask(
        Select::new("Style:", VideoStyle::ALL.to_vec())
            .with_starting_cursor(style_cursor)
            .prompt(),
    )?
    else {
        return Ok(None);
    };

    Ok(Some(GenerationRequest::new(topic, format, style)))
}

async fn save(script: &Script) -> Result<()> {
    let Some(path) = ask(Text::new("File name:").with_default("script.txt").prompt())? else {
        return Ok(());
    };
    tokio::fs::write(&path, script.to_plain_text()).await?;
    info!("Saved script to {}", path);
    println!("Saved to {}", path);
    Ok(())
}

/// Maps a cancelled prompt (Esc / Ctrl-C) to `None`.
fn ask<T>(answer: std::result::Result<T, InquireError>) -> Result<Option<T>> {
    match answer {
        Ok(v) => Ok(Some(v)),
        Err(InquireError::OperationCanceled) | Err(InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
