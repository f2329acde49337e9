// src/main.rs

// Modules defined in the crate
mod bitable;
mod config;
mod constants;
mod error;
mod extract;
mod job;
mod model;
mod types;

use crate::bitable::BitableHttpClient;
use crate::config::{CommandLineInput, JobConfig};
use crate::extract::ContentExtractor;
use crate::job::{CancelToken, JobContext, JobEvents, JobStatus, Orchestrator};
use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use std::fs;
use std::sync::Arc;

/// Sets up logging configuration.
fn setup_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let log_file_path = std::env::temp_dir().join("xhs2bitable.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    let stdout_appender = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("stdout")
                .appender("file")
                .build(log_level),
        )?;

    log4rs::init_config(config)?;
    log::info!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

/// Prints progress lines as items complete.
struct ConsoleEvents;

impl JobEvents for ConsoleEvents {
    fn progress(&self, done: usize, total: usize) {
        println!("Progress: {}/{}", done, total);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose)?;

    let config = JobConfig::resolve(cli)?;

    let extractor = ContentExtractor::new(&config.cookie, &config.output_dir)?;
    let mut orchestrator = Orchestrator::new(extractor);
    if let Some(credentials) = config.credentials.clone() {
        let gateway = BitableHttpClient::new(credentials)?;
        orchestrator = orchestrator.with_gateway(Arc::new(gateway));
    }

    // Ctrl-C requests cooperative cancellation; the in-flight item
    // finishes before the job stops.
    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("Cancellation requested, finishing the current item");
                cancel.cancel();
            }
        });
    }

    let ctx = JobContext::new(cancel, Arc::new(ConsoleEvents));
    let outcome = orchestrator.run(config.params, &ctx).await;

    match outcome.status {
        JobStatus::Completed => {
            println!(
                "✓ Done: {} notes extracted, {} users, {} records written",
                outcome.summary.notes_extracted,
                outcome.summary.users_fetched,
                outcome.summary.records_written
            );
            if let Some(reason) = &outcome.summary.failure_reason {
                eprintln!("⚠️  Sync phase did not finish: {}", reason);
            }
        }
        JobStatus::Cancelled => {
            println!(
                "Cancelled after {} notes; extracted results were kept",
                outcome.summary.notes_extracted
            );
        }
        JobStatus::Failed => {
            eprintln!(
                "Job failed: {}",
                outcome
                    .summary
                    .failure_reason
                    .as_deref()
                    .unwrap_or("unknown error")
            );
            std::process::exit(1);
        }
        JobStatus::Idle | JobStatus::Running => unreachable!("run() returns terminal states"),
    }

    Ok(())
}
