// src/config.rs
use crate::error::AppError;
use crate::job::{JobMode, JobParams, SyncOptions, SyncTarget};
use crate::types::{AppCredentials, SessionCookie, SortMode};
use clap::Parser;
use std::fs;
use std::path::PathBuf;

/// Parsed and validated command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    /// Note URL or ID to extract
    #[arg(long, group = "mode")]
    pub note: Option<String>,

    /// Keyword to search notes for
    #[arg(long, group = "mode")]
    pub keyword: Option<String>,

    /// User URL or ID whose recent notes to extract
    #[arg(long, group = "mode")]
    pub user: Option<String>,

    /// File with note URLs to extract, one per line
    #[arg(long, group = "mode")]
    pub batch_file: Option<PathBuf>,

    /// Search ordering: 0 general, 1 most-liked, 2 newest
    #[arg(long, default_value_t = 0)]
    pub sort: u8,

    /// Maximum notes to extract in search and timeline modes
    #[arg(long, default_value_t = 20)]
    pub limit: usize,

    /// Source-platform session cookie (falls back to XHS_COOKIE)
    #[arg(long)]
    pub cookie: Option<String>,

    /// File to read the session cookie from
    #[arg(long)]
    pub cookie_file: Option<PathBuf>,

    /// Directory for downloaded images
    #[arg(long, default_value = "data/images")]
    pub output_dir: PathBuf,

    /// Download note images (pass `--download-images false` to skip)
    #[arg(long, action = clap::ArgAction::Set, default_value_t = true)]
    pub download_images: bool,

    /// Write the extracted entity set to this JSON file
    #[arg(short = 'o', long)]
    pub output_file: Option<PathBuf>,

    /// Upload extracted notes to a Feishu Bitable
    #[arg(long, default_value_t = false)]
    pub upload: bool,

    /// Feishu app id (falls back to FEISHU_APP_ID)
    #[arg(long)]
    pub app_id: Option<String>,

    /// Feishu app secret (falls back to FEISHU_APP_SECRET)
    #[arg(long)]
    pub app_secret: Option<String>,

    /// Name for the Bitable app created when no existing table is given
    #[arg(long, default_value = "Xiaohongshu Notes")]
    pub app_name: String,

    /// Existing Bitable app token (requires --table-id)
    #[arg(long, requires = "table_id")]
    pub app_token: Option<String>,

    /// Existing table id (requires --app-token)
    #[arg(long, requires = "app_token")]
    pub table_id: Option<String>,

    /// Table name used when provisioning a new table
    #[arg(long, default_value = "Notes")]
    pub table_name: String,

    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

/// Resolved job configuration, validated and ready to run.
#[derive(Debug)]
pub struct JobConfig {
    pub cookie: SessionCookie,
    pub output_dir: PathBuf,
    pub params: JobParams,
    /// Present only when the sync phase is requested.
    pub credentials: Option<AppCredentials>,
    pub verbose: bool,
}

impl JobConfig {
    /// Resolves a complete job configuration from CLI input and environment.
    pub fn resolve(cli: CommandLineInput) -> Result<Self, AppError> {
        let cookie = resolve_cookie(&cli)?;
        let mode = resolve_mode(&cli)?;

        let credentials = if cli.upload {
            Some(resolve_credentials(&cli)?)
        } else {
            None
        };

        let sync = if cli.upload {
            let target = match (cli.app_token, cli.table_id) {
                (Some(app_token), Some(table_id)) => SyncTarget::Existing {
                    app_token,
                    table_id,
                },
                _ => SyncTarget::CreateApp {
                    app_name: cli.app_name,
                },
            };
            Some(SyncOptions {
                target,
                table_name: cli.table_name,
            })
        } else {
            None
        };

        Ok(Self {
            cookie,
            output_dir: cli.output_dir,
            params: JobParams {
                mode,
                limit: cli.limit,
                download_images: cli.download_images,
                snapshot_path: cli.output_file,
                sync,
            },
            credentials,
            verbose: cli.verbose,
        })
    }
}

fn resolve_cookie(cli: &CommandLineInput) -> Result<SessionCookie, AppError> {
    if let Some(cookie) = &cli.cookie {
        return Ok(SessionCookie::new(cookie.clone()));
    }
    if let Some(path) = &cli.cookie_file {
        let contents = fs::read_to_string(path)?;
        return Ok(SessionCookie::new(contents.trim().to_string()));
    }
    if let Ok(cookie) = std::env::var("XHS_COOKIE") {
        return Ok(SessionCookie::new(cookie));
    }
    Err(AppError::MissingConfiguration(
        "A session cookie is required (--cookie, --cookie-file, or XHS_COOKIE)".to_string(),
    ))
}

fn resolve_mode(cli: &CommandLineInput) -> Result<JobMode, AppError> {
    if let Some(note) = &cli.note {
        return Ok(JobMode::SingleNote(note.clone()));
    }
    if let Some(keyword) = &cli.keyword {
        return Ok(JobMode::Keyword {
            keyword: keyword.clone(),
            sort: resolve_sort(cli.sort)?,
        });
    }
    if let Some(user) = &cli.user {
        return Ok(JobMode::UserTimeline(user.clone()));
    }
    if let Some(path) = &cli.batch_file {
        let urls: Vec<String> = fs::read_to_string(path)?
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        if urls.is_empty() {
            return Err(AppError::InvalidInput(format!(
                "Batch file {} contains no URLs",
                path.display()
            )));
        }
        return Ok(JobMode::UrlBatch(urls));
    }
    Err(AppError::MissingConfiguration(
        "One of --note, --keyword, --user, or --batch-file is required".to_string(),
    ))
}

fn resolve_sort(sort: u8) -> Result<SortMode, AppError> {
    match sort {
        0 => Ok(SortMode::General),
        1 => Ok(SortMode::MostLiked),
        2 => Ok(SortMode::Newest),
        other => Err(AppError::InvalidInput(format!(
            "Unknown sort mode {} (expected 0, 1 or 2)",
            other
        ))),
    }
}

fn resolve_credentials(cli: &CommandLineInput) -> Result<AppCredentials, AppError> {
    let app_id = cli
        .app_id
        .clone()
        .or_else(|| std::env::var("FEISHU_APP_ID").ok())
        .ok_or_else(|| {
            AppError::MissingConfiguration(
                "--upload requires an app id (--app-id or FEISHU_APP_ID)".to_string(),
            )
        })?;
    let app_secret = cli
        .app_secret
        .clone()
        .or_else(|| std::env::var("FEISHU_APP_SECRET").ok())
        .ok_or_else(|| {
            AppError::MissingConfiguration(
                "--upload requires an app secret (--app-secret or FEISHU_APP_SECRET)".to_string(),
            )
        })?;
    Ok(AppCredentials { app_id, app_secret })
}
