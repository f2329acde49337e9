// src/job/mod.rs
//! Job orchestration: drives one extraction job and, optionally, one
//! synchronization job.
//!
//! A job moves `idle → running → (completed | cancelled | failed)`. Its
//! result is always best-effort: the summary reports what actually
//! landed, and the only job-fatal failures are a missing credential at
//! construction time and an unhandled internal error.

pub mod context;
pub mod snapshot;

pub use context::{CancelToken, JobContext, JobEvents, NullEvents};
pub use snapshot::{load_snapshot, save_snapshot, JobSnapshot};

use crate::bitable::schema::NoteField;
use crate::bitable::{to_record, BatchUploader, BitableGateway, NoteRecord, SchemaSynchronizer};
use crate::constants::NOTE_PACING_SECS;
use crate::error::AppError;
use crate::extract::ContentExtractor;
use crate::model::User;
use crate::types::SortMode;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// What one job extracts.
#[derive(Debug, Clone)]
pub enum JobMode {
    /// One note, by URL or bare ID.
    SingleNote(String),
    /// Keyword search, truncated to the job limit.
    Keyword { keyword: String, sort: SortMode },
    /// A user's recent notes, truncated to the job limit.
    UserTimeline(String),
    /// An explicit URL list.
    UrlBatch(Vec<String>),
}

/// Where the sync phase writes.
#[derive(Debug, Clone)]
pub enum SyncTarget {
    /// Create a new app and provision the standard note table in it.
    CreateApp { app_name: String },
    /// Reuse an existing table, discovering its fields by display name.
    Existing { app_token: String, table_id: String },
}

/// Sync-phase parameters; absent means extraction only.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub target: SyncTarget,
    pub table_name: String,
}

/// Everything one job needs to run.
#[derive(Debug, Clone)]
pub struct JobParams {
    pub mode: JobMode,
    pub limit: usize,
    pub download_images: bool,
    /// Local snapshot path; absent means no persistence.
    pub snapshot_path: Option<PathBuf>,
    pub sync: Option<SyncOptions>,
}

/// The job state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

/// Best-effort counts of what actually happened.
#[derive(Debug, Clone, Default)]
pub struct JobSummary {
    pub notes_extracted: usize,
    pub users_fetched: usize,
    pub records_written: usize,
    /// The job-fatal reason when status is `Failed`; otherwise the
    /// sync-phase failure when that phase aborted (extraction results
    /// are still present).
    pub failure_reason: Option<String>,
}

/// The result of one job.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub status: JobStatus,
    pub snapshot: JobSnapshot,
    pub summary: JobSummary,
}

impl JobOutcome {
    fn failed(reason: String) -> Self {
        Self {
            status: JobStatus::Failed,
            snapshot: JobSnapshot::default(),
            summary: JobSummary {
                failure_reason: Some(reason),
                ..JobSummary::default()
            },
        }
    }
}

/// Drives one extraction job and, optionally, one synchronization job.
pub struct Orchestrator {
    extractor: ContentExtractor,
    gateway: Option<Arc<dyn BitableGateway>>,
}

impl Orchestrator {
    pub fn new(extractor: ContentExtractor) -> Self {
        Self {
            extractor,
            gateway: None,
        }
    }

    /// Attaches the destination gateway used by the sync phase.
    pub fn with_gateway(mut self, gateway: Arc<dyn BitableGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Runs one job to a terminal state. Never panics the host: an
    /// unexpected internal error ends the job in `Failed` with a reason.
    pub async fn run(&self, params: JobParams, ctx: &JobContext) -> JobOutcome {
        log::info!("Job starting");
        match self.run_inner(&params, ctx).await {
            Ok(outcome) => {
                log::info!(
                    "Job {:?}: {} notes, {} records written",
                    outcome.status,
                    outcome.summary.notes_extracted,
                    outcome.summary.records_written
                );
                outcome
            }
            Err(e) => {
                log::error!("Job failed: {}", e);
                JobOutcome::failed(e.to_string())
            }
        }
    }

    async fn run_inner(
        &self,
        params: &JobParams,
        ctx: &JobContext,
    ) -> Result<JobOutcome, AppError> {
        let mut status = JobStatus::Running;

        // Resolve the mode into note references to fetch one by one.
        let targets = self.collect_targets(params).await;
        let total = targets.len();
        log::info!("Extracting {} notes", total);

        let mut snapshot = JobSnapshot::default();
        let mut attachments: HashMap<String, Vec<PathBuf>> = HashMap::new();

        for (i, target) in targets.iter().enumerate() {
            // Cancellation is polled at item boundaries only; the item
            // in flight always finishes first.
            if ctx.cancel.is_cancelled() {
                log::info!("Job cancelled after {} of {} items", i, total);
                status = JobStatus::Cancelled;
                break;
            }
            if i > 0 {
                crate::extract::pace(NOTE_PACING_SECS).await;
            }

            if let Some(note) = self.extractor.fetch_note(target).await {
                self.fetch_author(&note.user_id, &mut snapshot.users).await;

                if params.download_images && !note.image_list.is_empty() {
                    let paths = self.extractor.download_attachments(&note).await;
                    if !paths.is_empty() {
                        attachments.insert(note.note_id.clone(), paths);
                    }
                }

                snapshot.notes.push(note);
            }

            ctx.report_progress(i + 1, total);
        }

        let mut summary = JobSummary {
            notes_extracted: snapshot.notes.len(),
            users_fetched: snapshot.users.len(),
            ..JobSummary::default()
        };

        if let Some(path) = &params.snapshot_path {
            if let Err(e) = save_snapshot(path, &snapshot) {
                log::error!("Could not save snapshot to {}: {}", path.display(), e);
            }
        }

        // The sync phase runs only for jobs that ran to completion; a
        // failure here aborts sync alone, extraction results stand.
        if status == JobStatus::Running {
            if let Some(sync) = &params.sync {
                match self.run_sync(sync, &snapshot, &attachments).await {
                    Ok(written) => summary.records_written = written,
                    Err(e) => {
                        log::error!("Sync phase aborted: {}", e);
                        summary.failure_reason = Some(e.to_string());
                    }
                }
            }
            status = JobStatus::Completed;
        }

        Ok(JobOutcome {
            status,
            snapshot,
            summary,
        })
    }

    /// Resolves the job mode into the ordered list of note references.
    async fn collect_targets(&self, params: &JobParams) -> Vec<String> {
        match &params.mode {
            JobMode::SingleNote(input) => vec![input.clone()],
            JobMode::Keyword { keyword, sort } => self
                .extractor
                .search(keyword, *sort, params.limit)
                .await
                .into_iter()
                .map(|id| id.as_str().to_string())
                .collect(),
            JobMode::UserTimeline(input) => self
                .extractor
                .list_user_note_ids(input, params.limit)
                .await
                .into_iter()
                .map(|id| id.as_str().to_string())
                .collect(),
            JobMode::UrlBatch(urls) => urls.clone(),
        }
    }

    /// Fetches the author once per job; later notes reuse the entry.
    async fn fetch_author(&self, user_id: &str, users: &mut IndexMap<String, User>) {
        if user_id.is_empty() || users.contains_key(user_id) {
            return;
        }
        if let Some(user) = self.extractor.fetch_user(user_id).await {
            users.insert(user_id.to_string(), user);
        }
    }

    /// SchemaSynchronizer → RecordMapper → BatchUploader, in sequence.
    async fn run_sync(
        &self,
        sync: &SyncOptions,
        snapshot: &JobSnapshot,
        attachments: &HashMap<String, Vec<PathBuf>>,
    ) -> Result<usize, AppError> {
        let gateway = self.gateway.clone().ok_or_else(|| {
            AppError::MissingConfiguration(
                "Sync requested but no destination gateway configured".to_string(),
            )
        })?;

        let schema = SchemaSynchronizer::new(gateway.clone());
        let (app_token, table_id, field_map) = match &sync.target {
            SyncTarget::CreateApp { app_name } => {
                let app_token = schema.ensure_app(app_name).await?;
                let (table_id, field_map) = schema
                    .provision_note_table(&app_token, &sync.table_name)
                    .await?;
                (app_token, table_id, field_map)
            }
            SyncTarget::Existing {
                app_token,
                table_id,
            } => {
                let field_map = schema.list_fields(app_token, table_id).await?;
                (app_token.clone(), table_id.clone(), field_map)
            }
        };

        if field_map.is_empty() {
            log::warn!("Destination table shares no fields with the standard set");
        }

        let mut records: Vec<NoteRecord> = snapshot
            .notes
            .iter()
            .map(|note| {
                let paths = attachments
                    .get(&note.note_id)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                to_record(note, snapshot.users.get(&note.user_id), &field_map, paths)
            })
            .collect();

        let uploader = BatchUploader::new(gateway);
        if let Some(attachment_field) = field_map.get(&NoteField::Attachments) {
            uploader
                .resolve_attachments(&app_token, &table_id, attachment_field, &mut records)
                .await;
        }

        let record_ids = uploader.write_records(&app_token, &table_id, records).await;
        Ok(record_ids.len())
    }
}
