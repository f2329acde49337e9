mod common;

use common::{note_page, search_page, user_page, FakeGateway, FakePageFetcher};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::sync::Mutex;
use xhs2bitable::{
    CancelToken, ContentExtractor, JobContext, JobEvents, JobMode, JobParams, JobStatus,
    Orchestrator, SortMode, SyncOptions, SyncTarget,
};

/// Records every progress report and cancels once `done` reaches the
/// threshold, like a host pressing the stop button mid-job.
struct CancelAt {
    cancel: CancelToken,
    threshold: usize,
    reports: Mutex<Vec<(usize, usize)>>,
}

impl JobEvents for CancelAt {
    fn progress(&self, done: usize, total: usize) {
        self.reports.lock().unwrap().push((done, total));
        if done >= self.threshold {
            self.cancel.cancel();
        }
    }
}

fn keyword_params(limit: usize) -> JobParams {
    JobParams {
        mode: JobMode::Keyword {
            keyword: "food".to_string(),
            sort: SortMode::General,
        },
        limit,
        download_images: false,
        snapshot_path: None,
        sync: None,
    }
}

/// A fetcher serving a 20-result search and a page for every note.
fn twenty_note_fetcher() -> FakePageFetcher {
    let ids: Vec<String> = (1..=20).map(|i| format!("note{:02}", i)).collect();
    let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();

    let mut fetcher = FakePageFetcher::new().with_page("/search_result", search_page(&id_refs));
    for id in &ids {
        fetcher = fetcher.with_page(&format!("/explore/{}", id), note_page(id, id, ""));
    }
    fetcher
}

#[tokio::test(start_paused = true)]
async fn cancellation_finishes_the_current_item_and_stops() {
    let fetcher = Arc::new(twenty_note_fetcher());
    let orchestrator = Orchestrator::new(ContentExtractor::with_fetcher(
        fetcher.clone(),
        "target/test-images",
    ));

    let cancel = CancelToken::new();
    let events = Arc::new(CancelAt {
        cancel: cancel.clone(),
        threshold: 5,
        reports: Mutex::new(Vec::new()),
    });
    let ctx = JobContext::new(cancel, events.clone());

    let outcome = orchestrator.run(keyword_params(20), &ctx).await;

    assert_eq!(outcome.status, JobStatus::Cancelled);
    assert_eq!(outcome.snapshot.notes.len(), 5);
    assert_eq!(outcome.summary.notes_extracted, 5);
    // The fifth item completed, the sixth was never started.
    assert_eq!(fetcher.fetch_count_containing("/explore/"), 5);
    assert_eq!(events.reports.lock().unwrap().last(), Some(&(5, 20)));
}

#[tokio::test(start_paused = true)]
async fn a_keyword_job_extracts_every_match_in_order() {
    let fetcher = Arc::new(twenty_note_fetcher());
    let orchestrator = Orchestrator::new(ContentExtractor::with_fetcher(
        fetcher,
        "target/test-images",
    ));

    let outcome = orchestrator
        .run(keyword_params(20), &JobContext::detached())
        .await;

    assert_eq!(outcome.status, JobStatus::Completed);
    assert_eq!(outcome.snapshot.notes.len(), 20);
    assert_eq!(outcome.snapshot.notes[0].note_id, "note01");
    assert_eq!(outcome.snapshot.notes[19].note_id, "note20");
}

#[tokio::test(start_paused = true)]
async fn a_shared_author_is_fetched_once_per_job() {
    let fetcher = Arc::new(
        FakePageFetcher::new()
            .with_page("/search_result", search_page(&["na", "nb"]))
            .with_page("/explore/na", note_page("na", "first", "u1"))
            .with_page("/explore/nb", note_page("nb", "second", "u1"))
            .with_page("/user/profile/u1", user_page("amy", 412)),
    );
    let orchestrator = Orchestrator::new(ContentExtractor::with_fetcher(
        fetcher.clone(),
        "target/test-images",
    ));

    let outcome = orchestrator
        .run(keyword_params(10), &JobContext::detached())
        .await;

    assert_eq!(outcome.snapshot.notes.len(), 2);
    assert_eq!(outcome.summary.users_fetched, 1);
    assert_eq!(fetcher.fetch_count_containing("/user/profile/u1"), 1);
    assert_eq!(outcome.snapshot.users["u1"].fans, 412);
}

#[tokio::test(start_paused = true)]
async fn a_failing_note_is_skipped_and_the_job_still_completes() {
    let fetcher = Arc::new(
        FakePageFetcher::new()
            .with_page("/search_result", search_page(&["na", "nb", "nc"]))
            .with_page("/explore/na", note_page("na", "first", ""))
            .with_page("/explore/nc", note_page("nc", "third", "")),
    );
    let orchestrator = Orchestrator::new(ContentExtractor::with_fetcher(
        fetcher,
        "target/test-images",
    ));

    let outcome = orchestrator
        .run(keyword_params(10), &JobContext::detached())
        .await;

    assert_eq!(outcome.status, JobStatus::Completed);
    let ids: Vec<&str> = outcome
        .snapshot
        .notes
        .iter()
        .map(|n| n.note_id.as_str())
        .collect();
    assert_eq!(ids, vec!["na", "nc"]);
}

#[tokio::test(start_paused = true)]
async fn the_sync_phase_provisions_and_writes_records() {
    let fetcher = Arc::new(twenty_note_fetcher());
    let gateway = Arc::new(FakeGateway::new());
    let orchestrator = Orchestrator::new(ContentExtractor::with_fetcher(
        fetcher,
        "target/test-images",
    ))
    .with_gateway(gateway.clone());

    let mut params = keyword_params(20);
    params.sync = Some(SyncOptions {
        target: SyncTarget::CreateApp {
            app_name: "Xiaohongshu Notes".to_string(),
        },
        table_name: "Notes".to_string(),
    });

    let outcome = orchestrator.run(params, &JobContext::detached()).await;

    assert_eq!(outcome.status, JobStatus::Completed);
    assert_eq!(outcome.summary.records_written, 20);
    assert_eq!(*gateway.chunks_seen.lock().unwrap(), vec![10, 10]);
}

#[tokio::test(start_paused = true)]
async fn a_failed_sync_keeps_the_extraction_results() {
    let fetcher = Arc::new(
        FakePageFetcher::new()
            .with_page("/search_result", search_page(&["na"]))
            .with_page("/explore/na", note_page("na", "first", "")),
    );
    // No gateway attached, so the sync phase aborts immediately.
    let orchestrator = Orchestrator::new(ContentExtractor::with_fetcher(
        fetcher,
        "target/test-images",
    ));

    let mut params = keyword_params(10);
    params.sync = Some(SyncOptions {
        target: SyncTarget::Existing {
            app_token: "app1".to_string(),
            table_id: "tbl1".to_string(),
        },
        table_name: "Notes".to_string(),
    });

    let outcome = orchestrator.run(params, &JobContext::detached()).await;

    assert_eq!(outcome.status, JobStatus::Completed);
    assert_eq!(outcome.snapshot.notes.len(), 1);
    assert_eq!(outcome.summary.records_written, 0);
    assert!(outcome.summary.failure_reason.is_some());
}

#[tokio::test(start_paused = true)]
async fn an_auth_failure_aborts_sync_but_keeps_the_extraction_results() {
    let fetcher = Arc::new(
        FakePageFetcher::new()
            .with_page("/search_result", search_page(&["na"]))
            .with_page("/explore/na", note_page("na", "first", "")),
    );
    let gateway = Arc::new(FakeGateway::new().rejecting_credentials());
    let orchestrator = Orchestrator::new(ContentExtractor::with_fetcher(
        fetcher,
        "target/test-images",
    ))
    .with_gateway(gateway.clone());

    let mut params = keyword_params(10);
    params.sync = Some(SyncOptions {
        target: SyncTarget::CreateApp {
            app_name: "Xiaohongshu Notes".to_string(),
        },
        table_name: "Notes".to_string(),
    });

    let outcome = orchestrator.run(params, &JobContext::detached()).await;

    assert_eq!(outcome.status, JobStatus::Completed);
    assert_eq!(outcome.snapshot.notes.len(), 1);
    assert_eq!(outcome.summary.records_written, 0);
    let reason = outcome.summary.failure_reason.unwrap();
    assert!(reason.contains("token expired"), "unexpected reason: {}", reason);
    assert!(gateway.chunks_seen.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn a_snapshot_is_written_when_a_path_is_given() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("result.json");

    let fetcher = Arc::new(
        FakePageFetcher::new()
            .with_page("/search_result", search_page(&["na"]))
            .with_page("/explore/na", note_page("na", "first", "")),
    );
    let orchestrator = Orchestrator::new(ContentExtractor::with_fetcher(
        fetcher,
        "target/test-images",
    ));

    let mut params = keyword_params(10);
    params.snapshot_path = Some(path.clone());

    let outcome = orchestrator.run(params, &JobContext::detached()).await;

    assert_eq!(outcome.status, JobStatus::Completed);
    let loaded = xhs2bitable::load_snapshot(&path).unwrap();
    assert_eq!(loaded, outcome.snapshot);
}
