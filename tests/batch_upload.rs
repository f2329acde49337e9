mod common;

use common::FakeGateway;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use xhs2bitable::{BatchUploader, NoteRecord, RecordFields};

fn records(n: usize) -> Vec<NoteRecord> {
    (0..n)
        .map(|i| {
            let mut fields = RecordFields::new();
            fields.insert("fld_note_id".to_string(), json!(format!("n{}", i)));
            NoteRecord {
                fields,
                pending_attachments: Vec::new(),
            }
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn records_are_written_in_chunks_of_ten() {
    let gateway = Arc::new(FakeGateway::new());
    let uploader = BatchUploader::new(gateway.clone());

    let ids = uploader.write_records("app1", "tbl1", records(25)).await;

    assert_eq!(ids.len(), 25);
    assert_eq!(*gateway.chunks_seen.lock().unwrap(), vec![10, 10, 5]);
}

#[tokio::test(start_paused = true)]
async fn a_failed_chunk_is_skipped_and_the_rest_still_land() {
    let gateway = Arc::new(FakeGateway::new().failing_chunks(&[1]));
    let uploader = BatchUploader::new(gateway.clone());

    let ids = uploader.write_records("app1", "tbl1", records(25)).await;

    // Chunk 0 (records 0..10) and chunk 2 (records 20..25), in order.
    let expected: Vec<String> = (0..10).chain(20..25).map(|i| format!("rec{}", i)).collect();
    assert_eq!(ids, expected);
    assert_eq!(gateway.chunks_seen.lock().unwrap().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn every_chunk_failing_yields_no_ids() {
    let gateway = Arc::new(FakeGateway::new().failing_chunks(&[0, 1]));
    let uploader = BatchUploader::new(gateway);

    let ids = uploader.write_records("app1", "tbl1", records(12)).await;
    assert!(ids.is_empty());
}

#[tokio::test]
async fn a_missing_attachment_file_is_a_no_op() {
    let gateway = Arc::new(FakeGateway::new());
    let uploader = BatchUploader::new(gateway.clone());

    let token = uploader
        .upload_attachment("app1", "tbl1", "fld_attachments", &PathBuf::from("/no/such/file.jpg"))
        .await;

    assert!(token.is_none());
    assert!(gateway.uploads_seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn resolved_attachments_land_as_file_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("image_0.jpg");
    std::fs::write(&image, b"jpeg bytes").unwrap();

    let gateway = Arc::new(FakeGateway::new());
    let uploader = BatchUploader::new(gateway.clone());

    let mut recs = records(1);
    recs[0].pending_attachments = vec![image.clone(), PathBuf::from("/no/such/file.jpg")];

    uploader
        .resolve_attachments("app1", "tbl1", "fld_attachments", &mut recs)
        .await;

    assert!(recs[0].pending_attachments.is_empty());
    assert_eq!(
        recs[0].fields["fld_attachments"],
        json!([{ "file_token": "tok_image_0.jpg" }])
    );
    assert_eq!(*gateway.uploads_seen.lock().unwrap(), vec![image]);
}

#[tokio::test]
async fn records_with_no_pending_attachments_get_no_attachment_cell() {
    let gateway = Arc::new(FakeGateway::new());
    let uploader = BatchUploader::new(gateway);

    let mut recs = records(1);
    uploader
        .resolve_attachments("app1", "tbl1", "fld_attachments", &mut recs)
        .await;

    assert!(!recs[0].fields.contains_key("fld_attachments"));
}
