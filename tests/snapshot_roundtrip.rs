use pretty_assertions::assert_eq;
use xhs2bitable::{load_snapshot, save_snapshot, AppError, JobSnapshot, Note, PublishTime, User};

#[test]
fn a_snapshot_survives_save_and_load_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("snapshot.json");

    let mut snapshot = JobSnapshot::default();
    snapshot.notes.push(Note {
        note_id: "n1".into(),
        title: "Trip".into(),
        user_id: "u1".into(),
        upload_time: PublishTime::Millis(1700000000000),
        tag_list: vec!["travel".into()],
        ..Note::default()
    });
    snapshot.notes.push(Note {
        note_id: "n2".into(),
        upload_time: PublishTime::Raw("2023-07-01 12:00".into()),
        ..Note::default()
    });
    snapshot.users.insert(
        "u1".into(),
        User {
            user_id: "u1".into(),
            nickname: "amy".into(),
            fans: 412,
            ..User::default()
        },
    );

    save_snapshot(&path, &snapshot).unwrap();
    let loaded = load_snapshot(&path).unwrap();

    assert_eq!(loaded, snapshot);
    // Both timestamp shapes come back in their original form.
    assert_eq!(loaded.notes[0].upload_time, PublishTime::Millis(1700000000000));
    assert_eq!(
        loaded.notes[1].upload_time,
        PublishTime::Raw("2023-07-01 12:00".into())
    );
}

#[test]
fn loading_a_corrupt_snapshot_names_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = load_snapshot(&path).unwrap_err();
    match err {
        AppError::SnapshotParseError { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn loading_a_missing_snapshot_is_an_io_error() {
    let err = load_snapshot(std::path::Path::new("/no/such/snapshot.json")).unwrap_err();
    assert!(matches!(err, AppError::Io(_)));
}
