mod common;

use common::FakeGateway;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use xhs2bitable::{to_record, Note, NoteField, SchemaSynchronizer, User};

#[tokio::test]
async fn provisioning_creates_every_standard_field_in_order() {
    let schema = SchemaSynchronizer::new(Arc::new(FakeGateway::new()));
    let (table_id, map) = schema.provision_note_table("app1", "Notes").await.unwrap();

    assert_eq!(table_id, "tbl1");
    assert_eq!(map.len(), NoteField::ALL.len());
    let keys: Vec<_> = map.keys().copied().collect();
    assert_eq!(keys, NoteField::ALL.to_vec());
    assert_eq!(map[&NoteField::NoteId], "fld_note_id");
}

#[tokio::test]
async fn a_rejected_field_is_omitted_not_fatal() {
    let gateway = FakeGateway::new().failing_field("Likes");
    let schema = SchemaSynchronizer::new(Arc::new(gateway));
    let (_, map) = schema.provision_note_table("app1", "Notes").await.unwrap();

    assert_eq!(map.len(), NoteField::ALL.len() - 1);
    assert!(!map.contains_key(&NoteField::Likes));
    assert!(map.contains_key(&NoteField::Collects));
}

#[tokio::test]
async fn mapping_fills_only_the_provisioned_fields() {
    let gateway = FakeGateway::new().failing_field("Tags");
    let schema = SchemaSynchronizer::new(Arc::new(gateway));
    let (_, map) = schema.provision_note_table("app1", "Notes").await.unwrap();

    let note = Note {
        note_id: "n1".into(),
        title: "Trip".into(),
        user_id: "u1".into(),
        liked_count: 12,
        tag_list: vec!["travel".into(), "food".into()],
        ..Note::default()
    };
    let user = User {
        user_id: "u1".into(),
        fans: 412,
        ..User::default()
    };
    let record = to_record(&note, Some(&user), &map, &[]);

    assert_eq!(record.fields["fld_note_id"], json!("n1"));
    assert_eq!(record.fields["fld_likes"], json!(12));
    assert_eq!(record.fields["fld_follower_count"], json!(412));
    assert_eq!(
        record.fields["fld_note_url"],
        json!("https://www.xiaohongshu.com/explore/n1")
    );
    assert!(
        !record.fields.values().any(|v| v == &json!("travel, food")),
        "a field the table does not have is dropped"
    );
}

#[tokio::test]
async fn an_empty_tag_list_writes_no_tags_cell() {
    let schema = SchemaSynchronizer::new(Arc::new(FakeGateway::new()));
    let (_, map) = schema.provision_note_table("app1", "Notes").await.unwrap();

    let note = Note {
        note_id: "n1".into(),
        ..Note::default()
    };
    let record = to_record(&note, None, &map, &[]);

    assert!(!record.fields.contains_key("fld_tags"));
    assert!(!record.fields.contains_key("fld_published_at"));
}

#[tokio::test]
async fn follower_count_needs_a_fetched_author() {
    let schema = SchemaSynchronizer::new(Arc::new(FakeGateway::new()));
    let (_, map) = schema.provision_note_table("app1", "Notes").await.unwrap();

    let note = Note {
        note_id: "n1".into(),
        user_id: "u1".into(),
        ..Note::default()
    };
    let record = to_record(&note, None, &map, &[]);

    assert!(!record.fields.contains_key("fld_follower_count"));
}
