//! # End-to-end history recording against a host table
//!
//! Integration tests validating:
//! - Transactional `update_with_history`: host row and history commit together
//!   or not at all.
//! - Hydration of a multi-step edit sequence read back from the database.
//! - Registry lookups for unknown types fail consistently.
//! - Scoped retrieval ordering and JSONL export.

use pretty_assertions::assert_eq;
use retrace_core::record::value_to_record;
use retrace_core::{
    CoreError, EmptyIncomingPolicy, Record, RecordId, RegistryBuilder, Tracked, TrackedType,
};
use retrace_db::{DatabaseError, HistoryService, UpdateEvent, read_jsonl};
use serde::Serialize;
use serde_json::json;

// ---------------------------------------------------------------------------
// Host model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
struct User {
    id: i64,
    first_name: String,
    last_name: String,
    address: String,
}

impl Tracked for User {
    const TYPE_NAME: &'static str = "User";
}

const UPDATE_USER: &str =
    "UPDATE users SET first_name = ?1, last_name = ?2, address = ?3 WHERE id = ?4";

fn rec(value: serde_json::Value) -> Record {
    value_to_record(value).unwrap()
}

fn user_params(user: &User) -> Vec<libsql::Value> {
    vec![
        libsql::Value::Text(user.first_name.clone()),
        libsql::Value::Text(user.last_name.clone()),
        libsql::Value::Text(user.address.clone()),
        libsql::Value::Integer(user.id),
    ]
}

async fn setup() -> (HistoryService, TrackedType) {
    let mut builder = RegistryBuilder::new();
    let users = builder.track::<User>().unwrap();
    let svc = HistoryService::open_local(":memory:", builder.build(), EmptyIncomingPolicy::Reject)
        .await
        .unwrap();

    svc.db()
        .conn()
        .execute_batch(
            "CREATE TABLE users (
                 id INTEGER PRIMARY KEY,
                 first_name TEXT NOT NULL,
                 last_name TEXT NOT NULL,
                 address TEXT NOT NULL
             );
             INSERT INTO users (id, first_name, last_name, address)
             VALUES (1, 'John', 'Smith', 'Downing Street');",
        )
        .await
        .unwrap();

    (svc, users)
}

async fn load_user(svc: &HistoryService, id: i64) -> User {
    let mut rows = svc
        .db()
        .conn()
        .query(
            "SELECT id, first_name, last_name, address FROM users WHERE id = ?1",
            [id],
        )
        .await
        .unwrap();
    let row = rows.next().await.unwrap().expect("user row");
    User {
        id: row.get(0).unwrap(),
        first_name: row.get(1).unwrap(),
        last_name: row.get(2).unwrap(),
        address: row.get(3).unwrap(),
    }
}

async fn apply(svc: &HistoryService, users: TrackedType, next: &User) {
    let previous = retrace_core::to_record(&load_user(svc, next.id).await).unwrap();
    let incoming = retrace_core::to_record(next).unwrap();
    svc.update_with_history(
        users,
        &UpdateEvent::new(&previous, &incoming),
        UPDATE_USER,
        user_params(next),
    )
    .await
    .unwrap();
}

fn john() -> User {
    User {
        id: 1,
        first_name: "John".into(),
        last_name: "Smith".into(),
        address: "Downing Street".into(),
    }
}

// ---------------------------------------------------------------------------
// Transactional recording
// ---------------------------------------------------------------------------

#[tokio::test]
async fn update_commits_row_and_history_together() {
    let (svc, users) = setup().await;
    let next = User {
        first_name: "Peter".into(),
        ..john()
    };

    let previous = retrace_core::to_record(&john()).unwrap();
    let incoming = retrace_core::to_record(&next).unwrap();
    let details = json!({"editor": "ops"});
    let outcome = svc
        .update_with_history(
            users,
            &UpdateEvent::new(&previous, &incoming).with_details(&details),
            UPDATE_USER,
            user_params(&next),
        )
        .await
        .unwrap();

    assert_eq!(outcome.rows_affected, 1);
    let entry = outcome.entry.expect("history entry");
    assert_eq!(entry.diff, rec(json!({"first_name": "Peter"})));
    assert_eq!(entry.history_details, Some(details));

    assert_eq!(load_user(&svc, 1).await.first_name, "Peter");
    let stored = svc
        .history(users)
        .unwrap()
        .list_for_origin(&RecordId::Int(1))
        .await
        .unwrap();
    assert_eq!(stored, vec![entry]);
}

#[tokio::test]
async fn failing_host_update_leaves_no_history() {
    let (svc, users) = setup().await;
    let previous = retrace_core::to_record(&john()).unwrap();
    let incoming = rec(json!({"id": 1, "first_name": "Peter", "last_name": "Smith", "address": "Downing Street"}));

    let err = svc
        .update_with_history(
            users,
            &UpdateEvent::new(&previous, &incoming),
            "UPDATE users SET no_such_column = ?1 WHERE id = ?2",
            vec![
                libsql::Value::Text("Peter".into()),
                libsql::Value::Integer(1),
            ],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::LibSql(_)), "got {err:?}");

    let count = svc
        .history(users)
        .unwrap()
        .count_for_origin(&RecordId::Int(1))
        .await
        .unwrap();
    assert_eq!(count, 0);
    assert_eq!(load_user(&svc, 1).await.first_name, "John");
}

#[tokio::test]
async fn failing_history_write_leaves_host_row_unchanged() {
    let (svc, users) = setup().await;
    svc.db()
        .conn()
        .execute("DROP TABLE user_history", ())
        .await
        .unwrap();

    let next = User {
        first_name: "Peter".into(),
        ..john()
    };
    let previous = retrace_core::to_record(&john()).unwrap();
    let incoming = retrace_core::to_record(&next).unwrap();

    let err = svc
        .update_with_history(
            users,
            &UpdateEvent::new(&previous, &incoming),
            UPDATE_USER,
            user_params(&next),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::LibSql(_)), "got {err:?}");
    assert_eq!(load_user(&svc, 1).await.first_name, "John");
}

#[tokio::test]
async fn update_matching_no_row_rolls_back() {
    let (svc, users) = setup().await;
    let ghost = User {
        id: 42,
        ..john()
    };
    let previous = retrace_core::to_record(&ghost).unwrap();
    let next = User {
        first_name: "Nobody".into(),
        ..ghost
    };
    let incoming = retrace_core::to_record(&next).unwrap();

    let err = svc
        .update_with_history(
            users,
            &UpdateEvent::new(&previous, &incoming),
            UPDATE_USER,
            user_params(&next),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::NoResult));

    let count = svc
        .history(users)
        .unwrap()
        .count_for_origin(&RecordId::Int(42))
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn no_op_update_still_runs_host_statement() {
    let (svc, users) = setup().await;
    let previous = retrace_core::to_record(&john()).unwrap();
    let incoming = previous.clone();

    let outcome = svc
        .update_with_history(
            users,
            &UpdateEvent::new(&previous, &incoming),
            UPDATE_USER,
            user_params(&john()),
        )
        .await
        .unwrap();

    assert_eq!(outcome.rows_affected, 1);
    assert!(outcome.entry.is_none());
}

// ---------------------------------------------------------------------------
// Hydration
// ---------------------------------------------------------------------------

#[tokio::test]
async fn hydrate_replays_every_version() {
    let (svc, users) = setup().await;

    let v2 = User {
        first_name: "Peter".into(),
        ..john()
    };
    let v3 = User {
        last_name: "Wong".into(),
        ..v2.clone()
    };
    let v4 = User {
        address: "Stanbridge".into(),
        ..v3.clone()
    };
    for next in [&v2, &v3, &v4] {
        apply(&svc, users, next).await;
    }

    // Folding forward from the state before the first edit yields each version.
    let original = retrace_core::to_record(&john()).unwrap();
    let snapshots = svc.hydrate(users, &original).await.unwrap();
    assert_eq!(snapshots.len(), 3);

    let mut last_id = 0;
    for (snapshot, expected) in snapshots.iter().zip([&v2, &v3, &v4]) {
        assert_eq!(snapshot["originId"], json!(1));
        let entry_id = snapshot["id"].as_i64().unwrap();
        assert!(entry_id > last_id);
        last_id = entry_id;
        assert_eq!(snapshot["first_name"], json!(expected.first_name));
        assert_eq!(snapshot["last_name"], json!(expected.last_name));
        assert_eq!(snapshot["address"], json!(expected.address));
        assert!(snapshot.contains_key("createdAt"));
    }

    // From the current state every field the diffs touch is already final.
    let current = retrace_core::to_record(&load_user(&svc, 1).await).unwrap();
    let snapshots = svc.hydrate(users, &current).await.unwrap();
    assert_eq!(snapshots.len(), 3);
    assert!(
        snapshots
            .iter()
            .all(|s| s["first_name"] == json!("Peter") && s["address"] == json!("Stanbridge"))
    );
}

#[tokio::test]
async fn hydrate_without_history_is_empty() {
    let (svc, users) = setup().await;
    let current = retrace_core::to_record(&john()).unwrap();
    assert!(svc.hydrate(users, &current).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_type_fails_every_time() {
    let (svc, _) = setup().await;

    for _ in 0..3 {
        let err = svc.history_by_name("invoice").err().expect("lookup must fail");
        assert!(err.is_unregistered());
    }

    let mut other = RegistryBuilder::new();
    let foreign = other.register("user").unwrap();
    let err = svc.history(foreign).err().expect("foreign handle");
    assert!(matches!(
        err,
        DatabaseError::Core(CoreError::UnregisteredType { .. })
    ));
}

#[tokio::test]
async fn lookup_by_type_and_name_agree() {
    let (svc, users) = setup().await;
    assert_eq!(svc.registry().lookup_type::<User>().unwrap(), users);
    assert_eq!(svc.history_by_name(" USER ").unwrap().tracked_type(), users);
    assert_eq!(svc.history(users).unwrap().table(), "user_history");
}

// ---------------------------------------------------------------------------
// Retrieval and export
// ---------------------------------------------------------------------------

#[tokio::test]
async fn limited_listing_keeps_newest_in_ascending_order() {
    let (svc, users) = setup().await;
    for name in ["A", "B", "C", "D"] {
        apply(
            &svc,
            users,
            &User {
                first_name: name.into(),
                ..john()
            },
        )
        .await;
    }

    let repo = svc.history(users).unwrap();
    let last_two = repo
        .list_for_origin_limited(&RecordId::Int(1), 2)
        .await
        .unwrap();
    let names: Vec<_> = last_two
        .iter()
        .map(|e| e.diff["first_name"].clone())
        .collect();
    assert_eq!(names, vec![json!("C"), json!("D")]);

    let recent = repo.list_recent(3).await.unwrap();
    let names: Vec<_> = recent
        .iter()
        .map(|e| e.diff["first_name"].clone())
        .collect();
    assert_eq!(names, vec![json!("D"), json!("C"), json!("B")]);
}

#[tokio::test]
async fn exported_history_hydrates_offline() {
    let (svc, users) = setup().await;
    let v2 = User {
        last_name: "Wong".into(),
        ..john()
    };
    apply(&svc, users, &v2).await;

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("users.jsonl");
    assert_eq!(svc.export_jsonl(users, &path).await.unwrap(), 1);

    let entries = read_jsonl(&path).unwrap();
    let current = retrace_core::to_record(&v2).unwrap();
    let snapshots = retrace_core::hydrate(&current, &entries).unwrap();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0]["last_name"], json!("Wong"));
}
