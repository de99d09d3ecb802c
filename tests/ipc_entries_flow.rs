mod test_support;

use serde_json::json;
use test_support::{sample_key, spawn_sidecar};

#[test]
fn requests_before_workspace_select_are_rejected() {
    let mut sidecar = spawn_sidecar();
    let health = sidecar.request_ok("health", json!({}));
    assert!(health["workspacePath"].is_null());
    assert_eq!(sidecar.request_err("entries.list", json!({})), "no_workspace");
    // classes.list degrades to an empty list like the dashboard expects
    let classes = sidecar.request_ok("classes.list", json!({}));
    assert_eq!(classes["classes"], json!([]));
    assert_eq!(
        sidecar.request_err("nope.method", json!({})),
        "not_implemented"
    );
}

#[test]
fn submit_edit_details_delete_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let mut sidecar = spawn_sidecar();
    sidecar.request_ok("workspace.select", json!({ "path": dir.path() }));
    sidecar.request_ok("keys.update", json!({ "document": sample_key() }));

    let submitted = sidecar.request_ok(
        "entries.submit",
        json!({ "name": "Sara", "phone": "0912", "answers": "AB" }),
    );
    assert_eq!(submitted["entry"]["score"], 12);
    assert_eq!(submitted["entry"]["answers"], "ab");
    assert!(submitted["entry"]["keys_snapshot"].is_array());
    assert_eq!(submitted["text"], "- Leads the group\n- Improvises");

    let missing_name = sidecar.request_err("entries.submit", json!({ "name": " ", "answers": "a" }));
    assert_eq!(missing_name, "bad_params");

    let edited = sidecar.request_ok(
        "entries.edit",
        json!({
            "original": { "name": "Sara", "phone": "0912", "answers": "ab" },
            "name": "Sara K",
            "phone": "0912",
            "answers": "bb"
        }),
    );
    assert_eq!(edited["replaced"], true);
    assert_eq!(edited["entry"]["score"], 7);

    let miss = sidecar.request_ok(
        "entries.edit",
        json!({
            "original": { "name": "Ghost", "phone": "", "answers": "" },
            "name": "Ghost",
            "answers": "a"
        }),
    );
    assert_eq!(miss["replaced"], false);

    let details = sidecar.request_ok(
        "entries.details",
        json!({ "name": "Sara K", "phone": "0912", "answers": "bb" }),
    );
    assert_eq!(details["feedback"][0]["description"], "Supports the group");
    assert_eq!(details["feedback"][1]["points"], 2);

    let removed = sidecar.request_ok(
        "entries.delete",
        json!({ "name": "Sara K", "phone": "0912", "answers": "bb" }),
    );
    assert_eq!(removed["removed"], 1);
    let listed = sidecar.request_ok("entries.list", json!({}));
    assert_eq!(listed["entries"], json!([]));
}

#[test]
fn key_update_rescores_only_entries_without_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("entries.json"),
        json!([
            { "name": "Old", "phone": "1", "answers": "a", "score": 10 },
            {
                "name": "Snap", "phone": "2", "answers": "a", "score": 10,
                "keys_snapshot": [{ "a": 10, "b": 5 }]
            }
        ])
        .to_string(),
    )
    .unwrap();

    let mut sidecar = spawn_sidecar();
    sidecar.request_ok("workspace.select", json!({ "path": dir.path() }));
    let updated = sidecar.request_ok(
        "keys.update",
        json!({ "text": r#"{"keys": [{"a": 1, "b": 5}], "descriptions": [{"a": "x", "b": "y"}]}"# }),
    );
    assert_eq!(updated["recalculated"], 1);

    let listed = sidecar.request_ok("entries.list", json!({ "sortBy": "name" }));
    let entries = listed["entries"].as_array().unwrap();
    assert_eq!(entries[0]["name"], "Old");
    assert_eq!(entries[0]["score"], 1);
    assert_eq!(entries[1]["score"], 10);

    // malformed editor text aborts without touching the key
    let code = sidecar.request_err("keys.update", json!({ "text": "{broken" }));
    assert_eq!(code, "bad_params");
    let key = sidecar.request_ok("keys.get", json!({}));
    assert_eq!(key["keys"][0]["a"], 1);

    let migrated = sidecar.request_ok("entries.migrateSnapshots", json!({}));
    assert_eq!(migrated["migrated"], 1);
}

#[test]
fn search_sort_and_deduplicate() {
    let dir = tempfile::tempdir().unwrap();
    let mut sidecar = spawn_sidecar();
    sidecar.request_ok("workspace.select", json!({ "path": dir.path() }));
    sidecar.request_ok("keys.update", json!({ "document": sample_key() }));
    for (name, phone, answers) in [
        ("Maryam", "0912", "aa"),
        ("Omid", "0935", "bb"),
        ("Maryam", "0912", "aa"),
    ] {
        sidecar.request_ok(
            "entries.submit",
            json!({ "name": name, "phone": phone, "answers": answers }),
        );
    }

    let hits = sidecar.request_ok("entries.search", json!({ "query": "MARY" }));
    assert_eq!(hits["entries"].as_array().unwrap().len(), 2);

    let by_score = sidecar.request_ok("entries.list", json!({ "sortBy": "score", "order": "desc" }));
    assert_eq!(by_score["entries"][0]["score"], 11);

    let first = sidecar.request_ok("entries.deduplicate", json!({}));
    assert_eq!(first["removed"], 1);
    assert_eq!(first["remaining"], 2);
    let second = sidecar.request_ok("entries.deduplicate", json!({}));
    assert_eq!(second["removed"], 0);
    assert_eq!(second["remaining"], 2);
}

#[test]
fn strict_workspace_rejects_short_answers() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("psychod.json"),
        json!({ "strictAnswers": true, "snapshots": false }).to_string(),
    )
    .unwrap();
    let mut sidecar = spawn_sidecar();
    let selected = sidecar.request_ok("workspace.select", json!({ "path": dir.path() }));
    assert_eq!(selected["strictAnswers"], true);
    sidecar.request_ok("keys.update", json!({ "document": sample_key() }));

    let code = sidecar.request_err("entries.submit", json!({ "name": "Ali", "answers": "a" }));
    assert_eq!(code, "bad_params");
    let ok = sidecar.request_ok("entries.submit", json!({ "name": "Ali", "answers": "ba" }));
    assert_eq!(ok["entry"]["score"], 6);
    assert!(ok["entry"].get("keys_snapshot").is_none());
}
