use psychod::backup;
use psychod::workspace::Workspace;
use psychod::StoreError;
use std::fs::File;
use std::io::{Read, Write};

fn seeded_workspace(dir: &std::path::Path) {
    let ws = Workspace::open(dir).expect("open workspace");
    let doc = psychod::keys::parse_document(
        r#"{"keys": [{"a": 3}], "descriptions": [{"a": "steady"}]}"#,
    )
    .expect("key");
    ws.update_keys(&doc).expect("save key");
    ws.submit("Ali", "1", "a").expect("submit");
}

#[test]
fn zip_export_and_import_roundtrip() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    seeded_workspace(src.path());

    let bundle = out.path().join("workspace.psychod.zip");
    let export = backup::export_workspace_bundle(src.path(), &bundle).expect("export");
    assert_eq!(export.bundle_format, backup::BUNDLE_FORMAT);
    assert!(export.files.contains(&"entries.json".to_string()));
    assert!(export.files.contains(&"classes.sqlite3".to_string()));

    let mut archive = zip::ZipArchive::new(File::open(&bundle).unwrap()).unwrap();
    let mut manifest = String::new();
    archive
        .by_name("manifest.json")
        .expect("manifest entry")
        .read_to_string(&mut manifest)
        .unwrap();
    assert!(manifest.contains(backup::BUNDLE_FORMAT));

    let import = backup::import_workspace_bundle(&bundle, dst.path()).expect("import");
    assert_eq!(import.files.len(), export.files.len());
    for name in ["keys.json", "entries.json", "classes.sqlite3"] {
        assert_eq!(
            std::fs::read(src.path().join(name)).unwrap(),
            std::fs::read(dst.path().join(name)).unwrap(),
            "{} differs after restore",
            name
        );
    }
}

#[test]
fn tampered_bundle_is_rejected_before_writing() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    seeded_workspace(src.path());
    let good = src.path().join("good.zip");
    backup::export_workspace_bundle(src.path(), &good).unwrap();

    // Rebuild the bundle with the same manifest but altered entries.
    let mut archive = zip::ZipArchive::new(File::open(&good).unwrap()).unwrap();
    let mut manifest = String::new();
    archive
        .by_name("manifest.json")
        .unwrap()
        .read_to_string(&mut manifest)
        .unwrap();
    let bad = src.path().join("bad.zip");
    let mut zip = zip::ZipWriter::new(File::create(&bad).unwrap());
    let opts = zip::write::FileOptions::default();
    zip.start_file("manifest.json", opts).unwrap();
    zip.write_all(manifest.as_bytes()).unwrap();
    for name in ["keys.json", "entries.json", "classes.sqlite3"] {
        let mut bytes = Vec::new();
        archive
            .by_name(&format!("data/{}", name))
            .unwrap()
            .read_to_end(&mut bytes)
            .unwrap();
        if name == "entries.json" {
            bytes = b"[]".to_vec();
        }
        zip.start_file(format!("data/{}", name), opts).unwrap();
        zip.write_all(&bytes).unwrap();
    }
    zip.finish().unwrap();

    let err = backup::import_workspace_bundle(&bad, dst.path()).unwrap_err();
    assert!(matches!(err, StoreError::Bundle(_)));
    assert!(!dst.path().join("keys.json").exists());
}

#[test]
fn non_zip_input_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let junk = dir.path().join("junk.zip");
    std::fs::write(&junk, b"not a zip").unwrap();
    let err = backup::import_workspace_bundle(&junk, &dir.path().join("ws")).unwrap_err();
    assert!(matches!(err, StoreError::Bundle(_)));
}

#[test]
fn restore_removes_workspace_files_the_bundle_lacks() {
    let src = tempfile::tempdir().unwrap();
    let dst = tempfile::tempdir().unwrap();
    std::fs::write(src.path().join("entries.json"), "[]").unwrap();
    let bundle = src.path().join("entries-only.zip");
    backup::export_workspace_bundle(src.path(), &bundle).unwrap();

    std::fs::write(dst.path().join("psychod.json"), r#"{"strictAnswers": true}"#).unwrap();
    std::fs::write(dst.path().join("keys.json"), r#"{"keys": [], "descriptions": []}"#).unwrap();

    let import = backup::import_workspace_bundle(&bundle, dst.path()).expect("import");
    assert_eq!(import.files, ["entries.json"]);
    assert_eq!(import.removed, ["keys.json", "psychod.json"]);
    assert!(dst.path().join("entries.json").is_file());
    assert!(!dst.path().join("keys.json").exists());
    assert!(!dst.path().join("psychod.json").exists());
}
