use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::config::{CLASSES_DB_FILE, CONFIG_FILE, ENTRIES_FILE, KEYS_FILE};
use crate::error::{StoreError, StoreResult};

const MANIFEST_ENTRY: &str = "manifest.json";
pub const BUNDLE_FORMAT: &str = "psychod-workspace-v1";

/// Files a bundle may carry, stored under `data/` in the archive.
const WORKSPACE_FILES: [&str; 4] = [KEYS_FILE, ENTRIES_FILE, CLASSES_DB_FILE, CONFIG_FILE];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Manifest {
    format: String,
    app_version: String,
    exported_at: String,
    /// File name to lowercase hex SHA-256.
    files: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    pub bundle_format: String,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub bundle_format: String,
    pub files: Vec<String>,
    /// Workspace files the bundle did not carry, deleted by the restore.
    pub removed: Vec<String>,
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

fn zip_err(e: zip::result::ZipError) -> StoreError {
    StoreError::Bundle(e.to_string())
}

pub fn export_workspace_bundle(workspace: &Path, out_path: &Path) -> StoreResult<ExportSummary> {
    let mut payload: Vec<(&str, Vec<u8>)> = Vec::new();
    for name in WORKSPACE_FILES {
        let p = workspace.join(name);
        if p.is_file() {
            let bytes = std::fs::read(&p).map_err(|e| StoreError::io(&p, e))?;
            payload.push((name, bytes));
        }
    }
    if payload.is_empty() {
        return Err(StoreError::not_found(format!(
            "no workspace files in {}",
            workspace.display()
        )));
    }

    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
    }
    let out_file = File::create(out_path).map_err(|e| StoreError::io(out_path, e))?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let manifest = Manifest {
        format: BUNDLE_FORMAT.to_string(),
        app_version: env!("CARGO_PKG_VERSION").to_string(),
        exported_at: chrono::Utc::now().to_rfc3339(),
        files: payload
            .iter()
            .map(|(name, bytes)| (name.to_string(), sha256_hex(bytes)))
            .collect(),
    };
    let manifest_text = serde_json::to_string_pretty(&manifest)
        .map_err(|e| StoreError::json(MANIFEST_ENTRY, e))?;
    zip.start_file(MANIFEST_ENTRY, opts).map_err(zip_err)?;
    zip.write_all(manifest_text.as_bytes())
        .map_err(|e| StoreError::io(out_path, e))?;

    for (name, bytes) in &payload {
        zip.start_file(format!("data/{}", name), opts)
            .map_err(zip_err)?;
        zip.write_all(bytes).map_err(|e| StoreError::io(out_path, e))?;
    }
    zip.finish().map_err(zip_err)?;

    let files: Vec<String> = payload.iter().map(|(n, _)| n.to_string()).collect();
    tracing::info!(bundle = %out_path.display(), files = files.len(), "workspace exported");
    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT.to_string(),
        files,
    })
}

/// Restore a bundle into `workspace`. Every checksum is verified before
/// any workspace file is replaced. The restored workspace holds exactly the
/// bundle's files: workspace files the bundle lacks are removed.
pub fn import_workspace_bundle(in_path: &Path, workspace: &Path) -> StoreResult<ImportSummary> {
    let in_file = File::open(in_path).map_err(|e| StoreError::io(in_path, e))?;
    let mut archive = ZipArchive::new(in_file).map_err(zip_err)?;

    let mut manifest_text = String::new();
    archive
        .by_name(MANIFEST_ENTRY)
        .map_err(|_| StoreError::Bundle("bundle missing manifest.json".into()))?
        .read_to_string(&mut manifest_text)
        .map_err(|e| StoreError::io(in_path, e))?;
    let manifest: Manifest = serde_json::from_str(&manifest_text)
        .map_err(|e| StoreError::Bundle(format!("manifest.json is invalid: {}", e)))?;
    if manifest.format != BUNDLE_FORMAT {
        return Err(StoreError::Bundle(format!(
            "unsupported bundle format: {}",
            manifest.format
        )));
    }

    let mut extracted: Vec<(String, Vec<u8>)> = Vec::new();
    for (name, expected) in &manifest.files {
        if !WORKSPACE_FILES.contains(&name.as_str()) {
            return Err(StoreError::Bundle(format!("unexpected file in bundle: {}", name)));
        }
        let mut bytes = Vec::new();
        archive
            .by_name(&format!("data/{}", name))
            .map_err(|_| StoreError::Bundle(format!("bundle missing data/{}", name)))?
            .read_to_end(&mut bytes)
            .map_err(|e| StoreError::io(in_path, e))?;
        if sha256_hex(&bytes) != *expected {
            return Err(StoreError::Bundle(format!("checksum mismatch for {}", name)));
        }
        extracted.push((name.clone(), bytes));
    }

    std::fs::create_dir_all(workspace).map_err(|e| StoreError::io(workspace, e))?;
    for (name, bytes) in &extracted {
        let dst = workspace.join(name);
        let tmp = workspace.join(format!("{}.importing", name));
        std::fs::write(&tmp, bytes).map_err(|e| StoreError::io(&tmp, e))?;
        std::fs::rename(&tmp, &dst).map_err(|e| StoreError::io(&dst, e))?;
    }

    let mut removed = Vec::new();
    for name in WORKSPACE_FILES {
        let stale = workspace.join(name);
        if !manifest.files.contains_key(name) && stale.is_file() {
            std::fs::remove_file(&stale).map_err(|e| StoreError::io(&stale, e))?;
            removed.push(name.to_string());
        }
    }

    let files: Vec<String> = extracted.into_iter().map(|(n, _)| n).collect();
    tracing::info!(
        bundle = %in_path.display(),
        files = files.len(),
        removed = removed.len(),
        "workspace restored"
    );
    Ok(ImportSummary {
        bundle_format: manifest.format,
        files,
        removed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_matches_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn export_of_empty_workspace_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = export_workspace_bundle(dir.path(), &dir.path().join("out.zip")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
