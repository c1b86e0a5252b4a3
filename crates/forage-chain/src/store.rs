//! Node file storage: one JSON document per chain node.
//!
//! The portable persisted form of a node. Writes go through a temp file,
//! fsync, and rename, so a reader never observes a half-written node even
//! while an allocation is being recorded.

use crate::node::NodeState;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Errors from node file operations.
#[derive(Debug, thiserror::Error)]
pub enum NodeFileError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("corrupted node file: {0}")]
    Corrupt(String),
}

/// Read a node from a JSON file path.
pub fn read_node_from_path(path: impl AsRef<Path>) -> Result<NodeState, NodeFileError> {
    let path = path.as_ref();
    let bytes =
        fs::read(path).map_err(|e| NodeFileError::Io(format!("{}: {e}", path.display())))?;
    validate_substrate_bytes(path, &bytes)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| NodeFileError::Parse(format!("{}: {e}", path.display())))
}

/// Write a node to a JSON file path, replacing any previous document atomically.
pub fn write_node_to_path(path: impl AsRef<Path>, node: &NodeState) -> Result<(), NodeFileError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| NodeFileError::Io(format!("{parent:?}: {e}")))?;
    }

    let document =
        serde_json::to_vec_pretty(node).map_err(|e| NodeFileError::Serialize(e.to_string()))?;

    let tmp_path = tmp_write_path(path);
    let write_result = (|| -> Result<(), NodeFileError> {
        let file = File::create(&tmp_path)
            .map_err(|e| NodeFileError::Io(format!("{}: {e}", tmp_path.display())))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(&document)
            .and_then(|_| writer.write_all(b"\n"))
            .map_err(|e| NodeFileError::Io(format!("{}: {e}", tmp_path.display())))?;
        writer
            .flush()
            .map_err(|e| NodeFileError::Io(format!("{}: {e}", tmp_path.display())))?;
        let file = writer
            .into_inner()
            .map_err(|e| NodeFileError::Io(format!("{}: {e}", tmp_path.display())))?;
        file.sync_all()
            .map_err(|e| NodeFileError::Io(format!("{}: {e}", tmp_path.display())))?;
        Ok(())
    })();

    if let Err(error) = write_result {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        NodeFileError::Io(format!(
            "{} -> {}: {e}",
            tmp_path.display(),
            path.display()
        ))
    })?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        let dir = File::open(parent)
            .map_err(|e| NodeFileError::Io(format!("{}: {e}", parent.display())))?;
        dir.sync_all()
            .map_err(|e| NodeFileError::Io(format!("{}: {e}", parent.display())))?;
    }

    Ok(())
}

fn tmp_write_path(path: &Path) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut tmp: OsString = path.as_os_str().to_os_string();
    tmp.push(format!(".tmp.{}.{}", std::process::id(), unique));
    PathBuf::from(tmp)
}

fn validate_substrate_bytes(path: &Path, bytes: &[u8]) -> Result<(), NodeFileError> {
    if bytes.contains(&0) {
        return Err(NodeFileError::Corrupt(format!(
            "{}: contains NUL byte(s)",
            path.display()
        )));
    }
    if std::str::from_utf8(bytes).is_err() {
        return Err(NodeFileError::Corrupt(format!(
            "{}: contains non-UTF-8 byte sequence(s)",
            path.display()
        )));
    }
    Ok(())
}
