//! Lock-scoped atomic mutation of a persisted chain node.
//!
//! Slot allocation is a read-modify-write: read the current assignments,
//! pick a slot, record the entry. Two raters arriving at once must not both
//! read the same table and race onto one slot, so every mutation runs under
//! a per-node lockfile held from load to save.

use crate::node::NodeState;
use crate::store::{NodeFileError, read_node_from_path, write_node_to_path};
use chrono::Utc;
use std::error::Error as StdError;
use std::ffi::OsString;
use std::fmt::{Display, Formatter};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Sibling lockfile guarding one node document.
pub fn node_lock_path(node_path: &Path) -> PathBuf {
    let mut path: OsString = node_path.as_os_str().to_os_string();
    path.push(".lock");
    PathBuf::from(path)
}

#[derive(Debug)]
pub enum AtomicNodeError<E> {
    /// Another mutation currently holds the node lock.
    LockBusy { lock_path: String },
    LockIo { lock_path: String, message: String },
    File(NodeFileError),
    Mutation(E),
}

impl<E: Display> Display for AtomicNodeError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LockBusy { lock_path } => write!(f, "node lock busy: {lock_path}"),
            Self::LockIo { lock_path, message } => {
                write!(f, "failed to acquire node lock {lock_path}: {message}")
            }
            Self::File(err) => write!(f, "{err}"),
            Self::Mutation(err) => write!(f, "{err}"),
        }
    }
}

impl<E> StdError for AtomicNodeError<E> where E: Display + std::fmt::Debug + StdError + 'static {}

/// Execute one lock-scoped mutation against a node JSON path.
///
/// The mutator returns `(value, changed)`:
/// - `value` is returned to the caller
/// - `changed=true` persists the node before the lock is released.
///
/// The lock covers the whole load -> decide -> save cycle, so a concurrent
/// call for the same node either waits out as `LockBusy` or observes the
/// recorded result.
pub fn mutate_node_json<T, E, F>(
    path: impl AsRef<Path>,
    mutator: F,
) -> Result<T, AtomicNodeError<E>>
where
    F: FnOnce(&mut NodeState) -> Result<(T, bool), E>,
{
    let path = path.as_ref();
    let _guard = NodeLockGuard::acquire(path)?;

    let mut node = read_node_from_path(path).map_err(AtomicNodeError::File)?;
    let (value, changed) = mutator(&mut node).map_err(AtomicNodeError::Mutation)?;
    if changed {
        write_node_to_path(path, &node).map_err(AtomicNodeError::File)?;
    }
    Ok(value)
}

struct NodeLockGuard {
    lock_path: PathBuf,
    _file: File,
}

impl NodeLockGuard {
    fn acquire<E>(path: &Path) -> Result<Self, AtomicNodeError<E>> {
        let lock_path = node_lock_path(path);
        if let Some(parent) = lock_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| AtomicNodeError::LockIo {
                lock_path: lock_path.display().to_string(),
                message: e.to_string(),
            })?;
        }

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(mut file) => {
                let _ = writeln!(
                    file,
                    "pid={}\nutc={}",
                    std::process::id(),
                    Utc::now().to_rfc3339()
                );
                Ok(Self {
                    lock_path,
                    _file: file,
                })
            }
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(AtomicNodeError::LockBusy {
                    lock_path: lock_path.display().to_string(),
                })
            }
            Err(err) => Err(AtomicNodeError::LockIo {
                lock_path: lock_path.display().to_string(),
                message: err.to_string(),
            }),
        }
    }
}

impl Drop for NodeLockGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}
