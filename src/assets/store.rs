use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::foundation::error::{CollageError, CollageResult};

/// Byte storage for layer bitmaps, masks, fonts and backups, addressed by stable file name.
///
/// Implementations are shared with background jobs, hence `Send + Sync`.
pub trait AssetStore: Send + Sync {
    /// Read the full contents of `name`.
    fn read(&self, name: &str) -> CollageResult<Vec<u8>>;

    /// Write `bytes` to `name`, replacing previous content.
    ///
    /// Returning `Ok` means the content is durably stored.
    fn write(&self, name: &str, bytes: &[u8]) -> CollageResult<()>;

    /// Return `true` if `name` currently exists.
    fn exists(&self, name: &str) -> bool;

    /// Delete `name`. Deleting a missing file succeeds.
    fn delete(&self, name: &str) -> CollageResult<()>;
}

/// Normalize and validate project-relative asset names.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub fn normalize_rel_path(source: &str) -> CollageResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(CollageError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(CollageError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(CollageError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(CollageError::validation(
            "asset path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

/// Filesystem store rooted at one project directory.
#[derive(Clone, Debug)]
pub struct FsAssetStore {
    root: PathBuf,
}

impl FsAssetStore {
    /// Store rooted directly at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store for `project_id` under a shared `base` directory.
    pub fn for_project(base: impl AsRef<Path>, project_id: &str) -> CollageResult<Self> {
        let id = normalize_rel_path(project_id)?;
        Ok(Self::new(base.as_ref().join(id)))
    }

    /// Project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> CollageResult<PathBuf> {
        let norm = normalize_rel_path(name)?;
        Ok(self.root.join(Path::new(&norm)))
    }
}

impl AssetStore for FsAssetStore {
    fn read(&self, name: &str) -> CollageResult<Vec<u8>> {
        let p = self.path_for(name)?;
        std::fs::read(&p)
            .map_err(|e| CollageError::asset(format!("failed to read asset '{}': {e}", p.display())))
    }

    fn write(&self, name: &str, bytes: &[u8]) -> CollageResult<()> {
        let p = self.path_for(name)?;
        if let Some(parent) = p.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CollageError::persist(format!("failed to create '{}': {e}", parent.display()))
            })?;
        }
        // Write-then-rename so a crash never leaves a half written file under `name`.
        let tmp = p.with_extension("partial");
        std::fs::write(&tmp, bytes)
            .and_then(|()| std::fs::rename(&tmp, &p))
            .map_err(|e| {
                CollageError::persist(format!("failed to write asset '{}': {e}", p.display()))
            })
    }

    fn exists(&self, name: &str) -> bool {
        self.path_for(name).map(|p| p.is_file()).unwrap_or(false)
    }

    fn delete(&self, name: &str) -> CollageResult<()> {
        let p = self.path_for(name)?;
        match std::fs::remove_file(&p) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CollageError::persist(format!(
                "failed to delete asset '{}': {e}",
                p.display()
            ))),
        }
    }
}

/// In-memory store, mostly for tests and previews.
#[derive(Debug, Default)]
pub struct MemoryAssetStore {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    fail_writes: AtomicBool,
}

impl MemoryAssetStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with [`CollageError::Persist`].
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Sorted list of stored names.
    pub fn names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        // A poisoned map is still a consistent map: every mutation is a single insert/remove.
        self.files
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl AssetStore for MemoryAssetStore {
    fn read(&self, name: &str) -> CollageResult<Vec<u8>> {
        let key = normalize_rel_path(name)?;
        self.lock()
            .get(&key)
            .cloned()
            .ok_or_else(|| CollageError::asset(format!("asset '{key}' not found")))
    }

    fn write(&self, name: &str, bytes: &[u8]) -> CollageResult<()> {
        let key = normalize_rel_path(name)?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CollageError::persist(format!("write to '{key}' rejected")));
        }
        self.lock().insert(key, bytes.to_vec());
        Ok(())
    }

    fn exists(&self, name: &str) -> bool {
        normalize_rel_path(name)
            .map(|key| self.lock().contains_key(&key))
            .unwrap_or(false)
    }

    fn delete(&self, name: &str) -> CollageResult<()> {
        let key = normalize_rel_path(name)?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CollageError::persist(format!("delete of '{key}' rejected")));
        }
        self.lock().remove(&key);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
