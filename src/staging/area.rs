// Wallet Vault - Staging area and staged file handles
//
// A `StagingArea` owns the registry of live staged files. Handles share the
// registry and release themselves on drop; `release_all()` drains whatever is
// left when the process is interrupted and closes the area for good. Whoever
// removes a path from the registry performs its erase, so each file is erased
// exactly once.

use std::collections::BTreeSet;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use rand::RngCore;
use zeroize::Zeroizing;

use super::erase::{EraseOutcome, Eraser};
use super::StagingError;

/// Staged file names start with this prefix so stray files are recognisable.
const FILE_PREFIX: &str = ".wallet-vault-";

/// Random bytes in each staged file name (128 bits).
const NAME_ENTROPY: usize = 16;

/// Upper bound for `read_all`. Staged content is a single backup envelope.
const MAX_READ_BYTES: u64 = 64 * 1024 * 1024;

/// Live staged paths. `None` once the area has been drained.
type Registry = Arc<Mutex<Option<BTreeSet<PathBuf>>>>;

fn lock(registry: &Registry) -> MutexGuard<'_, Option<BTreeSet<PathBuf>>> {
    // A panic while holding the lock must not stop cleanup.
    registry
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ─── Staging Area ────────────────────────────────────────────────────────────

/// Directory plus registry of staged files. Cheap to clone; clones share the
/// registry.
#[derive(Clone)]
pub struct StagingArea {
    dir: PathBuf,
    registry: Registry,
    eraser: Eraser,
}

impl StagingArea {
    /// Stage in `preferred` when it is a writable directory, else in `fallback`.
    pub fn new(preferred: Option<&Path>, fallback: &Path) -> Result<Self, StagingError> {
        let mut tried = Vec::new();

        for candidate in preferred.into_iter().chain(std::iter::once(fallback)) {
            if is_writable_dir(candidate) {
                tracing::debug!(dir = %candidate.display(), "Using staging directory");
                return Ok(Self::in_dir(candidate));
            }
            tracing::debug!(dir = %candidate.display(), "Staging directory not usable");
            tried.push(candidate.to_path_buf());
        }

        Err(StagingError::NoUsableDirectory(tried))
    }

    /// Stage in `dir` without probing it.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            registry: Arc::new(Mutex::new(Some(BTreeSet::new()))),
            eraser: Eraser::new(),
        }
    }

    /// Replace the eraser used for every handle acquired afterwards.
    pub fn with_eraser(mut self, eraser: Eraser) -> Self {
        self.eraser = eraser;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create a new owner-only staged file with an unpredictable name. Fails
    /// once the area has been drained.
    pub fn acquire(&self) -> Result<StagedFile, StagingError> {
        // Held across the create so a concurrent drain cannot miss the file.
        let mut registry = lock(&self.registry);
        let live = registry.as_mut().ok_or(StagingError::Closed)?;

        let path = self.dir.join(random_name());
        let file = create_owner_only(&path).map_err(|source| StagingError::Create {
            dir: self.dir.clone(),
            source,
        })?;
        live.insert(path.clone());
        drop(registry);

        tracing::debug!(path = %path.display(), "Staged file acquired");

        Ok(StagedFile {
            path,
            file: Some(file),
            registry: Arc::clone(&self.registry),
            eraser: self.eraser.clone(),
        })
    }

    /// Erase a plaintext file that was never staged, with this area's eraser.
    pub fn erase_unstaged(&self, path: &Path) -> Option<EraseOutcome> {
        erase_logged(&self.eraser, path)
    }

    /// Number of staged files not yet released.
    pub fn pending(&self) -> usize {
        lock(&self.registry).as_ref().map_or(0, BTreeSet::len)
    }

    /// True once `release_all()` has run.
    pub fn is_closed(&self) -> bool {
        lock(&self.registry).is_none()
    }

    /// Erase every registered file and refuse further acquires. Returns how
    /// many were drained.
    pub fn release_all(&self) -> usize {
        let drained = lock(&self.registry).take().unwrap_or_default();
        for path in &drained {
            erase_logged(&self.eraser, path);
        }
        drained.len()
    }
}

impl fmt::Debug for StagingArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagingArea")
            .field("dir", &self.dir)
            .field("pending", &self.pending())
            .finish()
    }
}

// ─── Staged File ─────────────────────────────────────────────────────────────

/// Exclusive handle to one staged file. Reads, writes and seeks go to the
/// underlying file; dropping the handle erases it.
pub struct StagedFile {
    path: PathBuf,
    file: Option<File>,
    registry: Registry,
    eraser: Eraser,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rewind(&mut self) -> io::Result<()> {
        self.file()?.seek(SeekFrom::Start(0)).map(|_| ())
    }

    /// Flush written content to the device.
    pub fn sync(&mut self) -> io::Result<()> {
        self.file()?.sync_all()
    }

    /// Read the whole file from the start into a zeroizing buffer. Fails
    /// with `InvalidData` above `MAX_READ_BYTES`.
    pub fn read_all(&mut self) -> io::Result<Zeroizing<Vec<u8>>> {
        let file = self.file()?;
        let len = file.metadata()?.len();
        if len > MAX_READ_BYTES {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("staged file holds {len} bytes, more than {MAX_READ_BYTES}"),
            ));
        }
        file.seek(SeekFrom::Start(0))?;

        // Sized up front so the buffer never reallocates and leaves copies.
        let mut buf = Zeroizing::new(Vec::with_capacity(len as usize + 1));
        file.take(MAX_READ_BYTES).read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Erase and unlink now. `None` when the registry was already drained.
    pub fn release(mut self) -> Option<EraseOutcome> {
        self.release_inner()
    }

    fn file(&mut self) -> io::Result<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("staged file already released"))
    }

    fn release_inner(&mut self) -> Option<EraseOutcome> {
        drop(self.file.take());

        let owned = lock(&self.registry)
            .as_mut()
            .is_some_and(|live| live.remove(&self.path));
        if !owned {
            return None;
        }
        erase_logged(&self.eraser, &self.path)
    }
}

impl Read for StagedFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file()?.read(buf)
    }
}

impl Write for StagedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file()?.flush()
    }
}

impl Seek for StagedFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file()?.seek(pos)
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        self.release_inner();
    }
}

impl fmt::Debug for StagedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagedFile")
            .field("path", &self.path)
            .field("open", &self.file.is_some())
            .finish()
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn random_name() -> String {
    let mut bytes = [0u8; NAME_ENTROPY];
    rand::rng().fill_bytes(&mut bytes);
    let suffix: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    format!("{FILE_PREFIX}{suffix}")
}

/// Exclusive create with mode 0600, re-applied after open so the umask
/// cannot widen or narrow it.
pub fn create_owner_only(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true).write(true).create_new(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let file = options.open(path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    Ok(file)
}

/// Permission bits miss read-only mounts, so probe with a real file.
fn is_writable_dir(dir: &Path) -> bool {
    if !dir.is_dir() {
        return false;
    }
    let probe = dir.join(random_name());
    match create_owner_only(&probe) {
        Ok(file) => {
            drop(file);
            let _ = fs::remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}

fn erase_logged(eraser: &Eraser, path: &Path) -> Option<EraseOutcome> {
    match eraser.erase(path) {
        Ok(outcome) => {
            if outcome.is_degraded() {
                tracing::warn!(path = %path.display(), "Staged file removed without secure erase");
            } else {
                tracing::debug!(path = %path.display(), ?outcome, "Staged file released");
            }
            Some(outcome)
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Failed to remove staged file");
            None
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
