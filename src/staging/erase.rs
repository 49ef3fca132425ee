// Wallet Vault - Destructive file erasure
//
// Prefers `shred` for a multi-pass overwrite. Without it, the process writes a
// single pass of random bytes itself. If even that fails the file is still
// unlinked: a degraded erase is logged, never fatal.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use rand::RngCore;

use super::StagingError;

// ─── Constants ───────────────────────────────────────────────────────────────

/// Secure-overwrite utility looked up on `$PATH`.
const SHRED_PROGRAM: &str = "shred";

/// Random passes requested from `shred`, followed by one zero pass.
const SHRED_PASSES: u32 = 7;

/// Buffer size for the in-process random overwrite.
const OVERWRITE_CHUNK: usize = 8192;

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// How a file was disposed of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EraseOutcome {
    /// `shred` overwrote and removed the file.
    Shredded,
    /// One random pass was written in-process before unlinking.
    Overwritten,
    /// The file was unlinked without any overwrite.
    Unlinked,
    /// The file did not exist.
    Missing,
}

impl EraseOutcome {
    /// True when the content may still be recoverable from the medium.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Unlinked)
    }
}

// ─── Eraser ──────────────────────────────────────────────────────────────────

/// In-process fallback used when `shred` is missing or fails.
type Overwrite = fn(&Path) -> io::Result<()>;

#[derive(Clone)]
pub struct Eraser {
    shred: Option<PathBuf>,
    passes: u32,
    overwrite: Overwrite,
}

impl Eraser {
    pub fn new() -> Self {
        Self {
            shred: Some(PathBuf::from(SHRED_PROGRAM)),
            passes: SHRED_PASSES,
            overwrite: overwrite_random,
        }
    }

    /// Use a specific secure-overwrite program instead of `shred` on `$PATH`.
    pub fn with_shred(program: impl Into<PathBuf>) -> Self {
        Self {
            shred: Some(program.into()),
            passes: SHRED_PASSES,
            overwrite: overwrite_random,
        }
    }

    /// Never spawn an external program; always overwrite in-process.
    pub fn without_shred() -> Self {
        Self {
            shred: None,
            passes: 0,
            overwrite: overwrite_random,
        }
    }

    #[cfg(test)]
    fn with_overwrite(mut self, overwrite: Overwrite) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Overwrite then remove `path`. Missing files are not an error.
    pub fn erase(&self, path: &Path) -> Result<EraseOutcome, StagingError> {
        match fs::symlink_metadata(path) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                // Symlinks and special files are unlinked, never written through.
                fs::remove_file(path).map_err(|source| StagingError::Remove {
                    path: path.to_path_buf(),
                    source,
                })?;
                return Ok(EraseOutcome::Unlinked);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(EraseOutcome::Missing),
            Err(e) => return Err(e.into()),
        }

        if let Some(program) = &self.shred {
            match self.run_shred(program, path) {
                Ok(()) if !path.exists() => return Ok(EraseOutcome::Shredded),
                Ok(()) => tracing::debug!("shred returned but left the file behind"),
                Err(e) => tracing::debug!(error = %e, "shred unavailable, using a single random pass"),
            }
        }

        let outcome = match (self.overwrite)(path) {
            Ok(()) => EraseOutcome::Overwritten,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Secure erase degraded: unlinking without overwrite"
                );
                EraseOutcome::Unlinked
            }
        };

        fs::remove_file(path).map_err(|source| StagingError::Remove {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(outcome)
    }

    fn run_shred(&self, program: &Path, path: &Path) -> io::Result<()> {
        let status = Command::new(program)
            .arg("--force")
            .arg(format!("--iterations={}", self.passes))
            .arg("--zero")
            .arg("--remove")
            .arg("--")
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;

        if status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!(
                "{} exited with {}",
                program.display(),
                status
            )))
        }
    }
}

impl fmt::Debug for Eraser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Eraser")
            .field("shred", &self.shred)
            .field("passes", &self.passes)
            .finish_non_exhaustive()
    }
}

impl Default for Eraser {
    fn default() -> Self {
        Self::new()
    }
}

fn overwrite_random(path: &Path) -> io::Result<()> {
    let len = fs::metadata(path)?.len();
    let mut file = OpenOptions::new().write(true).open(path)?;
    let mut rng = rand::rng();
    let mut chunk = vec![0u8; OVERWRITE_CHUNK];

    let mut remaining = len;
    while remaining > 0 {
        let n = remaining.min(OVERWRITE_CHUNK as u64) as usize;
        rng.fill_bytes(&mut chunk[..n]);
        file.write_all(&chunk[..n])?;
        remaining -= n as u64;
    }

    file.sync_all()
}

// ─── Tests ───────────────────────────────────────────────────────────────────
