// Wallet Vault - Operation reports
//
// What each operation did, for the command surface to render. None of these
// carry key material.

use std::io;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupReport {
    pub wallet: String,
    /// Secret-store path the verified envelope lives at.
    pub entry: String,
    pub descriptors: usize,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    pub source: String,
    pub target: String,
    pub descriptors: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub wallet: String,
    pub path: PathBuf,
    pub descriptors: usize,
}

/// Result of one best-effort DESTROY step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Nothing to do at this location.
    Skipped,
    Done,
    Failed(String),
}

impl StepOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestroyReport {
    pub wallet: String,
    /// False when the user declined; no step ran.
    pub confirmed: bool,
    pub unload: StepOutcome,
    pub delete: StepOutcome,
}

impl DestroyReport {
    pub fn is_complete(&self) -> bool {
        self.confirmed && !self.unload.is_failed() && !self.delete.is_failed()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedWallet {
    pub name: String,
    pub balance: Option<String>,
    pub backed_up: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    /// Wallet names with an entry under the store prefix, sorted.
    pub backups: Vec<String>,
    /// `None` when the wallet service could not be reached.
    pub loaded: Option<Vec<LoadedWallet>>,
}

/// Asks the user to affirm a destructive action.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> io::Result<bool>;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> io::Result<bool>,
{
    fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        self(prompt)
    }
}
