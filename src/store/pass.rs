// Wallet Vault - pass(1) backed secret store
//
// Every entry is a GnuPG-encrypted file `<store_dir>/<path>.gpg`. Blobs go in
// through `pass insert --multiline` on stdin and come out of `pass show` on
// stdout, streamed straight into the caller's writer. Existence checks and
// listings read the directory tree, so they never trigger a decryption.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};

use super::repository::BackupStore;
use super::StoreError;

/// Extension pass(1) gives every encrypted entry.
const ENTRY_EXTENSION: &str = "gpg";

pub struct PassStore {
    program: PathBuf,
    store_dir: PathBuf,
}

impl PassStore {
    pub fn new(program: impl Into<PathBuf>, store_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            store_dir: store_dir.into(),
        }
    }

    pub fn store_dir(&self) -> &Path {
        &self.store_dir
    }

    fn entry_file(&self, path: &str) -> PathBuf {
        self.store_dir.join(format!("{path}.{ENTRY_EXTENSION}"))
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.env("PASSWORD_STORE_DIR", &self.store_dir);
        cmd
    }

    fn spawn(&self, cmd: &mut Command) -> Result<Child, StoreError> {
        cmd.spawn().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::Unavailable(format!(
                "{} not found on PATH",
                self.program.display()
            )),
            _ => StoreError::Io(e),
        })
    }

    fn check(command: &'static str, path: &str, output: &Output) -> Result<(), StoreError> {
        if output.status.success() {
            return Ok(());
        }
        Err(StoreError::Command {
            command,
            path: path.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

impl BackupStore for PassStore {
    fn exists(&self, path: &str) -> Result<bool, StoreError> {
        Ok(self.entry_file(path).is_file())
    }

    fn put(&self, path: &str, contents: &mut dyn Read) -> Result<(), StoreError> {
        tracing::debug!(entry = %path, "pass insert");
        let mut child = self.spawn(
            self.command()
                .args(["insert", "--multiline", "--force", path])
                .stdin(Stdio::piped())
                .stdout(Stdio::null())
                .stderr(Stdio::piped()),
        )?;

        let copied = match child.stdin.take() {
            Some(mut stdin) => io::copy(contents, &mut stdin).map(|_| ()),
            None => Err(io::Error::other("pass stdin was not captured")),
        };

        // Always reap the child, then prefer its diagnosis over a broken pipe.
        let output = child.wait_with_output()?;
        Self::check("insert", path, &output)?;

        // pass saw EOF early and stored whatever arrived.
        copied.map_err(|source| StoreError::PartialWrite {
            path: path.to_string(),
            source,
        })
    }

    fn get(&self, path: &str, sink: &mut dyn Write) -> Result<(), StoreError> {
        if !self.exists(path)? {
            return Err(StoreError::NotFound(path.to_string()));
        }

        tracing::debug!(entry = %path, "pass show");
        let mut child = self.spawn(
            self.command()
                .args(["show", path])
                .stdout(Stdio::piped())
                .stderr(Stdio::piped()),
        )?;

        let copied = match child.stdout.take() {
            Some(mut stdout) => io::copy(&mut stdout, sink).map(|_| ()),
            None => Err(io::Error::other("pass stdout was not captured")),
        };

        let output = child.wait_with_output()?;
        Self::check("show", path, &output)?;
        copied?;
        sink.flush()?;
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<(), StoreError> {
        tracing::debug!(entry = %path, "pass rm");
        let child = self.spawn(
            self.command()
                .args(["rm", "--force", path])
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::piped()),
        )?;

        let output = child.wait_with_output()?;
        Self::check("rm", path, &output)
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let dir = self.store_dir.join(prefix);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::Io(e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if let Some(name) = file_name.strip_suffix(&format!(".{ENTRY_EXTENSION}")) {
                names.push(name.to_string());
            }
        }
        names.sort();

        Ok(names)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
