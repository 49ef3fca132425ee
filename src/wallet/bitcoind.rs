// Wallet Vault - Bitcoin Core adapter
//
// Drives a running bitcoind through `bitcoin-cli`. Connection settings
// (network, datadir, cookie or rpcuser) come from the configured extra
// arguments and the user's bitcoin.conf. Descriptor imports are passed with
// `-stdin` so private keys never show up in the process table, and every
// response that may carry key material is held in a zeroizing buffer.

use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::Deserialize;
use serde_json::Value;
use zeroize::Zeroizing;

use crate::envelope::{DescriptorExport, DescriptorSet, ImportDescriptor};

use super::service::{WalletService, WalletTemplate};
use super::WalletError;

// Bitcoin Core RPC error codes the protocol distinguishes.
const RPC_WALLET_ERROR: i64 = -4;
const RPC_WALLET_NOT_FOUND: i64 = -18;
const RPC_IN_WARMUP: i64 = -28;
const RPC_WALLET_ALREADY_LOADED: i64 = -35;

/// One `bitcoin-cli` invocation.
struct RpcCall<'a> {
    method: &'static str,
    /// Wallet the call is about, for error messages.
    subject: Option<&'a str>,
    /// Route the call to the subject's wallet endpoint.
    scoped: bool,
    named: bool,
    params: Vec<String>,
    stdin: Option<Zeroizing<Vec<u8>>>,
}

impl<'a> RpcCall<'a> {
    fn new(method: &'static str) -> Self {
        Self {
            method,
            subject: None,
            scoped: false,
            named: false,
            params: Vec::new(),
            stdin: None,
        }
    }

    fn about(mut self, wallet: &'a str) -> Self {
        self.subject = Some(wallet);
        self
    }

    fn on_wallet(mut self, wallet: &'a str) -> Self {
        self.subject = Some(wallet);
        self.scoped = true;
        self
    }

    fn named(mut self) -> Self {
        self.named = true;
        self
    }

    fn param(mut self, value: impl Into<String>) -> Self {
        self.params.push(value.into());
        self
    }

    /// Extra arguments read by `bitcoin-cli -stdin`, one per line.
    fn stdin_param(mut self, value: Zeroizing<Vec<u8>>) -> Self {
        self.stdin = Some(value);
        self
    }
}

#[derive(Deserialize)]
struct ImportResult {
    success: bool,
    #[serde(default)]
    error: Option<Value>,
}

// ─── Adapter ─────────────────────────────────────────────────────────────────

pub struct BitcoinCli {
    program: PathBuf,
    base_args: Vec<String>,
}

impl BitcoinCli {
    pub fn new(program: impl Into<PathBuf>, base_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            base_args,
        }
    }

    /// Command-line arguments for a call, excluding the program itself.
    fn argv(&self, call: &RpcCall<'_>) -> Vec<String> {
        let mut argv = self.base_args.clone();
        if call.scoped {
            if let Some(wallet) = call.subject {
                argv.push(format!("-rpcwallet={wallet}"));
            }
        }
        if call.named {
            argv.push("-named".to_string());
        }
        if call.stdin.is_some() {
            argv.push("-stdin".to_string());
        }
        argv.push(call.method.to_string());
        argv.extend(call.params.iter().cloned());
        argv
    }

    fn run(&self, call: RpcCall<'_>) -> Result<Zeroizing<Vec<u8>>, WalletError> {
        tracing::debug!(method = call.method, wallet = ?call.subject, "bitcoin-cli");

        let mut cmd = Command::new(&self.program);
        cmd.args(self.argv(&call))
            .stdin(if call.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => WalletError::Unavailable(format!(
                "{} not found on PATH",
                self.program.display()
            )),
            _ => WalletError::Io(e),
        })?;

        let written = match (&call.stdin, child.stdin.take()) {
            (Some(input), Some(mut stdin)) => stdin
                .write_all(input)
                .and_then(|_| stdin.write_all(b"\n")),
            (Some(_), None) => Err(io::Error::other("bitcoin-cli stdin was not captured")),
            _ => Ok(()),
        };

        let output = child.wait_with_output()?;
        let stdout = Zeroizing::new(output.stdout);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(call.method, call.subject, &stderr));
        }
        written?;

        Ok(stdout)
    }

    fn run_json<T: for<'de> Deserialize<'de>>(&self, call: RpcCall<'_>) -> Result<T, WalletError> {
        let method = call.method;
        let stdout = self.run(call)?;
        serde_json::from_slice(&stdout).map_err(|source| WalletError::Response { method, source })
    }
}

impl WalletService for BitcoinCli {
    fn list_wallet_names(&self) -> Result<BTreeSet<String>, WalletError> {
        let names: Vec<String> = self.run_json(RpcCall::new("listwallets"))?;
        Ok(names.into_iter().collect())
    }

    fn create_wallet(&self, name: &str, template: WalletTemplate) -> Result<(), WalletError> {
        let blank = matches!(template, WalletTemplate::Blank);
        self.run(
            RpcCall::new("createwallet")
                .about(name)
                .named()
                .param(format!("wallet_name={name}"))
                .param("disable_private_keys=false")
                .param(format!("blank={blank}"))
                .param("descriptors=true"),
        )?;
        tracing::info!(wallet = %name, ?template, "Wallet created");
        Ok(())
    }

    fn unload_wallet(&self, name: &str) -> Result<(), WalletError> {
        self.run(RpcCall::new("unloadwallet").about(name).param(name))?;
        tracing::info!(wallet = %name, "Wallet unloaded");
        Ok(())
    }

    fn export_descriptors(&self, name: &str) -> Result<DescriptorExport, WalletError> {
        let wallet_metadata: Value = self.run_json(RpcCall::new("getwalletinfo").on_wallet(name))?;
        let descriptor_set: DescriptorSet =
            self.run_json(RpcCall::new("listdescriptors").on_wallet(name).param("true"))?;

        Ok(DescriptorExport {
            wallet_metadata,
            descriptor_set,
        })
    }

    fn import_descriptors(
        &self,
        name: &str,
        records: &[ImportDescriptor],
    ) -> Result<(), WalletError> {
        let request = serde_json::to_vec(records).map_err(|source| WalletError::Response {
            method: "importdescriptors",
            source,
        })?;

        let results: Vec<ImportResult> = self.run_json(
            RpcCall::new("importdescriptors")
                .on_wallet(name)
                .stdin_param(Zeroizing::new(request)),
        )?;

        check_import_results(&results, records.len())
    }

    fn get_balance(&self, name: &str) -> Option<String> {
        match self.run(RpcCall::new("getbalance").on_wallet(name)) {
            Ok(stdout) => {
                let text = String::from_utf8_lossy(&stdout).trim().to_string();
                is_decimal(&text).then_some(text)
            }
            Err(e) => {
                tracing::debug!(wallet = %name, error = %e, "Balance unavailable");
                None
            }
        }
    }
}

// ─── Response handling ───────────────────────────────────────────────────────

fn check_import_results(results: &[ImportResult], total: usize) -> Result<(), WalletError> {
    let failures: Vec<&ImportResult> = results.iter().filter(|r| !r.success).collect();

    if failures.is_empty() && results.len() == total {
        return Ok(());
    }

    let reason = failures
        .iter()
        .find_map(|r| r.error.as_ref())
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("{} results for {} requests", results.len(), total));

    Err(WalletError::ImportRejected {
        rejected: failures.len().max(total.saturating_sub(results.len())),
        total,
        reason,
    })
}

/// Map a failed `bitcoin-cli` run onto the error categories the protocol
/// acts on.
fn classify_failure(method: &'static str, wallet: Option<&str>, stderr: &str) -> WalletError {
    let lower = stderr.to_ascii_lowercase();
    let message = error_message(stderr);
    let wallet = wallet.unwrap_or_default().to_string();

    if lower.contains("could not connect")
        || lower.contains("couldn't connect")
        || lower.contains("connection refused")
        || lower.contains("incorrect rpcuser or rpcpassword")
    {
        return WalletError::Unavailable(message);
    }

    match error_code(stderr) {
        Some(RPC_IN_WARMUP) => WalletError::Unavailable(message),
        Some(RPC_WALLET_NOT_FOUND) => WalletError::NotLoaded(wallet),
        Some(RPC_WALLET_ALREADY_LOADED) => WalletError::AlreadyLoaded(wallet),
        Some(RPC_WALLET_ERROR) if lower.contains("already exists") => {
            WalletError::AlreadyLoaded(wallet)
        }
        code => WalletError::Rpc {
            method,
            code,
            message,
        },
    }
}

/// `error code: -18` as printed by bitcoin-cli.
fn error_code(stderr: &str) -> Option<i64> {
    stderr
        .lines()
        .find_map(|line| line.trim().strip_prefix("error code:"))
        .and_then(|code| code.trim().parse().ok())
}

/// The text after `error message:`, or the whole of stderr.
fn error_message(stderr: &str) -> String {
    match stderr.split_once("error message:") {
        Some((_, message)) => message.trim().replace('\n', " "),
        None => stderr.trim().to_string(),
    }
}

fn is_decimal(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == '-')
}

// ─── Tests ───────────────────────────────────────────────────────────────────
