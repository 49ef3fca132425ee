// Wallet Vault - Envelope data models
//
// SECURITY: descriptor strings may embed private keys. They are redacted
// from Debug output and zeroized when a record is dropped.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use zeroize::{Zeroize, Zeroizing};

use super::EnvelopeError;

/// Format identifier written into every new envelope.
pub const SCHEMA_VERSION: &str = "1";

/// Largest envelope accepted from outside the secret store. Real wallets
/// stay far below this even with thousands of descriptors.
pub const MAX_ENVELOPE_BYTES: usize = 8 * 1024 * 1024;

// ─── Descriptor fields ───────────────────────────────────────────────────────

/// Birth time of a descriptor: a Unix timestamp, or "now" for keys with no
/// history worth rescanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DescriptorTimestamp {
    Unix(u64),
    Marker(TimestampMarker),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampMarker {
    #[serde(rename = "now")]
    Now,
}

impl DescriptorTimestamp {
    pub const NOW: Self = Self::Marker(TimestampMarker::Now);
}

/// Derivation index bounds: `[low, high]`, or a single end index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DescriptorRange {
    Span(u64, u64),
    Fixed(u64),
}

// ─── Descriptor Record ───────────────────────────────────────────────────────

/// One descriptor as exported by the wallet service and kept in storage.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawDescriptorRecord")]
pub struct DescriptorRecord {
    #[serde(rename = "desc")]
    pub descriptor: String,
    pub timestamp: DescriptorTimestamp,
    pub active: bool,
    pub internal: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<DescriptorRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_index: Option<u64>,
}

/// Wire shape accepted on read. Older wallet-service releases call the
/// index `next`; newer ones send both spellings.
#[derive(Deserialize)]
struct RawDescriptorRecord {
    #[serde(alias = "descriptor")]
    desc: String,
    timestamp: DescriptorTimestamp,
    #[serde(default)]
    active: bool,
    #[serde(default)]
    internal: bool,
    #[serde(default)]
    range: Option<DescriptorRange>,
    #[serde(default)]
    next_index: Option<u64>,
    #[serde(default)]
    next: Option<u64>,
}

impl From<RawDescriptorRecord> for DescriptorRecord {
    fn from(raw: RawDescriptorRecord) -> Self {
        Self {
            descriptor: raw.desc,
            timestamp: raw.timestamp,
            active: raw.active,
            internal: raw.internal,
            range: raw.range,
            next_index: raw.next_index.or(raw.next),
        }
    }
}

impl Drop for DescriptorRecord {
    fn drop(&mut self) {
        self.descriptor.zeroize();
    }
}

impl fmt::Debug for DescriptorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorRecord")
            .field("descriptor", &"[REDACTED]")
            .field("timestamp", &self.timestamp)
            .field("active", &self.active)
            .field("internal", &self.internal)
            .field("range", &self.range)
            .field("next_index", &self.next_index)
            .finish()
    }
}

/// A descriptor in the shape the wallet service's bulk import expects.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct ImportDescriptor {
    #[serde(rename = "desc")]
    pub descriptor: String,
    pub timestamp: DescriptorTimestamp,
    pub active: bool,
    pub internal: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<DescriptorRange>,
    /// Carries the stored `next_index` under the import request's field name.
    #[serde(rename = "next_index", skip_serializing_if = "Option::is_none")]
    pub next_unused: Option<u64>,
}

impl Drop for ImportDescriptor {
    fn drop(&mut self) {
        self.descriptor.zeroize();
    }
}

impl fmt::Debug for ImportDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportDescriptor")
            .field("descriptor", &"[REDACTED]")
            .field("timestamp", &self.timestamp)
            .field("active", &self.active)
            .field("internal", &self.internal)
            .field("range", &self.range)
            .field("next_unused", &self.next_unused)
            .finish()
    }
}

impl From<&ImportDescriptor> for DescriptorRecord {
    fn from(record: &ImportDescriptor) -> Self {
        Self {
            descriptor: record.descriptor.clone(),
            timestamp: record.timestamp,
            active: record.active,
            internal: record.internal,
            range: record.range,
            next_index: record.next_unused,
        }
    }
}

// ─── Descriptor Set ──────────────────────────────────────────────────────────

/// The wallet service's descriptor listing, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_name: Option<String>,
    pub descriptors: Vec<DescriptorRecord>,
}

/// Everything the wallet service hands over for one backup.
#[derive(Debug, Clone)]
pub struct DescriptorExport {
    /// Opaque wallet info, stored and reproduced without interpretation.
    pub wallet_metadata: Value,
    pub descriptor_set: DescriptorSet,
}

// ─── Envelope ────────────────────────────────────────────────────────────────

/// The stored backup unit.
#[derive(Clone, Serialize)]
pub struct Envelope {
    pub schema_version: String,
    pub wallet_name: String,
    /// Seconds since the Unix epoch, set once at backup time.
    pub created_at: i64,
    pub wallet_metadata: Value,
    pub descriptor_set: DescriptorSet,
}

#[derive(Deserialize)]
struct RawEnvelope {
    schema_version: String,
    wallet_name: String,
    created_at: i64,
    #[serde(default)]
    wallet_metadata: Value,
    #[serde(default)]
    descriptor_set: Option<DescriptorSet>,
}

impl Envelope {
    /// Parse stored or exported bytes. Shape errors are reported; the
    /// non-empty rule is left to `verify()`.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        let raw: RawEnvelope = serde_json::from_slice(bytes)?;
        let descriptor_set = raw
            .descriptor_set
            .ok_or(EnvelopeError::MissingDescriptorSet)?;

        if raw.schema_version != SCHEMA_VERSION {
            tracing::warn!(
                schema_version = %raw.schema_version,
                expected = SCHEMA_VERSION,
                "Envelope has an unrecognised schema version"
            );
        }

        Ok(Self {
            schema_version: raw.schema_version,
            wallet_name: raw.wallet_name,
            created_at: raw.created_at,
            wallet_metadata: raw.wallet_metadata,
            descriptor_set,
        })
    }

    /// Parse and apply the structural verification policy in one step.
    pub fn parse_verified(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        let envelope = Self::from_slice(bytes)?;
        envelope.verify()?;
        Ok(envelope)
    }

    /// Structural check: at least one descriptor. Returns the count.
    pub fn verify(&self) -> Result<usize, EnvelopeError> {
        match self.descriptor_set.descriptors.len() {
            0 => Err(EnvelopeError::EmptyDescriptorSet),
            n => Ok(n),
        }
    }

    pub fn descriptor_count(&self) -> usize {
        self.descriptor_set.descriptors.len()
    }

    /// Serialize as pretty JSON into a buffer that is wiped on drop.
    pub fn to_bytes(&self) -> Result<Zeroizing<Vec<u8>>, EnvelopeError> {
        Ok(Zeroizing::new(serde_json::to_vec_pretty(self)?))
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("schema_version", &self.schema_version)
            .field("wallet_name", &self.wallet_name)
            .field("created_at", &self.created_at)
            .field("descriptors", &self.descriptor_count())
            .finish()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
