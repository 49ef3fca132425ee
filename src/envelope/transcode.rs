// Wallet Vault - Descriptor transcoding
//
// Storage direction wraps the wallet service's export verbatim. Import
// direction maps each stored record onto the bulk-import request, one to
// one and in order.

use serde_json::Value;
use sha2::{Digest, Sha256};

use super::models::{DescriptorSet, Envelope, ImportDescriptor};
use super::EnvelopeError;

/// Wrap a descriptor export into a storage envelope. No field is renamed.
pub fn to_storage_shape(
    wallet_metadata: Value,
    descriptor_set: DescriptorSet,
    version: &str,
    name: &str,
    now: i64,
) -> Envelope {
    Envelope {
        schema_version: version.to_string(),
        wallet_name: name.to_string(),
        created_at: now,
        wallet_metadata,
        descriptor_set,
    }
}

/// Build the bulk-import request for a stored descriptor set.
pub fn to_import_shape(set: &DescriptorSet) -> Result<Vec<ImportDescriptor>, EnvelopeError> {
    if set.descriptors.is_empty() {
        return Err(EnvelopeError::EmptyDescriptorSet);
    }

    Ok(set
        .descriptors
        .iter()
        .map(|record| ImportDescriptor {
            descriptor: record.descriptor.clone(),
            timestamp: record.timestamp,
            active: record.active,
            internal: record.internal,
            range: record.range,
            next_unused: record.next_index,
        })
        .collect())
}

/// SHA-256 over the content with trailing whitespace removed. The secret
/// store may append a newline on write; nothing else may differ.
pub fn content_digest(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes.trim_ascii_end()).into()
}

// ─── Tests ───────────────────────────────────────────────────────────────────
