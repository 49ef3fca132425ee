// Wallet Vault - Envelope error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("Envelope is not valid JSON of the expected shape: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Envelope has no descriptor_set")]
    MissingDescriptorSet,

    #[error("Envelope descriptor_set contains no descriptors")]
    EmptyDescriptorSet,
}
