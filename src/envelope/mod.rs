// Wallet Vault - Envelope Module
//
// The backup envelope is the only at-rest format: wallet metadata plus the
// descriptor set exported from the wallet service, stored as JSON. This
// module also converts stored descriptors into wallet-service import requests.

mod error;
mod models;
mod transcode;

pub use error::EnvelopeError;
pub use models::{
    DescriptorExport, DescriptorRange, DescriptorRecord, DescriptorSet, DescriptorTimestamp,
    Envelope, ImportDescriptor, TimestampMarker, MAX_ENVELOPE_BYTES, SCHEMA_VERSION,
};
pub use transcode::{content_digest, to_import_shape, to_storage_shape};
