//! Binary wire format for [`SyncMessage`].

use super::SyncMessage;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("failed to encode sync message: {0}")]
    Encode(#[source] bincode::Error),

    #[error("failed to decode sync message: {0}")]
    Decode(#[source] bincode::Error),
}

pub fn encode(message: &SyncMessage) -> Result<Vec<u8>, CodecError> {
    bincode::serialize(message).map_err(CodecError::Encode)
}

pub fn decode(bytes: &[u8]) -> Result<SyncMessage, CodecError> {
    bincode::deserialize(bytes).map_err(CodecError::Decode)
}
