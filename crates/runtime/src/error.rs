//! Unified error types surfaced by the runtime API.
//!
//! Wraps engine, codec and transport failures so callers can bubble them up
//! with consistent context.
use status_core::sync::CodecError;
use status_core::{EffectError, Endpoint, PeerId};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Effect(#[from] EffectError),

    #[error("sync message codec failed")]
    Codec(#[from] CodecError),

    #[error("transport of {endpoint:?} closed")]
    TransportClosed { endpoint: Endpoint },

    #[error("{peer} is not part of this session")]
    UnknownPeer { peer: PeerId },

    #[error("singleplayer engines have no network endpoint")]
    NotNetworked,
}
