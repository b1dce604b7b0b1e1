// provider/src/error.rs

use thiserror::Error;

use crate::plugin::{APP_PROTOCOL_VERSION, MAGIC_COOKIE_KEY};

/// Failures while starting the plugin process. Anything past the handshake
/// is reported to Terraform as diagnostics instead.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("{} is missing or does not match; the provider must be launched by Terraform", MAGIC_COOKIE_KEY)]
    MissingMagicCookie,

    #[error("Terraform offered plugin protocol versions {offered:?}, this provider only speaks version {}", APP_PROTOCOL_VERSION)]
    UnsupportedProtocol { offered: Vec<u32> },

    #[error("invalid plugin protocol version {0:?}")]
    InvalidProtocolVersion(String),

    #[error("plugin socket setup failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode reattach configuration: {0}")]
    Reattach(#[from] serde_json::Error),

    #[error("gRPC server failed: {0}")]
    Transport(#[from] tonic::transport::Error),
}
