// provider/src/config.rs

use std::env;
use std::path::PathBuf;

use clap::Parser;

use crate::error::BootstrapError;
use crate::plugin::{APP_PROTOCOL_VERSION, MAGIC_COOKIE_VALUE};

pub const DEFAULT_PROVIDER_ADDRESS: &str = "registry.terraform.io/local/ephemeral-utils";

#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// Run unmanaged and print TF_REATTACH_PROVIDERS instead of the go-plugin handshake.
    #[arg(long)]
    pub debug: bool,

    /// Provider source address Terraform should map to this process in debug mode.
    #[arg(long, default_value = DEFAULT_PROVIDER_ADDRESS)]
    pub provider_address: String,
}

#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub debug: bool,
    pub provider_address: String,
    pub version: String,

    // 🛡️ go-plugin handshake inputs
    pub magic_cookie: Option<String>,
    pub protocol_versions: Option<Vec<u32>>,
    pub client_cert_present: bool,

    /// Parent directory for the per-process socket directory.
    pub socket_dir: PathBuf,
    /// tracing-subscriber filter directive.
    pub log_filter: String,
}

impl ProviderConfig {
    pub fn load(args: Args) -> Result<Self, BootstrapError> {
        Self::from_lookup(args, |key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary environment lookup.
    pub fn from_lookup<F>(args: Args, lookup: F) -> Result<Self, BootstrapError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let protocol_versions = lookup("PLUGIN_PROTOCOL_VERSIONS")
            .map(|raw| parse_protocol_versions(&raw))
            .transpose()?;

        // Same lookup order as go-plugin: explicit socket dir, then the system temp dir.
        let socket_dir = lookup("PLUGIN_UNIX_SOCKET_DIR")
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(env::temp_dir);

        let log_filter = log_filter(lookup("TF_LOG_PROVIDER").or_else(|| lookup("TF_LOG")).as_deref());

        Ok(Self {
            debug: args.debug,
            provider_address: args.provider_address,
            version: env!("CARGO_PKG_VERSION").to_string(),
            magic_cookie: lookup(crate::plugin::MAGIC_COOKIE_KEY),
            protocol_versions,
            client_cert_present: lookup("PLUGIN_CLIENT_CERT").is_some_and(|c| !c.is_empty()),
            socket_dir,
            log_filter,
        })
    }

    /// Confirms Terraform launched this process and speaks our protocol.
    /// Debug mode has no launching Terraform, so there is nothing to check.
    pub fn verify_handshake(&self) -> Result<(), BootstrapError> {
        if self.debug {
            return Ok(());
        }

        if self.magic_cookie.as_deref() != Some(MAGIC_COOKIE_VALUE) {
            return Err(BootstrapError::MissingMagicCookie);
        }

        match &self.protocol_versions {
            Some(offered) if !offered.contains(&APP_PROTOCOL_VERSION) => {
                Err(BootstrapError::UnsupportedProtocol {
                    offered: offered.clone(),
                })
            }
            _ => Ok(()),
        }
    }
}

fn parse_protocol_versions(raw: &str) -> Result<Vec<u32>, BootstrapError> {
    raw.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| {
            v.parse::<u32>()
                .map_err(|_| BootstrapError::InvalidProtocolVersion(v.to_string()))
        })
        .collect()
}

/// Maps Terraform's TF_LOG levels onto a tracing filter. Without TF_LOG
/// Terraform discards provider output, so only warnings are emitted.
fn log_filter(tf_log: Option<&str>) -> String {
    let level = match tf_log.map(|l| l.trim().to_ascii_uppercase()).as_deref() {
        Some("TRACE") | Some("JSON") => "trace",
        Some("DEBUG") => "debug",
        Some("INFO") => "info",
        Some("ERROR") => "error",
        Some("OFF") => "off",
        _ => "warn",
    };
    level.to_string()
}
