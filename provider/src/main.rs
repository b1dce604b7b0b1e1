// provider/src/main.rs

use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::process::ExitCode;

use clap::Parser;
use tokio::net::UnixListener;
use tokio::sync::watch;
use tokio_stream::wrappers::UnixListenerStream;
use tonic::transport::Server;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod framework;
mod plugin;
mod provider;
mod resources;
mod server;

use crate::config::{Args, ProviderConfig};
use crate::error::BootstrapError;
use crate::plugin::go_plugin::grpc_controller_server::GrpcControllerServer;
use crate::plugin::health::health_server::HealthServer;
use crate::plugin::{PluginController, PluginHealth};
use crate::server::tfplugin6::provider_server::ProviderServer;
use crate::server::EphemeralUtilsProvider;

#[tokio::main]
async fn main() -> ExitCode {
    // ==============================================================================
    // 1. Configuration & Handshake
    // ==============================================================================

    let config = match ProviderConfig::load(Args::parse()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.log_filter);

    if let Err(e) = config.verify_handshake() {
        match e {
            BootstrapError::MissingMagicCookie => eprintln!("{}", plugin::NOT_LAUNCHED_BY_TERRAFORM),
            other => error!(error = %other, "handshake rejected"),
        }
        return ExitCode::FAILURE;
    }

    match serve(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "provider stopped with an error");
            ExitCode::FAILURE
        }
    }
}

/// Structured JSON logs on stderr. Terraform captures provider stderr into
/// its own log; stdout is reserved for the handshake.
fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn serve(config: ProviderConfig) -> Result<(), BootstrapError> {
    // ==============================================================================
    // 2. Secure Socket Initialization
    // ==============================================================================

    // A fresh directory per process; it is removed when `socket_dir` drops.
    fs::create_dir_all(&config.socket_dir)?;
    let socket_dir = tempfile::Builder::new()
        .prefix("plugin")
        .tempdir_in(&config.socket_dir)?;
    let socket_path = socket_dir.path().join("provider.sock");

    let uds = UnixListener::bind(&socket_path)?;

    // 🛡️ SECURITY BOUNDARY: only the user running Terraform may connect.
    // Plans and applies carry write-only values in plaintext.
    let mut perms = fs::metadata(&socket_path)?.permissions();
    perms.set_mode(0o600);
    fs::set_permissions(&socket_path, perms)?;

    let uds_stream = UnixListenerStream::new(uds);

    if config.client_cert_present && !config.debug {
        warn!(
            "Terraform requested AutoMTLS, which this provider does not implement; \
             set TF_DISABLE_PLUGIN_TLS=1 or start the provider with --debug"
        );
    }

    // ==============================================================================
    // 3. Announce & Serve
    // ==============================================================================

    {
        let mut stdout = std::io::stdout().lock();
        if config.debug {
            let reattach = plugin::reattach_value(&config.provider_address, &socket_path, std::process::id())?;
            writeln!(
                stdout,
                "Provider started. To attach Terraform CLI, set the TF_REATTACH_PROVIDERS environment variable with the following:\n\n\tTF_REATTACH_PROVIDERS='{}'\n",
                reattach
            )?;
        } else {
            writeln!(stdout, "{}", plugin::handshake_line(&socket_path))?;
        }
        stdout.flush()?;
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let provider = EphemeralUtilsProvider::new(config.version.clone());

    info!(
        socket = %socket_path.display(),
        version = %config.version,
        debug = config.debug,
        "ephemeral-utils provider serving"
    );

    Server::builder()
        .add_service(ProviderServer::new(provider))
        .add_service(GrpcControllerServer::new(PluginController::new(shutdown_tx)))
        .add_service(HealthServer::new(PluginHealth))
        .serve_with_incoming_shutdown(uds_stream, shutdown_signal(shutdown_rx, config.debug))
        .await?;

    info!("provider shut down");
    drop(socket_dir);
    Ok(())
}

/// Resolves when Terraform asks the plugin to stop. Under Terraform an
/// interrupt is Terraform's to handle, so SIGINT is only honoured in debug mode.
async fn shutdown_signal(mut shutdown_rx: watch::Receiver<bool>, debug: bool) {
    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    return;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                if debug {
                    info!("interrupt received, stopping");
                    return;
                }
                info!("interrupt received, waiting for Terraform to stop the provider");
            }
        }
    }
}
