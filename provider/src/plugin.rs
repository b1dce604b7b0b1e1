// provider/src/plugin.rs
//
// go-plugin side of the process: the handshake Terraform reads from stdout,
// the debug-mode reattach line, and the controller/health services every
// go-plugin server exposes next to the provider service.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tokio::sync::watch;
use tonic::{Request, Response, Status};
use tracing::info;

pub mod go_plugin {
    tonic::include_proto!("plugin");
}

pub mod health {
    tonic::include_proto!("grpc.health.v1");
}

use go_plugin::grpc_controller_server::GrpcController;
use go_plugin::Empty;
use health::health_check_response::ServingStatus;
use health::health_server::Health;
use health::{HealthCheckRequest, HealthCheckResponse};

pub const MAGIC_COOKIE_KEY: &str = "TF_PLUGIN_MAGIC_COOKIE";
pub const MAGIC_COOKIE_VALUE: &str =
    "d602bf8f470bc67ca7faa0386276bbdd4330efaf76d1a219cb4d6991ca9872b2";

/// go-plugin's own protocol version.
pub const CORE_PROTOCOL_VERSION: u32 = 1;
/// Terraform plugin protocol major version served.
pub const APP_PROTOCOL_VERSION: u32 = 6;

/// Name go-plugin health-checks.
const HEALTH_SERVICE_NAME: &str = "plugin";

/// Printed when the binary is run by hand instead of by Terraform.
pub const NOT_LAUNCHED_BY_TERRAFORM: &str = "This binary is a plugin. These are not meant to be \
executed directly.\nPlease execute the program that consumes these plugins, which will load any \
plugins automatically";

/// `CORE|APP|NETWORK|ADDR|PROTOCOL`, the single stdout line Terraform waits for.
pub fn handshake_line(socket_path: &Path) -> String {
    format!(
        "{}|{}|unix|{}|grpc",
        CORE_PROTOCOL_VERSION,
        APP_PROTOCOL_VERSION,
        socket_path.display()
    )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ReattachConfig {
    protocol: &'static str,
    protocol_version: u32,
    pid: u32,
    test: bool,
    addr: ReattachAddr,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ReattachAddr {
    network: &'static str,
    string: String,
}

/// The `TF_REATTACH_PROVIDERS` value for a provider started with `--debug`.
pub fn reattach_value(
    provider_address: &str,
    socket_path: &Path,
    pid: u32,
) -> Result<String, serde_json::Error> {
    let config = ReattachConfig {
        protocol: "grpc",
        protocol_version: APP_PROTOCOL_VERSION,
        pid,
        test: true,
        addr: ReattachAddr {
            network: "unix",
            string: socket_path.display().to_string(),
        },
    };

    serde_json::to_string(&BTreeMap::from([(provider_address, config)]))
}

/// Handles `plugin.GRPCController/Shutdown` by flipping the shutdown signal
/// the server loop waits on.
pub struct PluginController {
    shutdown_tx: watch::Sender<bool>,
}

impl PluginController {
    pub fn new(shutdown_tx: watch::Sender<bool>) -> Self {
        Self { shutdown_tx }
    }
}

#[tonic::async_trait]
impl GrpcController for PluginController {
    async fn shutdown(&self, _request: Request<Empty>) -> Result<Response<Empty>, Status> {
        info!("shutdown requested by Terraform");
        // The receiver is gone only if the server already stopped.
        let _ = self.shutdown_tx.send(true);
        Ok(Response::new(Empty {}))
    }
}

pub struct PluginHealth;

#[tonic::async_trait]
impl Health for PluginHealth {
    async fn check(
        &self,
        request: Request<HealthCheckRequest>,
    ) -> Result<Response<HealthCheckResponse>, Status> {
        let service = request.into_inner().service;
        if !service.is_empty() && service != HEALTH_SERVICE_NAME {
            return Err(Status::not_found(format!("unknown service {}", service)));
        }

        Ok(Response::new(HealthCheckResponse {
            status: ServingStatus::Serving as i32,
        }))
    }
}
