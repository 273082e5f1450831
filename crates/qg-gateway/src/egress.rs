//! Egress routes.
//!
//! A route is a local forward proxy (`http://localhost:<port>`) fronting a
//! tunnel with its own public address. Between attempts the gateway asks an
//! [`EgressStrategy`] to tear the tunnel down and bring it back up.

use std::path::PathBuf;
use std::process::Stdio;

use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{GatewayError, GatewayResult};
use crate::transport::BoxFuture;

/// One named egress tunnel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EgressRoute {
    /// Human-readable location, passed to the recycle command.
    pub name: String,
    /// Local port the tunnel's proxy listens on.
    pub port: u16,
    /// Tunnel identity or configuration file.
    #[serde(default)]
    pub identity: String,
}

impl EgressRoute {
    pub fn new(name: impl Into<String>, port: u16, identity: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            port,
            identity: identity.into(),
        }
    }

    /// Base URL for requests sent through this route.
    pub fn base_url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }
}

/// Re-establishes a route's tunnel.
pub trait EgressStrategy: Send + Sync {
    fn recycle<'a>(&'a self, route: &'a EgressRoute) -> BoxFuture<'a, GatewayResult<()>>;
}

/// Routes that need no re-establishment.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticEgress;

impl EgressStrategy for StaticEgress {
    fn recycle<'a>(&'a self, _route: &'a EgressRoute) -> BoxFuture<'a, GatewayResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

/// Runs an external command to rebuild a tunnel.
///
/// Invoked as `<program> <args...> <name> <identity> <port>`, with
/// `identity` resolved against `workdir` when it is relative.
#[derive(Debug, Clone)]
pub struct CommandEgress {
    program: String,
    args: Vec<String>,
    workdir: Option<PathBuf>,
}

impl CommandEgress {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            workdir: None,
        }
    }

    #[must_use]
    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(workdir.into());
        self
    }

    fn identity_arg(&self, route: &EgressRoute) -> String {
        match &self.workdir {
            Some(dir) if !route.identity.is_empty() => {
                dir.join(&route.identity).to_string_lossy().into_owned()
            }
            _ => route.identity.clone(),
        }
    }
}

impl EgressStrategy for CommandEgress {
    fn recycle<'a>(&'a self, route: &'a EgressRoute) -> BoxFuture<'a, GatewayResult<()>> {
        Box::pin(async move {
            let mut cmd = Command::new(&self.program);
            cmd.args(&self.args)
                .arg(&route.name)
                .arg(self.identity_arg(route))
                .arg(route.port.to_string())
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::piped())
                .kill_on_drop(true);
            if let Some(dir) = &self.workdir {
                cmd.current_dir(dir);
            }

            debug!(route = %route.name, program = %self.program, "Recycling egress route");

            let output = cmd.output().await.map_err(|e| GatewayError::Egress {
                route: route.name.clone(),
                reason: format!("failed to spawn {}: {e}", self.program),
            })?;

            if output.status.success() {
                Ok(())
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                warn!(
                    route = %route.name,
                    status = %output.status,
                    stderr = %stderr.trim(),
                    "Egress recycle command failed"
                );
                Err(GatewayError::Egress {
                    route: route.name.clone(),
                    reason: format!("command exited with {}", output.status),
                })
            }
        })
    }
}

/// Egress strategy for testing: records recycled route names and optionally
/// fails.
#[derive(Debug, Default)]
pub struct RecordingEgress {
    recycled: parking_lot::Mutex<Vec<String>>,
    fail: std::sync::atomic::AtomicBool,
}

impl RecordingEgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    /// Route names recycled so far, in order.
    pub fn recycled(&self) -> Vec<String> {
        self.recycled.lock().clone()
    }
}

impl EgressStrategy for RecordingEgress {
    fn recycle<'a>(&'a self, route: &'a EgressRoute) -> BoxFuture<'a, GatewayResult<()>> {
        Box::pin(async move {
            self.recycled.lock().push(route.name.clone());
            if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(GatewayError::Egress {
                    route: route.name.clone(),
                    reason: "recycle refused".to_string(),
                });
            }
            Ok(())
        })
    }
}
