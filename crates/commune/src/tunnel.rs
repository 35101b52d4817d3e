//! SSH port forwarding to a remote database.
//!
//! When `USE_SSH_TUNNEL` is enabled, the server starts an `ssh -N -L` child
//! process that forwards a free local port to the remote database and
//! connects through it. The [`TunnelGuard`] owns the child process: it is
//! closed explicitly on shutdown and killed on drop on every other exit path.
//! Any failure to establish the tunnel falls back to the direct database
//! endpoint.

use std::{
    env,
    net::{Ipv4Addr, SocketAddr, TcpListener as StdTcpListener},
    process::Stdio,
    time::Duration,
};

use serde::Serialize;
use thiserror::Error;
use tokio::{
    io::AsyncReadExt,
    net::TcpStream,
    process::{Child, Command},
    time::{sleep, Instant},
};

use crate::config::DatabaseEndpoint;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Tunnel parameters loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelConfig {
    pub enabled: bool,
    pub ssh_host: String,
    pub ssh_port: u16,
    pub ssh_user: String,
    pub ssh_password: Option<String>,
    pub ssh_key_file: Option<String>,
    pub ssh_passphrase: Option<String>,
    pub remote_db_host: String,
    pub remote_db_port: u16,
    /// How long to wait for the forwarded port to accept connections.
    pub connect_timeout: Duration,
}

/// How the tunnel authenticates against the SSH server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SshAuth {
    Password(String),
    KeyFile {
        path: String,
        passphrase: Option<String>,
    },
}

#[derive(Debug, Error)]
pub enum TunnelError {
    #[error("SSH host or username not provided")]
    MissingTarget,

    #[error("no SSH authentication method provided")]
    MissingCredentials,

    #[error("no free local port: {0}")]
    NoFreePort(std::io::Error),

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: &'static str,
        source: std::io::Error,
    },

    #[error("ssh exited with {status}: {stderr}")]
    Exited {
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("forwarded port not ready after {0:?}")]
    Timeout(Duration),
}

/// Serializable view of the tunnel for the health endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TunnelStatus {
    pub active: bool,
    pub local_bind_address: Option<String>,
    pub remote_bind_address: Option<String>,
}

impl TunnelConfig {
    /// Load tunnel configuration from environment variables.
    ///
    /// Environment variables:
    /// - `USE_SSH_TUNNEL` - Enable the tunnel ("True", "true" or "1")
    /// - `SSH_HOST`, `SSH_PORT` (default: 22), `SSH_USER`
    /// - `SSH_PASSWORD` - Password authentication (takes precedence)
    /// - `SSH_KEY_FILE`, `SSH_PASSPHRASE` - Key authentication
    /// - `REMOTE_DB_HOST` (default: "localhost"), `REMOTE_DB_PORT` (default: 5432)
    /// - `SSH_CONNECT_TIMEOUT_SECS` (default: 10)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            enabled: lookup("USE_SSH_TUNNEL")
                .is_some_and(|v| v.eq_ignore_ascii_case("true") || v == "1"),
            ssh_host: non_empty("SSH_HOST").unwrap_or_default(),
            ssh_port: lookup("SSH_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(22),
            ssh_user: non_empty("SSH_USER").unwrap_or_default(),
            ssh_password: non_empty("SSH_PASSWORD"),
            ssh_key_file: non_empty("SSH_KEY_FILE"),
            ssh_passphrase: non_empty("SSH_PASSPHRASE"),
            remote_db_host: non_empty("REMOTE_DB_HOST").unwrap_or_else(|| "localhost".to_string()),
            remote_db_port: lookup("REMOTE_DB_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(5432),
            connect_timeout: Duration::from_secs(
                lookup("SSH_CONNECT_TIMEOUT_SECS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            ),
        }
    }

    /// Password wins over a key file.
    pub fn auth(&self) -> Option<SshAuth> {
        if let Some(password) = &self.ssh_password {
            return Some(SshAuth::Password(password.clone()));
        }
        self.ssh_key_file.as_ref().map(|path| SshAuth::KeyFile {
            path: path.clone(),
            passphrase: self.ssh_passphrase.clone(),
        })
    }
}

/// Program, arguments and secret for one tunnel process.
#[derive(Debug, PartialEq, Eq)]
struct Invocation {
    program: &'static str,
    args: Vec<String>,
    /// Passed to `sshpass` through the `SSHPASS` variable, never on the command line.
    secret: Option<String>,
}

fn invocation(config: &TunnelConfig, auth: &SshAuth, local_port: u16) -> Invocation {
    let mut ssh_args = vec![
        "-N".to_string(),
        "-L".to_string(),
        format!(
            "127.0.0.1:{local_port}:{}:{}",
            config.remote_db_host, config.remote_db_port
        ),
        "-p".to_string(),
        config.ssh_port.to_string(),
        "-o".to_string(),
        "ExitOnForwardFailure=yes".to_string(),
        "-o".to_string(),
        "StrictHostKeyChecking=accept-new".to_string(),
        "-o".to_string(),
        "ServerAliveInterval=30".to_string(),
        "-o".to_string(),
        "LogLevel=ERROR".to_string(),
    ];

    let (sshpass_args, secret) = match auth {
        SshAuth::Password(password) => (vec!["-e".to_string()], Some(password.clone())),
        SshAuth::KeyFile { path, passphrase } => {
            ssh_args.push("-i".to_string());
            ssh_args.push(path.clone());
            match passphrase {
                Some(passphrase) => (
                    vec!["-P".to_string(), "passphrase".to_string(), "-e".to_string()],
                    Some(passphrase.clone()),
                ),
                None => {
                    ssh_args.push("-o".to_string());
                    ssh_args.push("BatchMode=yes".to_string());
                    (Vec::new(), None)
                }
            }
        }
    };
    ssh_args.push(format!("{}@{}", config.ssh_user, config.ssh_host));

    if secret.is_some() {
        let mut args = sshpass_args;
        args.push("ssh".to_string());
        args.extend(ssh_args);
        Invocation {
            program: "sshpass",
            args,
            secret,
        }
    } else {
        Invocation {
            program: "ssh",
            args: ssh_args,
            secret: None,
        }
    }
}

/// Asks the OS for an unused loopback port.
fn free_local_port() -> std::io::Result<u16> {
    let listener = StdTcpListener::bind((Ipv4Addr::LOCALHOST, 0))?;
    Ok(listener.local_addr()?.port())
}

/// A running tunnel. Dropping the guard kills the ssh process.
#[derive(Debug)]
pub struct TunnelGuard {
    child: Child,
    local_addr: SocketAddr,
    ssh_target: String,
}

impl TunnelGuard {
    /// Starts the ssh process and waits until the forwarded port accepts
    /// connections.
    pub async fn open(config: &TunnelConfig) -> Result<Self, TunnelError> {
        if config.ssh_host.is_empty() || config.ssh_user.is_empty() {
            return Err(TunnelError::MissingTarget);
        }
        let auth = config.auth().ok_or(TunnelError::MissingCredentials)?;

        let local_port = free_local_port().map_err(TunnelError::NoFreePort)?;
        let local_addr = SocketAddr::from((Ipv4Addr::LOCALHOST, local_port));
        let invocation = invocation(config, &auth, local_port);

        let mut command = Command::new(invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(secret) = &invocation.secret {
            command.env("SSHPASS", secret);
        }

        let mut child = command.spawn().map_err(|source| TunnelError::Spawn {
            program: invocation.program,
            source,
        })?;

        let deadline = Instant::now() + config.connect_timeout;
        loop {
            if let Some(status) = child.try_wait().map_err(|source| TunnelError::Spawn {
                program: invocation.program,
                source,
            })? {
                let mut stderr = String::new();
                if let Some(mut pipe) = child.stderr.take() {
                    let _ = pipe.read_to_string(&mut stderr).await;
                }
                return Err(TunnelError::Exited {
                    status,
                    stderr: stderr.trim().to_string(),
                });
            }

            if TcpStream::connect(local_addr).await.is_ok() {
                break;
            }

            if Instant::now() >= deadline {
                let _ = child.kill().await;
                return Err(TunnelError::Timeout(config.connect_timeout));
            }

            sleep(POLL_INTERVAL).await;
        }

        let ssh_target = format!("{}:{}", config.ssh_host, config.ssh_port);
        tracing::info!(
            ssh = %ssh_target,
            remote = %format!("{}:{}", config.remote_db_host, config.remote_db_port),
            local = %local_addr,
            "SSH tunnel established"
        );

        Ok(Self {
            child,
            local_addr,
            ssh_target,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn status(&self) -> TunnelStatus {
        TunnelStatus {
            active: true,
            local_bind_address: Some(self.local_addr.to_string()),
            remote_bind_address: Some(self.ssh_target.clone()),
        }
    }

    /// Stops the ssh process and waits for it to exit.
    pub async fn close(mut self) {
        tracing::info!(local = %self.local_addr, "Closing SSH tunnel");
        if let Err(error) = self.child.kill().await {
            tracing::warn!(error = %error, "Failed to stop SSH tunnel process");
        }
    }
}

/// Opens the tunnel if enabled and returns the endpoint to connect to.
///
/// Falls back to `direct` with a warning when the tunnel is disabled or cannot
/// be established.
pub async fn open_or_direct(
    config: &TunnelConfig,
    direct: DatabaseEndpoint,
) -> (Option<TunnelGuard>, DatabaseEndpoint) {
    if !config.enabled {
        return (None, direct);
    }

    match TunnelGuard::open(config).await {
        Ok(guard) => {
            let endpoint = DatabaseEndpoint {
                host: guard.local_addr().ip().to_string(),
                port: guard.local_addr().port(),
                tunneled: true,
            };
            (Some(guard), endpoint)
        }
        Err(error) => {
            tracing::warn!(
                error = %error,
                host = %direct.host,
                port = direct.port,
                "SSH tunnel unavailable, falling back to direct connection"
            );
            (None, direct)
        }
    }
}
