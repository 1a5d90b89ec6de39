//! Dashboard configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Bind address and optional basic auth for the status server.
///
/// Auth is on only when both `username` and `password` are set.
#[derive(Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

fn default_enabled() -> bool {
    true
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8000
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            host: default_host(),
            port: default_port(),
            username: String::new(),
            password: String::new(),
        }
    }
}

impl fmt::Debug for DashboardConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DashboardConfig")
            .field("enabled", &self.enabled)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field(
                "password",
                &if self.password.is_empty() { "<unset>" } else { "<redacted>" },
            )
            .finish()
    }
}

impl DashboardConfig {
    pub fn auth_enabled(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.enabled && self.port == 0 {
            return Err("dashboard.port must be > 0 when the dashboard is enabled".to_string());
        }
        if self.username.is_empty() != self.password.is_empty() {
            return Err("dashboard.username and dashboard.password must be set together".to_string());
        }
        Ok(())
    }
}
