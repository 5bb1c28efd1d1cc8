//! Connection options with their defaults.
//!
//! Options are validated when the connection is built, a connection never
//! fails at connect time because of a bad option value.

use serde::Deserialize;

use crate::{
    connection_info::{AuthMethod, CertValidation, ConnectionInfo, ServerAddress},
    error::ConfigError,
};

fn default_executable() -> String {
    "pwsh".to_owned()
}

fn default_arguments() -> Vec<String> {
    ["-NoProfile", "-NoLogo", "-ServerMode"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_path() -> String {
    "wsman".to_owned()
}

/// Options of the local process transport.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, typed_builder::TypedBuilder)]
pub struct ProcessOptions {
    /// The PowerShell executable, `pwsh` targets PowerShell 6+.
    #[builder(default = default_executable(), setter(into))]
    #[serde(default = "default_executable")]
    pub executable: String,

    /// Arguments used to start the executable in server mode.
    #[builder(default = default_arguments())]
    #[serde(default = "default_arguments")]
    pub arguments: Vec<String>,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Options of the WinRM transport.
#[derive(Clone, PartialEq, Eq, Deserialize, typed_builder::TypedBuilder)]
pub struct WinRmOptions {
    /// Hostname or IP address of the remote host.
    #[builder(setter(into))]
    pub hostname: String,

    #[builder(default, setter(strip_option, into))]
    #[serde(default)]
    pub remote_user: Option<String>,

    #[builder(default, setter(strip_option, into))]
    #[serde(default)]
    pub remote_password: Option<String>,

    /// Defaults to 5985, or 5986 when `use_tls` is set.
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub port: Option<u16>,

    #[builder(default)]
    #[serde(default)]
    pub use_tls: bool,

    /// URI path of the WS-Management endpoint.
    #[builder(default = default_path(), setter(into))]
    #[serde(default = "default_path")]
    pub path: String,

    #[builder(default)]
    #[serde(default)]
    pub auth: AuthMethod,

    #[builder(default)]
    #[serde(default)]
    pub cert_validation: CertValidation,
}

impl std::fmt::Debug for WinRmOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WinRmOptions")
            .field("hostname", &self.hostname)
            .field("remote_user", &self.remote_user)
            .field(
                "remote_password",
                &self.remote_password.as_ref().map(|_| "<redacted>"),
            )
            .field("port", &self.port)
            .field("use_tls", &self.use_tls)
            .field("path", &self.path)
            .field("auth", &self.auth)
            .field("cert_validation", &self.cert_validation)
            .finish()
    }
}

impl WinRmOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ServerAddress::parse(&self.hostname).map(|_| ())
    }
}

/// Transport selection together with its options.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "transport")]
pub enum ConnectionOptions {
    #[serde(rename = "psrp_local")]
    Local(ProcessOptions),
    #[serde(rename = "psrp_winrm")]
    WinRm(WinRmOptions),
}

impl ConnectionOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Local(_) => Ok(()),
            Self::WinRm(options) => options.validate(),
        }
    }

    pub fn resolve(&self) -> Result<ConnectionInfo, ConfigError> {
        crate::connection_info::resolve(self)
    }
}

impl From<ProcessOptions> for ConnectionOptions {
    fn from(value: ProcessOptions) -> Self {
        Self::Local(value)
    }
}

impl From<WinRmOptions> for ConnectionOptions {
    fn from(value: WinRmOptions) -> Self {
        Self::WinRm(value)
    }
}
