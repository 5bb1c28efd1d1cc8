//! Resolution of the configured connection options into the parameters a
//! transport needs to open a runspace pool.

use std::{fmt::Display, net::IpAddr, str::FromStr};

use serde::Deserialize;
use url::Url;

use crate::{
    config::{ConnectionOptions, ProcessOptions, WinRmOptions},
    error::ConfigError,
};

pub const DEFAULT_HTTP_PORT: u16 = 5985;
pub const DEFAULT_HTTPS_PORT: u16 = 5986;

pub const LOCAL_TRANSPORT: &str = "psrp_local";
pub const WINRM_TRANSPORT: &str = "psrp_winrm";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// WinRM authentication protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    Basic,
    Certificate,
    #[default]
    Negotiate,
    Kerberos,
    Ntlm,
    Credssp,
}

impl AuthMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Certificate => "certificate",
            Self::Negotiate => "negotiate",
            Self::Kerberos => "kerberos",
            Self::Ntlm => "ntlm",
            Self::Credssp => "credssp",
        }
    }
}

impl Display for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Self::Basic),
            "certificate" => Ok(Self::Certificate),
            "negotiate" => Ok(Self::Negotiate),
            "kerberos" => Ok(Self::Kerberos),
            "ntlm" => Ok(Self::Ntlm),
            "credssp" => Ok(Self::Credssp),
            other => Err(ConfigError::UnknownAuth(other.to_owned())),
        }
    }
}

/// Certificate validation behaviour, `Ignore` disables validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertValidation {
    Ignore,
    #[default]
    Validate,
}

impl FromStr for CertValidation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ignore" => Ok(Self::Ignore),
            "validate" => Ok(Self::Validate),
            other => Err(ConfigError::UnknownCertValidation(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerAddress {
    Ip(IpAddr),
    Domain(String),
}

impl ServerAddress {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        let value = value.trim();
        if let Ok(ip) = value.parse::<IpAddr>() {
            Ok(Self::Ip(ip))
        } else if !value.is_empty() {
            Ok(Self::Domain(value.to_owned()))
        } else {
            Err(ConfigError::InvalidServerAddress(
                "server address cannot be empty",
            ))
        }
    }
}

impl Display for ServerAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ip(IpAddr::V6(ip)) => write!(f, "[{ip}]"),
            Self::Ip(ip) => write!(f, "{ip}"),
            Self::Domain(domain) => write!(f, "{domain}"),
        }
    }
}

/// Local subprocess standing in for the remote host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub executable: String,
    pub arguments: Vec<String>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct WsManInfo {
    pub server: ServerAddress,
    pub scheme: Scheme,
    pub port: u16,
    pub path: String,
    pub verify_tls: bool,
    pub auth: AuthMethod,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl WsManInfo {
    /// The WS-Management endpoint, e.g. `http://server:5985/wsman`.
    pub fn endpoint(&self) -> Result<Url, url::ParseError> {
        let path = self.path.trim_start_matches('/');
        Url::parse(&format!(
            "{}://{}:{}/{}",
            self.scheme, self.server, self.port, path
        ))
    }
}

impl std::fmt::Debug for WsManInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsManInfo")
            .field("server", &self.server)
            .field("scheme", &self.scheme)
            .field("port", &self.port)
            .field("path", &self.path)
            .field("verify_tls", &self.verify_tls)
            .field("auth", &self.auth)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Fully resolved parameters for opening a runspace pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionInfo {
    Process(ProcessInfo),
    WsMan(WsManInfo),
}

impl ConnectionInfo {
    /// Name of the transport variant, used in logs and error messages.
    pub fn transport_name(&self) -> &'static str {
        match self {
            Self::Process(_) => LOCAL_TRANSPORT,
            Self::WsMan(_) => WINRM_TRANSPORT,
        }
    }
}

impl ProcessOptions {
    pub fn resolve(&self) -> ProcessInfo {
        ProcessInfo {
            executable: self.executable.clone(),
            arguments: self.arguments.clone(),
        }
    }
}

impl WinRmOptions {
    pub fn resolve(&self) -> Result<WsManInfo, ConfigError> {
        let port = self.port.unwrap_or(if self.use_tls {
            DEFAULT_HTTPS_PORT
        } else {
            DEFAULT_HTTP_PORT
        });

        Ok(WsManInfo {
            server: ServerAddress::parse(&self.hostname)?,
            scheme: if self.use_tls {
                Scheme::Https
            } else {
                Scheme::Http
            },
            port,
            path: self.path.clone(),
            verify_tls: self.cert_validation != CertValidation::Ignore,
            auth: self.auth,
            username: self.remote_user.clone(),
            password: self.remote_password.clone(),
        })
    }
}

/// Resolve options into connection parameters for the selected transport.
pub fn resolve(options: &ConnectionOptions) -> Result<ConnectionInfo, ConfigError> {
    match options {
        ConnectionOptions::Local(process) => Ok(ConnectionInfo::Process(process.resolve())),
        ConnectionOptions::WinRm(winrm) => winrm.resolve().map(ConnectionInfo::WsMan),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn winrm(use_tls: bool, port: Option<u16>) -> WsManInfo {
        let options = match port {
            Some(port) => WinRmOptions::builder()
                .hostname("server01")
                .use_tls(use_tls)
                .port(port)
                .build(),
            None => WinRmOptions::builder()
                .hostname("server01")
                .use_tls(use_tls)
                .build(),
        };
        options.resolve().unwrap()
    }

    #[test]
    fn test_http_defaults_to_5985() {
        let info = winrm(false, None);
        assert_eq!(info.port, 5985);
        assert_eq!(info.scheme, Scheme::Http);
        assert_eq!(info.scheme.as_str(), "http");
    }

    #[test]
    fn test_https_defaults_to_5986() {
        let info = winrm(true, None);
        assert_eq!(info.port, 5986);
        assert_eq!(info.scheme.as_str(), "https");
    }

    #[test]
    fn test_explicit_port_wins() {
        assert_eq!(winrm(true, Some(8080)).port, 8080);
        assert_eq!(winrm(false, Some(5986)).port, 5986);
    }

    #[test]
    fn test_verify_tls_only_disabled_by_ignore() {
        let default = winrm(true, None);
        assert!(default.verify_tls);

        let validate = WinRmOptions::builder()
            .hostname("server01")
            .cert_validation(CertValidation::Validate)
            .build()
            .resolve()
            .unwrap();
        assert!(validate.verify_tls);

        let ignore = WinRmOptions::builder()
            .hostname("server01")
            .cert_validation(CertValidation::Ignore)
            .build()
            .resolve()
            .unwrap();
        assert!(!ignore.verify_tls);
    }

    #[test]
    fn test_winrm_defaults() {
        let info = winrm(false, None);
        assert_eq!(info.path, "wsman");
        assert_eq!(info.auth, AuthMethod::Negotiate);
        assert_eq!(info.username, None);
        assert_eq!(info.password, None);
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(
            winrm(false, None).endpoint().unwrap().as_str(),
            "http://server01:5985/wsman"
        );

        let ipv6 = WinRmOptions::builder()
            .hostname("::1")
            .use_tls(true)
            .path("/custom")
            .build()
            .resolve()
            .unwrap();
        assert_eq!(ipv6.endpoint().unwrap().as_str(), "https://[::1]:5986/custom");
    }

    #[test]
    fn test_empty_hostname_is_rejected() {
        let result = WinRmOptions::builder().hostname("  ").build().resolve();
        assert!(matches!(result, Err(ConfigError::InvalidServerAddress(_))));
    }

    #[test]
    fn test_debug_redacts_password() {
        let info = WinRmOptions::builder()
            .hostname("server01")
            .remote_user("admin")
            .remote_password("hunter2")
            .build()
            .resolve()
            .unwrap();

        let rendered = format!("{info:?}");
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("hunter2"));
        assert_eq!(info.password.as_deref(), Some("hunter2"));
    }

    #[test]
    fn test_local_resolution() {
        let info = resolve(&ConnectionOptions::Local(ProcessOptions::default())).unwrap();
        assert_eq!(
            info,
            ConnectionInfo::Process(ProcessInfo {
                executable: "pwsh".to_string(),
                arguments: vec![
                    "-NoProfile".to_string(),
                    "-NoLogo".to_string(),
                    "-ServerMode".to_string()
                ],
            })
        );
        assert_eq!(info.transport_name(), "psrp_local");
    }

    #[test]
    fn test_auth_parsing() {
        for name in ["basic", "certificate", "negotiate", "kerberos", "ntlm", "credssp"] {
            let auth: AuthMethod = name.parse().unwrap();
            assert_eq!(auth.as_str(), name);
        }

        assert_eq!(
            "digest".parse::<AuthMethod>(),
            Err(ConfigError::UnknownAuth("digest".to_string()))
        );
        assert!("strict".parse::<CertValidation>().is_err());
    }

    #[test]
    fn test_transport_names() {
        let local = resolve(&ConnectionOptions::Local(ProcessOptions::default())).unwrap();
        let winrm = ConnectionInfo::WsMan(winrm(false, None));

        assert_eq!(local.transport_name(), "psrp_local");
        assert_eq!(winrm.transport_name(), "psrp_winrm");
    }
}
