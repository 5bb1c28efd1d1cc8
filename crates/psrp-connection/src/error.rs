use std::borrow::Cow;

/// Errors surfaced by the connection layer.
///
/// A remote command that fails is not an error: it is reported through a
/// nonzero `rc` in [`crate::CommandResult`].
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("failed to connect using {transport}: {source}")]
    Connection {
        transport: &'static str,
        #[source]
        source: TransportError,
    },

    #[error("{0}")]
    Execution(String),

    #[error("file transfer failed on {transport}: {source}")]
    Transfer {
        transport: &'static str,
        #[source]
        source: TransportError,
    },

    #[error("pipeline invocation failed on {transport}: {source}")]
    Transport {
        transport: &'static str,
        #[source]
        source: TransportError,
    },

    #[error("Invalid encoded command: {0}")]
    Decode(Cow<'static, str>),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Error reported by a transport implementation.
///
/// The message is kept verbatim so it can be shown to the user as-is.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    message: Cow<'static, str>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<Cow<'static, str>>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<std::io::Error> for TransportError {
    fn from(value: std::io::Error) -> Self {
        Self::with_source(value.to_string(), value)
    }
}

/// Rejected connection options, raised while building the connection and
/// never at connect time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown authentication method '{0}', expected one of basic, certificate, negotiate, kerberos, ntlm, credssp")]
    UnknownAuth(String),

    #[error("unknown certificate validation mode '{0}', expected ignore or validate")]
    UnknownCertValidation(String),

    #[error("invalid server address: {0}")]
    InvalidServerAddress(&'static str),
}
