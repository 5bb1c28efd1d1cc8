//! Session and command orchestration on top of a PowerShell remoting runspace pool.
//!
//! The wire protocol is provided by a [`transport::RunspaceTransport`]; this crate
//! owns the lazily opened runspace, the host UI callbacks and the command
//! execution flow that turns a command line into `(rc, stdout, stderr)`.

pub mod command;
pub mod config;
pub mod connection;
pub mod connection_info;
pub mod error;
pub mod executor;
pub mod host;
pub mod runspace;
#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;
pub mod transport;

pub use command::CommandRequest;
pub use config::{ConnectionOptions, ProcessOptions, WinRmOptions};
pub use connection::PsrpConnection;
pub use connection_info::{
    AuthMethod, CertValidation, ConnectionInfo, ProcessInfo, Scheme, ServerAddress, WsManInfo,
};
pub use error::{ConfigError, ConnectionError, TransportError};
pub use executor::{CommandExecutor, CommandResult};
pub use host::{HostCall, HostCallbackSink, HostUi};
pub use runspace::{RunspaceSession, SessionState};
pub use transport::{PipelineHandle, RunspacePoolHandle, RunspacePoolState, RunspaceTransport};
