use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    connection_info::ConnectionInfo,
    error::ConnectionError,
    host::{HostCallbackSink, HostUi},
    transport::{RunspacePoolHandle, RunspacePoolState, RunspaceTransport},
};

/// Locally tracked lifecycle of a [`RunspaceSession`].
///
/// Transport side states such as a broken pool are not tracked here, they
/// surface as errors from the operation that hit them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unopened,
    Opened,
    Closed,
}

impl SessionState {
    fn state_name(self) -> &'static str {
        match self {
            Self::Unopened => "Unopened",
            Self::Opened => "Opened",
            Self::Closed => "Closed",
        }
    }
}

/// A lazily opened runspace pool bound to one [`ConnectionInfo`].
///
/// The pool is opened on first demand and kept for the following commands.
/// After [`RunspaceSession::close`] the same session can be opened again with
/// the same connection info, which is what [`RunspaceSession::reset`] does.
pub struct RunspaceSession<T: RunspaceTransport> {
    transport: T,
    info: ConnectionInfo,
    host: Arc<HostCallbackSink>,
    pool: Option<T::Pool>,
    state: SessionState,
    session_id: Option<Uuid>,
}

impl<T: RunspaceTransport> std::fmt::Debug for RunspaceSession<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunspaceSession")
            .field("transport", &self.info.transport_name())
            .field("state", &self.state)
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}

impl<T: RunspaceTransport> RunspaceSession<T> {
    pub fn new(transport: T, info: ConnectionInfo) -> Self {
        Self {
            transport,
            info,
            host: Arc::new(HostCallbackSink::new()),
            pool: None,
            state: SessionState::Unopened,
            session_id: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.pool.is_some()
    }

    /// Identifier of the current physical connection, if any.
    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn connection_info(&self) -> &ConnectionInfo {
        &self.info
    }

    pub fn transport_name(&self) -> &'static str {
        self.info.transport_name()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The host receiving the callbacks of this session's pipelines.
    pub fn host(&self) -> &Arc<HostCallbackSink> {
        &self.host
    }

    fn set_state(&mut self, state: SessionState) {
        info!(
            transport = self.info.transport_name(),
            state = state.state_name(),
            "Setting session state"
        );
        self.state = state;
    }

    /// Open the runspace pool, returning the existing one when already open.
    #[instrument(skip(self), fields(transport = self.info.transport_name()))]
    pub fn open(&mut self) -> Result<&mut T::Pool, ConnectionError> {
        let pool = match self.pool.take() {
            Some(pool) => pool,
            None => {
                let session_id = Uuid::new_v4();
                info!(%session_id, "establishing connection");

                let host: Arc<dyn HostUi> = self.host.clone();
                let pool = self.transport.open(&self.info, host).map_err(|source| {
                    ConnectionError::Connection {
                        transport: self.info.transport_name(),
                        source,
                    }
                })?;

                self.session_id = Some(session_id);
                self.set_state(SessionState::Opened);
                pool
            }
        };

        Ok(self.pool.insert(pool))
    }

    /// Lazy accessor used by every command and file operation.
    pub fn get_or_open(&mut self) -> Result<&mut T::Pool, ConnectionError> {
        if self.pool.is_none() {
            self.transport.check_available().map_err(|missing| {
                ConnectionError::Configuration(format!(
                    "{} transport dependencies are not available: {missing}",
                    self.info.transport_name()
                ))
            })?;
        }

        self.open()
    }

    /// Close the pool if one is open.
    ///
    /// A graceful close is only issued when the transport still reports the
    /// pool as opened. The session is marked closed even if that close fails.
    #[instrument(skip(self), fields(transport = self.info.transport_name()))]
    pub fn close(&mut self) -> Result<(), ConnectionError> {
        let Some(mut pool) = self.pool.take() else {
            return Ok(());
        };

        let result = match pool.state() {
            RunspacePoolState::Opened => {
                info!(session_id = ?self.session_id, "closing runspace pool");
                pool.close().map_err(|source| ConnectionError::Connection {
                    transport: self.info.transport_name(),
                    source,
                })
            }
            state => {
                warn!(?state, "runspace pool is not opened, dropping it without close");
                Ok(())
            }
        };

        self.session_id = None;
        self.set_state(SessionState::Closed);
        result
    }

    /// Close and reopen the pool, a no-op when nothing is connected.
    pub fn reset(&mut self) -> Result<(), ConnectionError> {
        if !self.is_connected() {
            return Ok(());
        }

        self.close()?;
        self.get_or_open().map(|_| ())
    }
}
