//! The contract a runspace pool transport has to fulfil.
//!
//! Framing, encryption and the WS-Management envelopes all live behind these
//! traits; the connection layer only opens, drives and closes a pool.

use std::{fmt::Display, path::Path, sync::Arc};

use crate::{connection_info::ConnectionInfo, error::TransportError, host::HostUi};

/// https://learn.microsoft.com/en-us/openspecs/windows_protocols/ms-psrp/b05495bc-a9b2-4794-9f43-4bf1f3633900
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum RunspacePoolState {
    BeforeOpen = 0,
    Opening = 1,
    Opened = 2,
    Closed = 3,
    Closing = 4,
    Broken = 5,
    NegotiationSent = 6,
    NegotiationSucceeded = 7,
    Connecting = 8,
    Disconnected = 9,
}

/// Opens runspace pools for a resolved [`ConnectionInfo`].
pub trait RunspaceTransport {
    type Pool: RunspacePoolHandle;

    /// Report a missing dependency of the transport stack, checked before
    /// every lazy open.
    fn check_available(&self) -> Result<(), String> {
        Ok(())
    }

    /// Open a pool. Host callbacks raised by the remote interpreter for any
    /// pipeline of this pool must be delivered to `host`.
    fn open(
        &self,
        info: &ConnectionInfo,
        host: Arc<dyn HostUi>,
    ) -> Result<Self::Pool, TransportError>;
}

/// An open runspace pool.
pub trait RunspacePoolHandle {
    type Pipeline: PipelineHandle;

    fn state(&self) -> RunspacePoolState;

    fn close(&mut self) -> Result<(), TransportError>;

    fn create_pipeline(&mut self) -> Self::Pipeline;

    fn copy_to_remote(&mut self, local: &Path, remote: &str) -> Result<(), TransportError>;

    fn fetch_from_remote(&mut self, remote: &str, local: &Path) -> Result<(), TransportError>;
}

/// A single script execution on a pool.
pub trait PipelineHandle {
    type Output: Display;
    type ErrorRecord: Display;

    fn add_script(&mut self, script: &str);

    /// Run the pipeline to completion, feeding `input` to it.
    fn invoke(&mut self, input: &[String]) -> Result<Vec<Self::Output>, TransportError>;

    fn had_errors(&self) -> bool;

    fn error_stream(&self) -> Vec<Self::ErrorRecord>;
}
