mod error;
mod host_call;
mod sink;
mod traits;

#[cfg(test)]
mod test;

pub use error::*;
pub use host_call::{HostArg, HostCall};
pub use sink::{HostCallbackSink, HostOutput};
pub use traits::{FromArg, FromArgs, HostUi};
