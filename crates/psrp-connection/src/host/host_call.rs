use super::{FromArgs, HostError, HostUi};

/// Raw parameter of a remote host method call, as decoded by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostArg {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    String(String),
}

impl HostArg {
    pub fn as_string(&self) -> Option<String> {
        match self {
            Self::String(value) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::I32(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::I32(value) => Some(i64::from(*value)),
            Self::I64(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<&str> for HostArg {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for HostArg {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i32> for HostArg {
    fn from(value: i32) -> Self {
        Self::I32(value)
    }
}

impl From<i64> for HostArg {
    fn from(value: i64) -> Self {
        Self::I64(value)
    }
}

macro_rules! define_host_calls {
    ($(
        $method_id:literal . $method_name:ident : ($($param:ty),*)
    ),* $(,)?) => {
        /// Host method calls the connection layer handles, keyed by their MS-PSRP method id.
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum HostCall {
            $(
                $method_name(($($param,)*)),
            )*
        }

        impl HostCall {
            /// Decode a raw host call, validating the parameter list
            pub fn try_from_raw(method_id: i32, args: &[HostArg]) -> Result<Self, HostError> {
                match method_id {
                    $(
                        $method_id => Ok(Self::$method_name(FromArgs::from_args(args)?)),
                    )*
                    _ => Err(HostError::NotImplemented(method_id)),
                }
            }

            pub fn method_id(&self) -> i32 {
                match self {
                    $(
                        Self::$method_name(..) => $method_id,
                    )*
                }
            }

            pub fn method_name(&self) -> &'static str {
                match self {
                    $(
                        Self::$method_name(..) => stringify!($method_name),
                    )*
                }
            }
        }
    };
}

define_host_calls! {
    6.SetShouldExit: (i32),

    13.Write1: (String),
    14.Write2: (i32, i32, String),
    15.WriteLine1: (),
    16.WriteLine2: (String),
    17.WriteLine3: (i32, i32, String),
    18.WriteErrorLine: (String),
    19.WriteDebugLine: (String),
    20.WriteProgress: (i64, HostArg),
    21.WriteVerboseLine: (String),
    22.WriteWarningLine: (String),
}

impl HostCall {
    /// Deliver the call to a host. Foreground/background colors are dropped.
    pub fn dispatch(self, host: &dyn HostUi) {
        match self {
            Self::SetShouldExit((exit_code,)) => host.set_should_exit(exit_code),
            Self::Write1((text,)) | Self::Write2((_, _, text)) => host.write(&text),
            Self::WriteLine1(()) => host.write_line(None),
            Self::WriteLine2((text,)) | Self::WriteLine3((_, _, text)) => {
                host.write_line(Some(&text));
            }
            Self::WriteErrorLine((text,)) => host.write_error_line(&text),
            Self::WriteDebugLine((text,)) => host.write_debug_line(&text),
            Self::WriteProgress((source_id, record)) => host.write_progress(source_id, &record),
            Self::WriteVerboseLine((text,)) => host.write_verbose_line(&text),
            Self::WriteWarningLine((text,)) => host.write_warning_line(&text),
        }
    }
}
