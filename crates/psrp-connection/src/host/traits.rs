use super::{HostArg, HostError};

/// Receiver of the host UI callbacks issued by the remote interpreter.
///
/// Transports may invoke these from any thread, so implementations must be
/// `Send + Sync` and none of the methods can fail.
pub trait HostUi: Send + Sync {
    /// Write text without a trailing newline.
    fn write(&self, text: &str);

    /// Write a line, `None` writes an empty line.
    fn write_line(&self, line: Option<&str>);

    fn write_debug_line(&self, line: &str);

    fn write_verbose_line(&self, line: &str);

    fn write_warning_line(&self, line: &str);

    fn write_error_line(&self, line: &str);

    /// Progress records carry no text worth keeping, ignored by default.
    fn write_progress(&self, _source_id: i64, _record: &HostArg) {}

    /// The remote asked the host to exit with `exit_code`.
    fn set_should_exit(&self, exit_code: i32);
}

/// Single argument extraction from a raw host call parameter
pub trait FromArg: Sized {
    fn from_arg(arg: &HostArg) -> Result<Self, HostError>;
}

/// Parameter list extraction, the arity must match exactly
pub trait FromArgs: Sized {
    fn from_args(args: &[HostArg]) -> Result<Self, HostError>;
}

impl FromArg for String {
    fn from_arg(arg: &HostArg) -> Result<Self, HostError> {
        arg.as_string().ok_or(HostError::InvalidParameters)
    }
}

impl FromArg for i32 {
    fn from_arg(arg: &HostArg) -> Result<Self, HostError> {
        arg.as_i32().ok_or(HostError::InvalidParameters)
    }
}

impl FromArg for i64 {
    fn from_arg(arg: &HostArg) -> Result<Self, HostError> {
        arg.as_i64().ok_or(HostError::InvalidParameters)
    }
}

impl FromArg for HostArg {
    fn from_arg(arg: &HostArg) -> Result<Self, HostError> {
        Ok(arg.clone())
    }
}

macro_rules! impl_from_args {
    ($len:literal; $($ty:ident . $idx:tt),*) => {
        impl<$($ty: FromArg),*> FromArgs for ($($ty,)*) {
            fn from_args(args: &[HostArg]) -> Result<Self, HostError> {
                if args.len() != $len {
                    return Err(HostError::InvalidParameters);
                }
                Ok(($($ty::from_arg(&args[$idx])?,)*))
            }
        }
    };
}

impl_from_args!(0;);
impl_from_args!(1; A.0);
impl_from_args!(2; A.0, B.1);
impl_from_args!(3; A.0, B.1, C.2);
