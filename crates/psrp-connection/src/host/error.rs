/// Error type for host call decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    NotImplemented(i32),
    InvalidParameters,
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotImplemented(method_id) => {
                write!(f, "Host method {method_id} is not implemented")
            }
            Self::InvalidParameters => write!(f, "Invalid parameters"),
        }
    }
}

impl std::error::Error for HostError {}
