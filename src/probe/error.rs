use thiserror::Error;

/// Errors produced by the probe module.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ProbeError {
    /// A mode name did not match any known mode.
    #[error("unknown probe mode: {0:?}")]
    UnknownMode(String),

    /// A mode without any known bit was serialized.
    #[error("invalid probe mode: {0:#05b}")]
    InvalidMode(u8),

    /// Reports could not be encoded.
    #[error("encode probe reports: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ProbeError {
    /// Short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ProbeError::UnknownMode(_) => "probe_unknown_mode",
            ProbeError::InvalidMode(_) => "probe_invalid_mode",
            ProbeError::Encode(_) => "probe_encode",
        }
    }
}
