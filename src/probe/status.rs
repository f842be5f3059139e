use std::fmt;

use serde::Serialize;

/// Outcome of one sensor check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The check returned `Ok`.
    Success,
    /// The check returned `Err` or panicked.
    Failed,
}

impl Status {
    /// True for [`Status::Success`].
    pub fn is_success(self) -> bool {
        matches!(self, Status::Success)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Success => "success",
            Status::Failed => "failed",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Status::Success).unwrap(), r#""success""#);
        assert_eq!(serde_json::to_string(&Status::Failed).unwrap(), r#""failed""#);
        assert_eq!(Status::Failed.to_string(), "failed");
    }
}
