use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::str::FromStr;

use serde::ser::{Error as _, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::probe::ProbeError;

/// Set of probe modes a sensor runs in.
///
/// A bit set: a sensor may be both a startup and a liveness check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Mode(u8);

impl Mode {
    /// Checked once, while the process starts.
    pub const STARTUP: Mode = Mode(1);
    /// Checked to decide whether the process accepts work.
    pub const READINESS: Mode = Mode(1 << 1);
    /// Checked to decide whether the process must be restarted.
    pub const LIVENESS: Mode = Mode(1 << 2);
    /// Checked while starting and for as long as the process runs.
    pub const STARTUP_LIVENESS: Mode = Mode(Self::STARTUP.0 | Self::LIVENESS.0);
    /// Every known mode.
    pub const ALL: Mode = Mode(Self::STARTUP.0 | Self::READINESS.0 | Self::LIVENESS.0);

    /// Names in alphabetical order.
    const NAMES: [(Mode, &'static str); 3] = [
        (Self::LIVENESS, "liveness"),
        (Self::READINESS, "readiness"),
        (Self::STARTUP, "startup"),
    ];

    /// True if at least one known mode bit is set.
    pub fn is_valid(self) -> bool {
        self.0 & Self::ALL.0 != 0
    }

    /// True if `self` and `other` share a mode.
    pub fn intersects(self, other: Mode) -> bool {
        self.0 & other.0 != 0
    }

    /// Raw bits.
    pub fn bits(self) -> u8 {
        self.0
    }

    fn names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMES
            .into_iter()
            .filter(move |(mode, _)| self.intersects(*mode))
            .map(|(_, name)| name)
    }
}

impl BitOr for Mode {
    type Output = Mode;

    fn bitor(self, rhs: Mode) -> Mode {
        Mode(self.0 | rhs.0)
    }
}

impl BitOrAssign for Mode {
    fn bitor_assign(&mut self, rhs: Mode) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Mode {
    type Output = Mode;

    fn bitand(self, rhs: Mode) -> Mode {
        Mode(self.0 & rhs.0)
    }
}

impl FromStr for Mode {
    type Err = ProbeError;

    /// Parses a single mode name, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::NAMES
            .into_iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(s))
            .map(|(mode, _)| mode)
            .ok_or_else(|| ProbeError::UnknownMode(s.to_string()))
    }
}

impl fmt::Display for Mode {
    /// Comma-separated names in alphabetical order, e.g. `liveness,startup`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, name) in self.names().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

impl Serialize for Mode {
    /// Serializes as a sorted array of names; a mode without known bits is an error.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if !self.is_valid() {
            return Err(S::Error::custom(ProbeError::InvalidMode(self.0)));
        }
        let mut seq = serializer.serialize_seq(None)?;
        for name in self.names() {
            seq.serialize_element(name)?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_modes_ignoring_case() {
        assert_eq!("startup".parse::<Mode>().unwrap(), Mode::STARTUP);
        assert_eq!("Readiness".parse::<Mode>().unwrap(), Mode::READINESS);
        assert_eq!("LIVENESS".parse::<Mode>().unwrap(), Mode::LIVENESS);
        assert!(matches!(
            "warmup".parse::<Mode>(),
            Err(ProbeError::UnknownMode(m)) if m == "warmup"
        ));
    }

    #[test]
    fn validity_and_intersection() {
        assert!(Mode::ALL.is_valid());
        assert!(!Mode::default().is_valid());
        assert!(!Mode(1 << 6).is_valid());
        assert!(Mode::STARTUP_LIVENESS.intersects(Mode::LIVENESS));
        assert!(!Mode::STARTUP_LIVENESS.intersects(Mode::READINESS));
        assert_eq!(Mode::STARTUP | Mode::LIVENESS, Mode::STARTUP_LIVENESS);
    }

    #[test]
    fn display_is_sorted() {
        assert_eq!(Mode::ALL.to_string(), "liveness,readiness,startup");
        assert_eq!(Mode::STARTUP_LIVENESS.to_string(), "liveness,startup");
        assert_eq!(Mode::default().to_string(), "");
    }

    #[test]
    fn serializes_as_sorted_array() {
        let json = serde_json::to_string(&Mode::STARTUP_LIVENESS).unwrap();
        assert_eq!(json, r#"["liveness","startup"]"#);

        let err = serde_json::to_string(&Mode::default()).unwrap_err();
        assert!(err.to_string().contains("invalid probe mode"));
    }
}
