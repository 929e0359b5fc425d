//! Signal — the discrete per-bar trading instruction fed to the simulator.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One discrete instruction per bar: Buy = +1, Hold = 0, Sell = −1.
///
/// The simulator never recomputes a signal; it only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Signal {
    Buy,
    #[default]
    Hold,
    Sell,
}

/// Integer value outside {−1, 0, 1}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid signal value {0}: expected -1, 0 or 1")]
pub struct InvalidSignal(pub i64);

impl Signal {
    pub fn as_i8(self) -> i8 {
        match self {
            Signal::Buy => 1,
            Signal::Hold => 0,
            Signal::Sell => -1,
        }
    }
}

impl From<Signal> for i8 {
    fn from(signal: Signal) -> Self {
        signal.as_i8()
    }
}

impl TryFrom<i64> for Signal {
    type Error = InvalidSignal;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Signal::Buy),
            0 => Ok(Signal::Hold),
            -1 => Ok(Signal::Sell),
            other => Err(InvalidSignal(other)),
        }
    }
}

impl TryFrom<i8> for Signal {
    type Error = InvalidSignal;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        Signal::try_from(i64::from(value))
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_conversion() {
        assert_eq!(Signal::try_from(1i64), Ok(Signal::Buy));
        assert_eq!(Signal::try_from(0i64), Ok(Signal::Hold));
        assert_eq!(Signal::try_from(-1i64), Ok(Signal::Sell));
        assert_eq!(Signal::try_from(2i64), Err(InvalidSignal(2)));
        assert_eq!(i8::from(Signal::Sell), -1);
    }

    #[test]
    fn serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Signal::Buy).unwrap(), "1");
        let s: Signal = serde_json::from_str("-1").unwrap();
        assert_eq!(s, Signal::Sell);
        assert!(serde_json::from_str::<Signal>("3").is_err());
    }
}
