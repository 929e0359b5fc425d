//! Strategy selection — a closed set of strategies resolved at configuration time.
//!
//! `StrategySpec` is the declarative form read from config files: a type name
//! plus numeric parameters. `StrategyConfig::from_spec` resolves it into one of
//! the known variants, so an unknown name or bad parameter fails construction,
//! never first use.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{BollingerBreakout, MaCrossover, RsiMaCrossover, SignalGenerator};

/// Errors from resolving a strategy.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrategyError {
    #[error("unknown strategy '{0}' (expected one of: moving_average, rsi_ma, bollinger)")]
    Unknown(String),
    #[error("strategy '{strategy}': unknown parameter '{param}'")]
    UnknownParam { strategy: String, param: String },
    #[error("strategy '{strategy}': invalid parameter '{param}' = {value}: {reason}")]
    InvalidParam {
        strategy: String,
        param: String,
        value: f64,
        reason: String,
    },
}

/// Strategy identifiers accepted in config files and on the command line.
pub const STRATEGY_NAMES: [&str; 3] = ["moving_average", "rsi_ma", "bollinger"];

/// Declarative strategy: a type name plus named numeric parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySpec {
    #[serde(rename = "type")]
    pub name: String,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

impl Default for StrategySpec {
    fn default() -> Self {
        Self::named("rsi_ma")
    }
}

impl StrategySpec {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: f64) -> Self {
        self.params.insert(key.into(), value);
        self
    }
}

/// The closed set of strategies, with resolved parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyConfig {
    MovingAverage {
        short_window: usize,
        long_window: usize,
    },
    RsiMa {
        short_window: usize,
        long_window: usize,
        rsi_period: usize,
    },
    Bollinger {
        window: usize,
        std_dev: f64,
    },
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self::RsiMa {
            short_window: 10,
            long_window: 50,
            rsi_period: 14,
        }
    }
}

impl StrategyConfig {
    pub fn name(&self) -> &'static str {
        match self {
            Self::MovingAverage { .. } => "moving_average",
            Self::RsiMa { .. } => "rsi_ma",
            Self::Bollinger { .. } => "bollinger",
        }
    }

    /// Resolve a declarative spec, applying defaults for omitted parameters.
    pub fn from_spec(spec: &StrategySpec) -> Result<Self, StrategyError> {
        let params = Params {
            strategy: &spec.name,
            values: &spec.params,
        };

        let config = match spec.name.as_str() {
            "moving_average" => {
                params.only(&["short_window", "long_window"])?;
                Self::MovingAverage {
                    short_window: params.window("short_window", 10)?,
                    long_window: params.window("long_window", 50)?,
                }
            }
            "rsi_ma" => {
                params.only(&["short_window", "long_window", "rsi_period"])?;
                Self::RsiMa {
                    short_window: params.window("short_window", 10)?,
                    long_window: params.window("long_window", 50)?,
                    rsi_period: params.window("rsi_period", 14)?,
                }
            }
            "bollinger" => {
                params.only(&["window", "std_dev"])?;
                Self::Bollinger {
                    window: params.window("window", 20)?,
                    std_dev: params.get("std_dev", 2.0),
                }
            }
            other => return Err(StrategyError::Unknown(other.to_string())),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check cross-parameter constraints the generators assert on.
    pub fn validate(&self) -> Result<(), StrategyError> {
        let invalid = |param: &str, value: f64, reason: &str| StrategyError::InvalidParam {
            strategy: self.name().to_string(),
            param: param.to_string(),
            value,
            reason: reason.to_string(),
        };

        match *self {
            Self::MovingAverage {
                short_window,
                long_window,
            }
            | Self::RsiMa {
                short_window,
                long_window,
                ..
            } => {
                if short_window == 0 {
                    return Err(invalid("short_window", 0.0, "must be >= 1"));
                }
                if long_window <= short_window {
                    return Err(invalid(
                        "long_window",
                        long_window as f64,
                        "must be greater than short_window",
                    ));
                }
                if let Self::RsiMa { rsi_period: 0, .. } = self {
                    return Err(invalid("rsi_period", 0.0, "must be >= 1"));
                }
            }
            Self::Bollinger { window, std_dev } => {
                if window < 2 {
                    return Err(invalid("window", window as f64, "must be >= 2"));
                }
                if !(std_dev.is_finite() && std_dev > 0.0) {
                    return Err(invalid("std_dev", std_dev, "must be positive"));
                }
            }
        }
        Ok(())
    }

    /// Build the runtime generator. Call `validate` first for untrusted input.
    pub fn build(&self) -> Box<dyn SignalGenerator> {
        match *self {
            Self::MovingAverage {
                short_window,
                long_window,
            } => Box::new(MaCrossover::new(short_window, long_window)),
            Self::RsiMa {
                short_window,
                long_window,
                rsi_period,
            } => Box::new(RsiMaCrossover::new(short_window, long_window, rsi_period)),
            Self::Bollinger { window, std_dev } => {
                Box::new(BollingerBreakout::new(window, std_dev))
            }
        }
    }

    /// Bars needed before every indicator the strategy reads is defined.
    pub fn warmup_bars(&self) -> usize {
        match *self {
            Self::MovingAverage { long_window, .. } => long_window - 1,
            Self::RsiMa {
                long_window,
                rsi_period,
                ..
            } => (long_window - 1).max(rsi_period - 1),
            Self::Bollinger { window, .. } => window - 1,
        }
    }
}

impl FromStr for StrategyConfig {
    type Err = StrategyError;

    /// Parse a bare strategy name with default parameters.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_spec(&StrategySpec::named(s.trim()))
    }
}

impl fmt::Display for StrategyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MovingAverage {
                short_window,
                long_window,
            } => write!(f, "moving_average({short_window}/{long_window})"),
            Self::RsiMa {
                short_window,
                long_window,
                rsi_period,
            } => write!(f, "rsi_ma({short_window}/{long_window}, rsi {rsi_period})"),
            Self::Bollinger { window, std_dev } => write!(f, "bollinger({window}, {std_dev}σ)"),
        }
    }
}

struct Params<'a> {
    strategy: &'a str,
    values: &'a BTreeMap<String, f64>,
}

impl Params<'_> {
    fn only(&self, allowed: &[&str]) -> Result<(), StrategyError> {
        match self.values.keys().find(|k| !allowed.contains(&k.as_str())) {
            Some(param) => Err(StrategyError::UnknownParam {
                strategy: self.strategy.to_string(),
                param: param.clone(),
            }),
            None => Ok(()),
        }
    }

    fn get(&self, name: &str, default: f64) -> f64 {
        self.values.get(name).copied().unwrap_or(default)
    }

    /// Window-like parameter: a positive whole number.
    fn window(&self, name: &str, default: usize) -> Result<usize, StrategyError> {
        let Some(&value) = self.values.get(name) else {
            return Ok(default);
        };
        if value.is_finite() && value >= 1.0 && value.fract() == 0.0 {
            Ok(value as usize)
        } else {
            Err(StrategyError::InvalidParam {
                strategy: self.strategy.to_string(),
                param: name.to_string(),
                value,
                reason: "must be a whole number >= 1".into(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_resolve_with_defaults() {
        assert_eq!(
            "moving_average".parse::<StrategyConfig>().unwrap(),
            StrategyConfig::MovingAverage {
                short_window: 10,
                long_window: 50
            }
        );
        assert_eq!("rsi_ma".parse::<StrategyConfig>().unwrap(), StrategyConfig::default());
        assert_eq!(
            "bollinger".parse::<StrategyConfig>().unwrap(),
            StrategyConfig::Bollinger {
                window: 20,
                std_dev: 2.0
            }
        );
        for name in STRATEGY_NAMES {
            assert_eq!(name.parse::<StrategyConfig>().unwrap().name(), name);
        }
    }

    #[test]
    fn unknown_name_fails_construction() {
        let err = "macd".parse::<StrategyConfig>().unwrap_err();
        assert_eq!(err, StrategyError::Unknown("macd".into()));
    }

    #[test]
    fn spec_params_override_defaults() {
        let spec = StrategySpec::named("rsi_ma")
            .with_param("short_window", 5.0)
            .with_param("rsi_period", 7.0);
        assert_eq!(
            StrategyConfig::from_spec(&spec).unwrap(),
            StrategyConfig::RsiMa {
                short_window: 5,
                long_window: 50,
                rsi_period: 7
            }
        );
    }

    #[test]
    fn rejects_bad_params() {
        let inverted = StrategySpec::named("moving_average")
            .with_param("short_window", 50.0)
            .with_param("long_window", 10.0);
        assert!(matches!(
            StrategyConfig::from_spec(&inverted),
            Err(StrategyError::InvalidParam { .. })
        ));

        let fractional = StrategySpec::named("bollinger").with_param("window", 2.5);
        assert!(matches!(
            StrategyConfig::from_spec(&fractional),
            Err(StrategyError::InvalidParam { .. })
        ));

        let negative_k = StrategySpec::named("bollinger").with_param("std_dev", -1.0);
        assert!(StrategyConfig::from_spec(&negative_k).is_err());

        let stray = StrategySpec::named("bollinger").with_param("rsi_period", 14.0);
        assert_eq!(
            StrategyConfig::from_spec(&stray),
            Err(StrategyError::UnknownParam {
                strategy: "bollinger".into(),
                param: "rsi_period".into()
            })
        );
    }

    #[test]
    fn build_matches_name() {
        for name in STRATEGY_NAMES {
            let config: StrategyConfig = name.parse().unwrap();
            assert_eq!(config.build().name(), name);
        }
    }

    #[test]
    fn warmup_covers_slowest_indicator() {
        assert_eq!(StrategyConfig::default().warmup_bars(), 49);
        let short_rsi_long = StrategyConfig::RsiMa {
            short_window: 2,
            long_window: 3,
            rsi_period: 14,
        };
        assert_eq!(short_rsi_long.warmup_bars(), 13);
    }

    #[test]
    fn serializes_tagged() {
        let json = serde_json::to_string(&StrategyConfig::default()).unwrap();
        assert!(json.contains("\"type\":\"rsi_ma\""));
        let back: StrategyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, StrategyConfig::default());
    }
}
