use std::fmt;
use std::num::ParseFloatError;
use std::str::FromStr;

use thiserror::Error;

use super::heater::HeaterState;

/// Simulated temperature in degrees. Always finite.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Temperature(f64);

/// Errors raised while constructing or parsing a [`Temperature`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemperatureError {
    /// The value was NaN or infinite.
    #[error("temperature must be finite, got {value}")]
    NonFinite {
        /// Rejected value.
        value: f64,
    },
    /// The text was not a decimal number.
    #[error("invalid temperature '{text}': {source}")]
    Parse {
        /// Offending text.
        text: String,
        /// Underlying parse error.
        #[source]
        source: ParseFloatError,
    },
}

impl Temperature {
    /// Degrees gained or lost per simulation step.
    pub const STEP: f64 = 1.0;

    /// Wraps a finite value.
    pub fn new(degrees: f64) -> Result<Self, TemperatureError> {
        if degrees.is_finite() {
            Ok(Self(degrees))
        } else {
            Err(TemperatureError::NonFinite { value: degrees })
        }
    }

    /// The raw value in degrees.
    #[must_use]
    pub const fn degrees(self) -> f64 {
        self.0
    }

    /// Temperature after one step of the linear model. Unbounded in both
    /// directions.
    #[must_use]
    pub fn step(self, heater: HeaterState) -> Self {
        match heater {
            HeaterState::On => Self(self.0 + Self::STEP),
            HeaterState::Off => Self(self.0 - Self::STEP),
        }
    }
}

/// Fixed point with six fractional digits, as published in the temperature
/// file.
impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

impl FromStr for Temperature {
    type Err = TemperatureError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        let degrees = trimmed
            .parse::<f64>()
            .map_err(|source| TemperatureError::Parse {
                text: trimmed.to_owned(),
                source,
            })?;
        Self::new(degrees)
    }
}
