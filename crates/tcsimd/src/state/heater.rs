use std::fmt;
use std::io::{self, BufRead};

/// Longest first line, excluding the line terminator, that is inspected for
/// a heater state. Longer lines are unrecognised.
pub const MAX_STATE_LINE: usize = 31;

/// Whether simulated heat is being applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaterState {
    /// Heat is applied; the temperature rises.
    On,
    /// No heat; the temperature falls.
    Off,
}

impl HeaterState {
    /// State assumed whenever the heater file cannot be interpreted.
    ///
    /// The simulation fails open: unknown input is treated as a request for
    /// heat.
    pub const FAIL_OPEN: Self = Self::On;

    /// Token written by the actuator for this state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
        }
    }
}

impl fmt::Display for HeaterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of interpreting the first line of a heater state file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateReading {
    /// The line named a state.
    Known(HeaterState),
    /// Empty, overlong, or naming neither state.
    Unrecognized,
}

impl StateReading {
    /// Interprets a raw first line, terminator included or not.
    ///
    /// `"ON"` is checked before `"OFF"`; both are case-sensitive substrings.
    #[must_use]
    pub fn from_line(line: &[u8]) -> Self {
        let content = line.strip_suffix(b"\n").unwrap_or(line);
        let content = content.strip_suffix(b"\r").unwrap_or(content);
        if content.len() > MAX_STATE_LINE {
            return Self::Unrecognized;
        }
        if contains(content, HeaterState::On.as_str().as_bytes()) {
            Self::Known(HeaterState::On)
        } else if contains(content, HeaterState::Off.as_str().as_bytes()) {
            Self::Known(HeaterState::Off)
        } else {
            Self::Unrecognized
        }
    }

    /// Reads at most one bounded line from `reader` and interprets it.
    pub fn read_from<R: BufRead>(reader: R) -> io::Result<Self> {
        let limit = MAX_STATE_LINE + 2;
        let mut line = Vec::with_capacity(limit);
        reader.take(limit as u64).read_until(b'\n', &mut line)?;
        Ok(Self::from_line(&line))
    }

    /// Applies the fail-open policy, yielding a definite state.
    #[must_use]
    pub const fn resolve(self) -> HeaterState {
        match self {
            Self::Known(state) => state,
            Self::Unrecognized => HeaterState::FAIL_OPEN,
        }
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window == needle)
}
