//! Named failure conditions and the exit statuses they map to.

use std::fmt;

/// Message used for codes outside the taxonomy.
pub const FALLBACK_MESSAGE: &str =
    "You submitted some kind of wackadoodle error code. What's up with you?";

/// Every reason the daemon can stop, together with its process exit status.
///
/// The discriminants are the exit codes and must stay stable: supervisors and
/// scripts key off them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorKind {
    /// Nothing went wrong.
    Ok = 0,
    /// A state or temperature file could not be opened.
    FileOpenFailed = 1,
    /// The process could not be duplicated.
    ForkFailed = 2,
    /// The child could not become a session leader.
    SessionCreateFailed = 3,
    /// A termination signal was received.
    TerminatedBySignal = 4,
    /// A kill signal was received.
    KilledBySignal = 5,
    /// Anything the other kinds do not describe.
    UnexpectedExit = 6,
    /// The heater state file held unrecognised content.
    UnknownHeaterState = 7,
}

impl ErrorKind {
    /// All kinds in code order.
    pub const ALL: [Self; 8] = [
        Self::Ok,
        Self::FileOpenFailed,
        Self::ForkFailed,
        Self::SessionCreateFailed,
        Self::TerminatedBySignal,
        Self::KilledBySignal,
        Self::UnexpectedExit,
        Self::UnknownHeaterState,
    ];

    /// Human-readable description logged before exiting.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Ok => "Everything is just fine.",
            Self::FileOpenFailed => "You tried to open a file but things did not go well.",
            Self::ForkFailed => "Unable to fork a child process.",
            Self::SessionCreateFailed => "Unable to set the session id.",
            Self::TerminatedBySignal => "Received a termination signal; exiting.",
            Self::KilledBySignal => "Received a kill signal; exiting.",
            Self::UnexpectedExit => "An unexpected condition has come up, exiting.",
            Self::UnknownHeaterState => "Encountered an unknown heater state!",
        }
    }

    /// Process exit status for this kind.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Looks a kind up by exit status.
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| i32::from(kind.code()) == code)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Describes any exit status, falling back to a generic message for codes
/// outside the taxonomy.
#[must_use]
pub fn message_for_code(code: i32) -> &'static str {
    ErrorKind::from_code(code).map_or(FALLBACK_MESSAGE, ErrorKind::message)
}
