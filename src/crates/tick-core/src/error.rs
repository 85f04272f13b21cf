use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Expected a [MIDI:...] wrapper, found '{found}'")]
    MissingWrapper { found: String },

    #[error("Malformed note token '{token}': {reason}")]
    MalformedInterval { token: String, reason: String },

    #[error("Pitch {pitch} is outside the MIDI range 0-127")]
    PitchOutOfRange { pitch: i32 },
}

impl Error {
    pub fn missing_wrapper(found: impl Into<String>) -> Self {
        Error::MissingWrapper {
            found: found.into(),
        }
    }

    pub fn malformed_interval(token: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedInterval {
            token: token.into(),
            reason: reason.into(),
        }
    }
}
