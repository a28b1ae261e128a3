use std::fmt;

#[derive(Debug)]
pub enum ToneError {
    /// The host has no output device to open.
    NoOutputDevice,
    /// The device only offers a sample format the renderer cannot write.
    UnsupportedFormat { format: String },
    /// Negotiating or building the output stream failed.
    StreamBuild(String),
    /// The platform refused to start (or restart) playback.
    ResumeRejected(String),
    /// The platform refused to pause playback.
    SuspendRejected(String),
    /// The engine was closed; a closed context cannot be reopened.
    ContextClosed,
    InvalidConfig { field: &'static str, reason: String },
    InvalidNote { text: String },
    Json(serde_json::Error),
    Io(std::io::Error),
}

impl fmt::Display for ToneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToneError::NoOutputDevice => write!(f, "No audio output device available"),
            ToneError::UnsupportedFormat { format } => {
                write!(f, "Unsupported output sample format '{format}'")
            }
            ToneError::StreamBuild(msg) => write!(f, "Failed to build output stream: {msg}"),
            ToneError::ResumeRejected(msg) => write!(f, "Output context refused to resume: {msg}"),
            ToneError::SuspendRejected(msg) => {
                write!(f, "Output context refused to suspend: {msg}")
            }
            ToneError::ContextClosed => write!(f, "Output context is closed"),
            ToneError::InvalidConfig { field, reason } => {
                write!(f, "Invalid config value for '{field}': {reason}")
            }
            ToneError::InvalidNote { text } => write!(f, "Invalid note '{text}'"),
            ToneError::Json(e) => write!(f, "JSON error: {e}"),
            ToneError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for ToneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ToneError::Json(e) => Some(e),
            ToneError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ToneError {
    fn from(e: serde_json::Error) -> Self {
        ToneError::Json(e)
    }
}

impl From<std::io::Error> for ToneError {
    fn from(e: std::io::Error) -> Self {
        ToneError::Io(e)
    }
}

#[cfg(feature = "native")]
mod cpal_conversions {
    use super::ToneError;

    impl From<cpal::DefaultStreamConfigError> for ToneError {
        fn from(e: cpal::DefaultStreamConfigError) -> Self {
            ToneError::StreamBuild(e.to_string())
        }
    }

    impl From<cpal::BuildStreamError> for ToneError {
        fn from(e: cpal::BuildStreamError) -> Self {
            ToneError::StreamBuild(e.to_string())
        }
    }

    impl From<cpal::PlayStreamError> for ToneError {
        fn from(e: cpal::PlayStreamError) -> Self {
            ToneError::ResumeRejected(e.to_string())
        }
    }

    impl From<cpal::PauseStreamError> for ToneError {
        fn from(e: cpal::PauseStreamError) -> Self {
            ToneError::SuspendRejected(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_field() {
        let e = ToneError::InvalidConfig {
            field: "voice.duration",
            reason: "must be positive".to_string(),
        };
        let text = format!("{e}");
        assert!(text.contains("voice.duration"), "got {text}");
        assert!(text.contains("must be positive"), "got {text}");
    }

    #[test]
    fn json_errors_convert_and_keep_source() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let e: ToneError = parse.unwrap_err().into();
        assert!(matches!(e, ToneError::Json(_)));
        assert!(std::error::Error::source(&e).is_some());
    }
}
