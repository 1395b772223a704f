//! Error types and status codes

use thiserror::Error;

/// Status code returned by every job entry point on success.
pub const STATUS_OK: i32 = 0;

/// Error category, one per stable status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnsupportedFormat,
    CorruptData,
    Io,
    Encode,
    FormatMismatch,
    InvalidChannelIndex,
    InvalidRange,
    InvalidTarget,
    EmptyInput,
    Config,
}

impl ErrorKind {
    pub fn status_code(self) -> i32 {
        match self {
            ErrorKind::UnsupportedFormat => 1,
            ErrorKind::CorruptData => 2,
            ErrorKind::Io => 3,
            ErrorKind::Encode => 4,
            ErrorKind::FormatMismatch => 5,
            ErrorKind::InvalidChannelIndex => 6,
            ErrorKind::InvalidRange => 7,
            ErrorKind::InvalidTarget => 8,
            ErrorKind::EmptyInput => 9,
            ErrorKind::Config => 10,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::UnsupportedFormat => "unsupported-format",
            ErrorKind::CorruptData => "corrupt-data",
            ErrorKind::Io => "io",
            ErrorKind::Encode => "encode",
            ErrorKind::FormatMismatch => "format-mismatch",
            ErrorKind::InvalidChannelIndex => "invalid-channel-index",
            ErrorKind::InvalidRange => "invalid-range",
            ErrorKind::InvalidTarget => "invalid-target",
            ErrorKind::EmptyInput => "empty-input",
            ErrorKind::Config => "config",
        }
    }
}

/// Main error type
#[derive(Debug, Clone, Error)]
pub enum AudioForgeError {
    #[error("Unsupported format: {message}")]
    UnsupportedFormat { message: String },
    #[error("Corrupt data: {message}")]
    CorruptData { message: String },
    #[error("IO error: {message}")]
    Io { message: String },
    #[error("Encode error: {message}")]
    Encode { message: String },
    #[error("Format mismatch: {message}")]
    FormatMismatch { message: String },
    #[error("Invalid channel index: {message}")]
    InvalidChannelIndex { message: String },
    #[error("Invalid range: {message}")]
    InvalidRange { message: String },
    #[error("Invalid target: {message}")]
    InvalidTarget { message: String },
    #[error("Empty input: {message}")]
    EmptyInput { message: String },
    #[error("Config error: {message}")]
    Config { message: String },
}

impl AudioForgeError {
    pub fn unsupported_format<S: Into<String>>(msg: S) -> Self { Self::UnsupportedFormat { message: msg.into() } }
    pub fn corrupt_data<S: Into<String>>(msg: S) -> Self { Self::CorruptData { message: msg.into() } }
    pub fn io<S: Into<String>>(msg: S) -> Self { Self::Io { message: msg.into() } }
    pub fn encode<S: Into<String>>(msg: S) -> Self { Self::Encode { message: msg.into() } }
    pub fn format_mismatch<S: Into<String>>(msg: S) -> Self { Self::FormatMismatch { message: msg.into() } }
    pub fn invalid_channel<S: Into<String>>(msg: S) -> Self { Self::InvalidChannelIndex { message: msg.into() } }
    pub fn invalid_range<S: Into<String>>(msg: S) -> Self { Self::InvalidRange { message: msg.into() } }
    pub fn invalid_target<S: Into<String>>(msg: S) -> Self { Self::InvalidTarget { message: msg.into() } }
    pub fn empty_input<S: Into<String>>(msg: S) -> Self { Self::EmptyInput { message: msg.into() } }
    pub fn config<S: Into<String>>(msg: S) -> Self { Self::Config { message: msg.into() } }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            Self::CorruptData { .. } => ErrorKind::CorruptData,
            Self::Io { .. } => ErrorKind::Io,
            Self::Encode { .. } => ErrorKind::Encode,
            Self::FormatMismatch { .. } => ErrorKind::FormatMismatch,
            Self::InvalidChannelIndex { .. } => ErrorKind::InvalidChannelIndex,
            Self::InvalidRange { .. } => ErrorKind::InvalidRange,
            Self::InvalidTarget { .. } => ErrorKind::InvalidTarget,
            Self::EmptyInput { .. } => ErrorKind::EmptyInput,
            Self::Config { .. } => ErrorKind::Config,
        }
    }

    pub fn status_code(&self) -> i32 {
        self.kind().status_code()
    }
}

pub type Result<T> = std::result::Result<T, AudioForgeError>;

/// Collapse a job result into the integer status convention.
pub fn status_of<T>(result: &Result<T>) -> i32 {
    match result {
        Ok(_) => STATUS_OK,
        Err(e) => e.status_code(),
    }
}

impl From<std::io::Error> for AudioForgeError {
    fn from(err: std::io::Error) -> Self { Self::io(err.to_string()) }
}

impl From<tempfile::PersistError> for AudioForgeError {
    fn from(err: tempfile::PersistError) -> Self { Self::io(format!("cannot place output: {}", err.error)) }
}

impl From<hound::Error> for AudioForgeError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) => Self::io(e.to_string()),
            hound::Error::Unsupported => Self::unsupported_format("WAV variant not supported"),
            hound::Error::FormatError(msg) => Self::corrupt_data(format!("WAV: {}", msg)),
            other => Self::corrupt_data(format!("WAV: {}", other)),
        }
    }
}

impl From<symphonia::core::errors::Error> for AudioForgeError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        use symphonia::core::errors::Error as SymphoniaError;
        match err {
            SymphoniaError::IoError(e) => Self::io(e.to_string()),
            SymphoniaError::Unsupported(what) => Self::unsupported_format(what.to_string()),
            SymphoniaError::DecodeError(what) => Self::corrupt_data(what.to_string()),
            other => Self::corrupt_data(other.to_string()),
        }
    }
}
