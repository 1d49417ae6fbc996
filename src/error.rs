//! Error results that can occur working with ADFS disc images
#![warn(missing_docs)]
#![warn(unsafe_code)]
use std::{
    fmt::{Debug, Display, Formatter, Result},
    io,
};

/// An error that can occur when processing a disc image.
#[derive(PartialEq)]
pub struct Error {
    kind: ErrorKind,
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "{}", self.kind)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Create a new Error with a given ErrorKind variant
    pub fn new(kind: ErrorKind) -> Error {
        Error { kind }
    }

    /// Return the kind of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::new(ErrorKind::Io(e))
    }
}

/// The kinds of errors that can occur when processing a disc image.
///
/// Only [`ErrorKind::UnsupportedImage`] and [`ErrorKind::TruncatedImage`]
/// can terminate [`crate::disc::Disc::open`]; every other structural
/// problem is recorded in the disc's diagnostic log instead of being
/// propagated (see `spec.md` §7).
pub enum ErrorKind {
    /// Generic error type
    Message(String),

    /// An error that occurs while reading or writing data.
    Io(io::Error),

    /// The image length or signature bytes do not match any of the
    /// six recognised ADFS variants.
    UnsupportedImage(String),

    /// Fewer bytes are available than the identified variant requires.
    TruncatedImage(String),

    /// A directory frame failed its `Hugo`/`Nick` signature or
    /// end-of-sequence check, or a fragment map block ended in an
    /// unexpected byte. Recoverable: callers log this and continue.
    BrokenStructure(String),

    /// A SIN referenced a file number that isn't present in the
    /// fragment map.
    NotFound(String),

    /// A host-side I/O failure occurred while extracting files.
    Extraction(io::Error),
}

impl PartialEq for ErrorKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ErrorKind::Message(a), ErrorKind::Message(b)) => a == b,
            (ErrorKind::UnsupportedImage(a), ErrorKind::UnsupportedImage(b)) => a == b,
            (ErrorKind::TruncatedImage(a), ErrorKind::TruncatedImage(b)) => a == b,
            (ErrorKind::BrokenStructure(a), ErrorKind::BrokenStructure(b)) => a == b,
            (ErrorKind::NotFound(a), ErrorKind::NotFound(b)) => a == b,
            _ => false,
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            ErrorKind::Message(message) => write!(f, "An error occurred: {}", message),
            ErrorKind::Io(e) => write!(f, "{}", e),
            ErrorKind::UnsupportedImage(message) => write!(f, "Unsupported image: {}", message),
            ErrorKind::TruncatedImage(message) => write!(f, "Truncated image: {}", message),
            ErrorKind::BrokenStructure(message) => write!(f, "Broken structure: {}", message),
            ErrorKind::NotFound(message) => write!(f, "Data not found: {}", message),
            ErrorKind::Extraction(e) => write!(f, "Extraction error: {}", e),
        }
    }
}

impl ErrorKind {
    /// Return a new generic ErrorKind::Message with a given string message.
    pub fn new(message: &str) -> ErrorKind {
        ErrorKind::Message(message.to_string())
    }
}
