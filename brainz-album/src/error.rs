//! Error types for brainz-album

use thiserror::Error;

/// Result type for catalog operations
pub type MbResult<T> = Result<T, MbError>;

/// Failure while walking a response document
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    /// Stream ended while `element` was still open
    #[error("Unexpected end of document inside <{element}>")]
    UnexpectedEof { element: String },
}

/// MusicBrainz client errors
#[derive(Debug, Error)]
pub enum MbError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Decode error: {0}")]
    DecodeError(#[from] DecodeError),

    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),
}
