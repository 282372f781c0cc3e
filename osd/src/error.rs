use thiserror::Error;

use crate::header::FontVariant;

#[derive(Error, Debug)]
pub enum OsdError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file header truncated: expected {expected} bytes, got {got}")]
    TruncatedHeader { expected: usize, got: usize },

    #[error("incorrect magic in file header: expected {expected:?}, got {got:?}")]
    BadMagic { expected: [u8; 7], got: [u8; 7] },

    #[error("invalid osd file version: expected {expected}, got {got}")]
    UnsupportedVersion { expected: u16, got: u16 },

    #[error("font variant {0:?} is not supported")]
    UnsupportedFontVariant(FontVariant),

    #[error("unknown font variant id {0}")]
    UnknownFontVariant(u8),

    #[error("frame rate must be greater than zero")]
    InvalidFps,

    #[error("unknown missing-value policy '{0}': expected one of prev, empty, skip")]
    InvalidPolicy(String),
}

pub type Result<T> = std::result::Result<T, OsdError>;
