use thiserror::Error;

/// Errors raised by the fallible edges of the editor: encoding, file I/O,
/// session files, configuration and gesture scripts.
///
/// Drawing operations themselves never fail; out-of-bounds input clips.
#[derive(Debug, Error)]
pub enum SketchError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("session file error: {0}")]
    Session(String),

    #[error("invalid color specification '{0}'")]
    InvalidColorSpecification(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("script error: {0}")]
    Script(String),
}

impl From<Box<bincode::ErrorKind>> for SketchError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        SketchError::Session(e.to_string())
    }
}

pub type SketchResult<T> = Result<T, SketchError>;
