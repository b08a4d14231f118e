use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The project snapshot contains data that cannot be encoded at all.
    #[error("malformed project: {0}")]
    MalformedProject(String),

    /// A value does not fit the fixed-width field or page it is destined for.
    #[error("unsupported size: {what} is {value}, at most {max} is supported")]
    UnsupportedSize {
        what: String,
        value: usize,
        max: usize,
    },

    /// A resource image that does not parse back.
    #[error("malformed resource image: {0}")]
    MalformedImage(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid project json: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn unsupported(what: impl Into<String>, value: usize, max: usize) -> Self {
        Error::UnsupportedSize {
            what: what.into(),
            value,
            max,
        }
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedProject(msg.into())
    }
}
