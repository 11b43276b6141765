use thiserror::Error;

/// Crate-level error type.
///
/// Malformed markup payloads are fatal to the page view that selected them
/// and are surfaced to the caller rather than swallowed; everything that can
/// be recovered locally (a bad traffic percentage, partial persisted state)
/// never reaches this enum.
#[derive(Debug, Error)]
pub enum VariantsError {
    /// A markup payload attribute did not decode as a JSON string.
    #[error("malformed JSON payload in `{attribute}` attribute: {source}")]
    Payload {
        attribute: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The backing assignment store could not be read or written.
    #[error("assignment store I/O at {path}: {source}")]
    StoreIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The on-disk assignment store image was not valid JSON.
    #[error("corrupt assignment store at {path}: {source}")]
    StoreFormat {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// A settings document failed to parse.
    #[error("malformed settings document: {0}")]
    Settings(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, VariantsError>;
