/// Crate-level error types for reference sessions, indexing, and the CLI.
use std::path::PathBuf;

/// Every error names the token, leaf, or file it failed on so that the
/// dispatch boundary can log a useful line without a debugger.
#[allow(clippy::error_impl_error, reason = "crate-wide error type re-exported to hosts")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A backlink marker referred to an id that is not in the index.
    #[error("backlink not found: {id}")]
    BacklinkNotFound {
        /// Identity string carried by the marker.
        id: String,
    },

    /// `.backref.toml` parsed but holds an out-of-range value.
    #[error("invalid config: {reason}")]
    ConfigInvalid {
        /// Which key was rejected and why.
        reason: String,
    },

    /// A reference token could not be decoded into a location.
    #[error("malformed reference token `{token}`: {reason}")]
    Decode {
        /// What part of the grammar was violated.
        reason: String,
        /// The raw token text.
        token: String,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON serialization failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped serde_json error.
        #[from]
        serde_json::Error,
    ),

    /// The workspace has no usable view for a leaf or element the caller expected to exist.
    #[error("leaf not found: {leaf}")]
    LeafNotFound {
        /// Leaf or element identity that failed to resolve.
        leaf: String,
    },

    /// A document vanished between being listed and being read.
    #[error("missing file: {}", path.display())]
    MissingFile {
        /// Vault-relative path of the vanished document.
        path: PathBuf,
    },

    /// The referenced text could not be located in the rendered document.
    #[error("text `{text}` not found in {}", file.display())]
    PositionNotFound {
        /// Document that was searched.
        file: PathBuf,
        /// Text that was searched for.
        text: String,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// The filesystem watcher could not be set up.
    #[error("watch: {reason}")]
    Watch {
        /// Description of the watcher failure.
        reason: String,
    },
}

impl Error {
    /// Shorthand for a `Decode` error on `token`.
    pub fn decode(token: &str, reason: &str) -> Self {
        return Self::Decode {
            reason: reason.to_string(),
            token: token.to_string(),
        };
    }
}
