/// Result alias that carries the shared [`RigError`] type.
pub type Result<T> = std::result::Result<T, RigError>;

/// Common error type for the core crate.
///
/// Every fallible entry point of the engine resolves to one of these
/// variants; the `Display` form doubles as the human-readable status
/// message surfaced to the UI layer.
#[derive(Debug, thiserror::Error)]
pub enum RigError {
    /// The supplied bytes could not be decoded as audio.
    #[error("audio decode failed: {0}")]
    Decode(String),
    /// Playback cannot start: no asset is loaded, the output backend refused
    /// to activate, or a recording session currently holds the transport.
    #[error("playback unavailable: {0}")]
    PlaybackUnavailable(String),
    /// A recording was requested before its prerequisites were in place.
    #[error("not ready to record: {0}")]
    NotReady(String),
    /// The platform cannot produce or convert to the requested media format.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    /// A recording session failed while capturing, encoding or transcoding.
    /// Wraps the underlying cause.
    #[error("export failed: {0}")]
    Export(#[source] Box<RigError>),
    /// The speech synthesis collaborator failed.
    #[error("speech synthesis failed: {0}")]
    Synthesis(String),
    /// The audio track extraction collaborator failed.
    #[error("audio extraction failed: {0}")]
    Extraction(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Internal faults that do not fit the taxonomy above (poisoned locks,
    /// encoder bookkeeping, config parsing).
    #[error("{0}")]
    Message(String),
}

impl RigError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    /// Wraps any failure as the underlying cause of a failed export.
    pub fn export(cause: RigError) -> Self {
        Self::Export(Box::new(cause))
    }
}

impl From<&str> for RigError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for RigError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
