use thiserror::Error;

#[derive(Debug, Error)]
pub enum VtrimError {
    #[error("source unreadable: {path}: {reason}")]
    SourceUnreadable { path: String, reason: String },
    #[error("video too short: need {needed_secs}s, got {actual_secs}s")]
    InsufficientLength { needed_secs: f64, actual_secs: f64 },
    #[error("feature dimension mismatch: store has {expected}, fingerprint has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("sample rate mismatch: store uses {expected}fps, fingerprint uses {actual}fps")]
    SampleRateMismatch { expected: f64, actual: f64 },
    #[error("corrupt store: {0}")]
    CorruptStore(String),
    #[error("unsupported store version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("ffmpeg exited with status {status}: {stderr}")]
    Ffmpeg { status: i32, stderr: String },
}

pub type Result<T> = std::result::Result<T, VtrimError>;
