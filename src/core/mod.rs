pub mod config;
pub mod error;
pub mod fingerprint;
pub mod frame;
pub mod matcher;
pub mod probe;
pub mod sampler;
pub mod store;
pub mod trimmer;

pub use config::{MatchConfig, SampleConfig, SnapPolicy};
pub use error::{Result, VtrimError};
pub use fingerprint::{FeatureVector, Fingerprint, Fingerprinter, MetricKind};
pub use frame::Frame;
pub use matcher::{MatchResult, Matcher};
pub use sampler::FrameSampler;
pub use store::SignatureStore;
pub use trimmer::TrimMode;
