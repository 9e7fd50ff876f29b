//! learn / cut 入口 - 围绕核心的批处理薄层

pub mod cut;
pub mod learn;

pub use cut::{cut, CutReport, CutRequest, NoMatchAction};
pub use learn::{learn, LearnRequest};
