//! Code execution and evaluation engine for exam submissions.
//!
//! [`Engine`] is the entry point: it probes toolchains, runs a submission
//! against ad-hoc input, or scores it against a list of test cases.
pub mod adapters;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod probe;
pub mod process;
pub mod rewrite;
pub mod screening;
pub mod workspace;

pub use engine::Engine;
pub use error::EngineError;
