//! Interaction-to-code engine: anchors stable test identifiers into JSX
//! sources from recorded UI sessions and compiles the same sessions into
//! Playwright test scripts.

pub mod cli;
pub mod codegen;
pub mod error;
pub mod insertion;
pub mod naming;
pub mod pipeline;
pub mod recording;
pub mod report;
pub mod source;
pub mod trace;
