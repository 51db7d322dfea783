//! Web front-end for a source code analysis engine.
//!
//! Selections made in the browser are mapped to byte offsets
//! ([`position`]), every file read and query is checked against the loaded
//! scope ([`gate`], [`scope`]) and forwarded to the engine ([`engine`]), and
//! answers are rendered as plain text or JSON ([`format`]).

pub mod cli;
pub mod engine;
pub mod error;
pub mod format;
pub mod gate;
pub mod position;
pub mod scope;
pub mod service;
pub mod telemetry;
