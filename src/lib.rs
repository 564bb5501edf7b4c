//! skill-router - prompt-time skill routing for Claude Code hooks.
//!
//! Reads a single `{"prompt": "..."}` object from stdin, scores every skill
//! in a registry against it via a five-layer signal engine, and writes at
//! most one `{"systemMessage": "..."}` object to stdout. Deterministic,
//! offline-capable, and designed to never block the caller: any internal
//! failure collapses into an empty, successful exit.

pub mod cache;
pub mod config;
pub mod errors;
pub mod language;
pub mod model;
pub mod registry;
pub mod router;
pub mod scoring;
pub mod selector;
