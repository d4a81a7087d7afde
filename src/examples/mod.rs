//! Complete demo protocols built with the engine.
//!
//! The [door] module models a small door lock dialogue (open the channel,
//! authenticate with a code, upload a checksummed report, close) with the
//! client and server automata walking it. The integration tests run both
//! endpoints over an in-process channel pair.
pub mod door;

#[cfg(test)]
mod __tests__;
