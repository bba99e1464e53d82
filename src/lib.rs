//! Interactive console client for a remote eval endpoint.
//!
//! The binary wires four pieces together: a readiness watch that blocks until
//! the endpoint is reachable, a transcript that records every command and its
//! outcome in order, a console session that correlates in-flight requests to
//! the commands that issued them, and an HTTP transport that performs one
//! POST per command.

pub mod cli;
pub mod config;
pub mod eval;
pub mod ready;
pub mod session;
pub mod transcript;
