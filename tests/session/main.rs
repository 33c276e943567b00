//! MapSession integration tests.
//!
//! Everything runs against the in-process adapters; `http` spins up axum
//! mock servers for the HTTP adapters.

mod support;
mod routes;

#[cfg(feature = "http")]
mod http;
