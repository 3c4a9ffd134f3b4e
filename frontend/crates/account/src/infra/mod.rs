//! Infrastructure Layer
//!
//! Gateway implementations backed by the hosted backend.

pub mod rest;

pub use rest::BaasAccountGateway;
