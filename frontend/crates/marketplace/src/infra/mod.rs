//! Infrastructure Layer

pub mod rest;

pub use rest::BaasMarketGateway;
