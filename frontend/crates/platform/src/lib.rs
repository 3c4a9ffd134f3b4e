//! Platform Crate - Client-side technical foundations
//!
//! This crate provides the pieces every feature crate leans on:
//! - Cryptographic helpers (SHA-1/SHA-256, Base64, random tokens)
//! - Password strength scoring, composition policy, and breach lookup
//! - Rate limit decisions with fail-open semantics
//! - Durable key-value storage and the form-draft autosave built on it
//! - A transient query cache with prefix invalidation

pub mod cache;
pub mod crypto;
pub mod draft;
pub mod password;
pub mod rate_limit;
pub mod storage;
