//! BaaS Client
//!
//! Typed access to the hosted backend the marketplace runs on:
//! - `auth` - password and OAuth (PKCE) sign-in, sign-up, recovery, refresh
//! - `rest` + `query` - table reads and writes with filter/order/range
//! - `storage` - private file buckets and signed URLs
//! - `functions` - serverless function invocation
//! - `realtime` - row change subscriptions
//!
//! Every request goes through one [`BaasClient`], which carries the project
//! key and the current user's access token.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod functions;
pub mod query;
pub mod realtime;
pub mod rest;
pub mod storage;

pub use auth::{AuthUser, OAuthProvider, Session, SignUpOutcome, UserAttributes};
pub use client::BaasClient;
pub use config::BaasConfig;
pub use error::{BaasError, BaasResult};
pub use query::{Order, Query};
pub use realtime::{
    ChangeEvent, ChangeFeed, ColumnFilter, PollingChangeFeed, RowChange, RowSource, Subscription,
};
