//! Ozon Seller API Adapter
//!
//! Implements the `MarketplaceClient` port for an Ozon store.
//!
//! Sub-modules:
//! - `auth`: Client-Id / Api-Key credentials
//! - `client`: Product listing and price/stock imports
//! - `types`: API request/response type definitions

pub mod auth;
pub mod client;
pub mod types;

pub use auth::OzonCredentials;
pub use client::{OzonClient, OzonLimits};
