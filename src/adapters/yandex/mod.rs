//! Yandex.Market Partner API Adapter
//!
//! Implements the `MarketplaceClient` port for one campaign. An account
//! usually runs several campaigns (FBS, DBS), each with its own
//! warehouse; build one client per campaign.
//!
//! Sub-modules:
//! - `auth`: Bearer token
//! - `client`: Offer mapping listing and price/stock updates
//! - `types`: API request/response type definitions

pub mod auth;
pub mod client;
pub mod types;

pub use auth::MarketToken;
pub use client::{Campaign, YandexLimits, YandexMarketClient};
