//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (marketplace REST APIs, supplier downloads,
//! file I/O). Each sub-module groups adapters by infrastructure concern.
//!
//! Adapter categories:
//! - `http`: shared rate-limited REST client
//! - `ozon`: Ozon Seller API client and auth
//! - `yandex`: Yandex.Market Partner API client and auth
//! - `feeds`: supplier stock list loading

pub mod feeds;
pub mod http;
pub mod ozon;
pub mod yandex;
