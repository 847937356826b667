//! Remote Service Access
//!
//! The HTTP implementation of the `SiteApi` collaborator.

pub mod http_api;

pub use http_api::{HttpSiteApi, HttpSiteApiConfig};
