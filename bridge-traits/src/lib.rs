//! # Transport Bridge Traits
//!
//! The seam between the broker and whatever actually moves bytes over the wire.
//!
//! ## Overview
//!
//! Every outbound call the broker makes (the CCG token exchange and the Box
//! content API) goes through [`HttpClient`](http::HttpClient). The production
//! implementation lives in `bridge-native` and wraps `reqwest`; tests substitute
//! a `mockall` double and script Box responses without touching the network.
//!
//! ## Error Handling
//!
//! Implementations report transport-level failures as
//! [`BridgeError`](error::BridgeError). A non-2xx status is *not* a transport
//! failure: it comes back as an [`HttpResponse`](http::HttpResponse) and the
//! caller decides what it means.
//!
//! ## Thread Safety
//!
//! `HttpClient` requires `Send + Sync` so a single instance can be shared across
//! request handlers behind an `Arc`.
//!
//! ## Example
//!
//! ```ignore
//! use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
//! use bridge_traits::error::Result;
//! use async_trait::async_trait;
//!
//! pub struct MyHttpClient {
//!     client: reqwest::Client,
//! }
//!
//! #[async_trait]
//! impl HttpClient for MyHttpClient {
//!     async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
//!         todo!()
//!     }
//! }
//! ```

pub mod error;
pub mod http;

pub use error::BridgeError;
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
