//! # Native Bridge Implementations
//!
//! Default implementation of the transport bridge for server processes.
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest` (rustls, connection pooling)
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_native::ReqwestHttpClient;
//! use bridge_traits::HttpClient;
//! use std::sync::Arc;
//!
//! let http_client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new()?);
//! ```

mod http;

pub use http::ReqwestHttpClient;
