//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for native hosts (desktop shells,
//! integration tests, headless tooling).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`, with retry and exponential backoff
//! - `SettingsStore` using a SQLite-backed key-value table
//!
//! Media primitives (`AudioElement`, `StreamWidgetHost`) have no native
//! default; they are provided by the embedding shell.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestHttpClient, SqliteSettingsStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let http = ReqwestHttpClient::new();
//!     let settings = SqliteSettingsStore::open("settings.db".into()).await.unwrap();
//! }
//! ```

mod http;
mod settings;

pub use http::ReqwestHttpClient;
pub use settings::SqliteSettingsStore;
