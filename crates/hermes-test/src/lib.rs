//! # Hermes Test
//!
//! In-memory testing for Hermes applications. A [`TestClient`] hands
//! requests straight to a [`Dispatcher`](hermes_server::Dispatcher): no socket,
//! no port, same routing, binding, validation and encoding as production.
//!
//! ## Example
//!
//! ```ignore
//! use hermes_test::TestClient;
//!
//! #[tokio::test]
//! async fn test_city_lookup() {
//!     let client = TestClient::new(app.dispatcher());
//!
//!     client
//!         .get("/resources/weather/get/byCity")
//!         .query("city", "Kiev")
//!         .send()
//!         .await
//!         .assert_status(200)
//!         .assert_content_type("application/json");
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::TestRequestBuilder;
pub use response::TestResponse;
