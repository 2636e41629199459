//! # Storefront Client
//!
//! Client library for the storefront commerce API: authentication, product
//! catalog, stock adjustment and order placement.
//!
//! The library is the orchestration layer between a user interface and the
//! API. It holds the session credential, attaches `Authorization` and
//! `Idempotency-Key` headers, mints idempotency keys, and folds every kind of
//! failure into one [`Failure`] shape.
//!
//! ## Example
//!
//! ```no_run
//! use storefront_client::{ClientConfig, CreateOrderRequest, LoginRequest, Storefront};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let storefront = Storefront::connect(&ClientConfig::from_env()?)?;
//!
//!     storefront.login(&LoginRequest::new("admin@example.com", "password")).await?;
//!
//!     let page = storefront.list_products(0, 50).await?;
//!     if let Some(product) = page.items.first() {
//!         let order = storefront
//!             .create_order(&CreateOrderRequest::single(product.id, 1), None)
//!             .await?;
//!         println!("placed order {}", order.id);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Layers
//!
//! - [`KeyGenerator`]: idempotency keys
//! - [`Session`]: in-memory credential and identity
//! - [`Dispatcher`]: issues requests, always resolves to an [`Outcome`]
//! - [`normalize`](normalize::normalize): failure normalization
//! - [`Storefront`]: one method per user action, with the sign-in guard

pub mod api;
pub mod clock;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod idempotency;
pub mod mocks;
pub mod normalize;
pub mod request;
pub mod session;
pub mod storefront;
pub mod transport;

// Re-export main types for convenience
pub use api::{
    AuthResponse, CreateOrderRequest, CreateProductRequest, LoginRequest, Order, OrderItem,
    OrderItemRequest, OrderList, OrderStatus, Product, ProductPage, RegisterRequest,
    StockAdjustRequest,
};
pub use config::{ClientConfig, ConfigError};
pub use dispatcher::Dispatcher;
pub use error::ActionError;
pub use idempotency::{IdempotencyKey, KeyGenerator};
pub use normalize::{Failure, FailureKind, Outcome, ResponseBody};
pub use request::{Method, RequestDescriptor, IDEMPOTENCY_KEY_HEADER};
pub use session::{Capability, Identity, Role, Session, SessionState};
pub use storefront::Storefront;
pub use transport::{ReqwestTransport, Transport};
