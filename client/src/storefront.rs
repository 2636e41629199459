//! Storefront actions
//!
//! [`Storefront`] is the root context for one user session. It owns the
//! [`Session`], the key generator and the dispatcher, and exposes one async
//! method per user action. Each method follows the same pattern:
//!
//! 1. Actions that need a credential check the session first and fail with
//!    [`ActionError::AuthenticationRequired`] without touching the network.
//! 2. The request is dispatched and its [`Outcome`](crate::Outcome) decoded.
//! 3. Register and login apply the returned identity to the session; nothing
//!    else writes to it, except clearing it when the server answers 401.

use crate::api::{
    endpoints, AuthResponse, CreateOrderRequest, CreateProductRequest, LoginRequest, Order,
    OrderList, Product, ProductPage, RegisterRequest, StockAdjustRequest,
};
use crate::clock::{Clock, SystemClock};
use crate::config::{ClientConfig, ConfigError};
use crate::dispatcher::Dispatcher;
use crate::error::{ActionError, Result};
use crate::idempotency::{IdempotencyKey, KeyGenerator};
use crate::normalize::Outcome;
use crate::request::RequestDescriptor;
use crate::session::{Identity, Role, Session};
use crate::transport::{ReqwestTransport, Transport};
use chrono::Duration;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::{Mutex, PoisonError};

/// Root context for a storefront session
pub struct Storefront<T, C = SystemClock> {
    dispatcher: Dispatcher<T>,
    keys: KeyGenerator,
    clock: C,
    pending_order_key: Mutex<IdempotencyKey>,
}

impl Storefront<ReqwestTransport> {
    /// Connect to the API described by `config`
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or the HTTP client
    /// cannot be built
    pub fn connect(config: &ClientConfig) -> std::result::Result<Self, ConfigError> {
        let transport = ReqwestTransport::from_config(config)?;
        Ok(Self::new(transport, config.base_url.clone()))
    }
}

impl<T: Transport> Storefront<T> {
    /// Create a storefront over any transport, using the system clock
    #[must_use]
    pub fn new(transport: T, base_url: impl Into<String>) -> Self {
        Self::with_clock(transport, base_url, SystemClock)
    }
}

impl<T: Transport, C: Clock> Storefront<T, C> {
    /// Create a storefront with an explicit clock
    #[must_use]
    pub fn with_clock(transport: T, base_url: impl Into<String>, clock: C) -> Self {
        let keys = KeyGenerator::new();
        let pending_order_key = Mutex::new(keys.generate());
        Self {
            dispatcher: Dispatcher::new(transport, base_url, Session::new()),
            keys,
            clock,
            pending_order_key,
        }
    }

    /// The session shared with the dispatcher
    #[must_use]
    pub const fn session(&self) -> &Session {
        self.dispatcher.session()
    }

    /// The dispatcher, for requests not covered by an action
    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher<T> {
        &self.dispatcher
    }

    /// Create an account and sign in as it
    ///
    /// # Errors
    ///
    /// Returns `ActionError::Failed` if the server rejects the registration
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        let descriptor = Self::with_body(RequestDescriptor::post(endpoints::REGISTER), request)?;
        let response: AuthResponse = self.call(&descriptor).await?;
        self.apply_identity(&response)?;
        Ok(response)
    }

    /// Sign in
    ///
    /// # Errors
    ///
    /// Returns `ActionError::Failed` if the credentials are rejected
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse> {
        let descriptor = Self::with_body(RequestDescriptor::post(endpoints::LOGIN), request)?;
        let response: AuthResponse = self.call(&descriptor).await?;
        self.apply_identity(&response)?;
        Ok(response)
    }

    /// Drop the credential
    pub fn sign_out(&self) {
        self.session().clear();
    }

    /// One page of the catalog; does not require sign-in
    ///
    /// # Errors
    ///
    /// Returns `ActionError::Failed` if the request fails
    pub async fn list_products(&self, page: u32, size: u32) -> Result<ProductPage> {
        self.call(&RequestDescriptor::get(endpoints::product_page(page, size)))
            .await
    }

    /// A single product; does not require sign-in
    ///
    /// # Errors
    ///
    /// Returns `ActionError::Failed` if the request fails
    pub async fn get_product(&self, product_id: i64) -> Result<Product> {
        self.call(&RequestDescriptor::get(endpoints::product(product_id)))
            .await
    }

    /// Create a product (admin)
    ///
    /// # Errors
    ///
    /// Returns `ActionError::AuthenticationRequired` when signed out, or
    /// `ActionError::Failed` if the server rejects the request
    pub async fn create_product(&self, request: &CreateProductRequest) -> Result<Product> {
        self.ensure_authenticated("create_product")?;
        let descriptor =
            Self::with_body(RequestDescriptor::post(endpoints::ADMIN_PRODUCTS), request)?;
        self.call_signed_in(&descriptor).await
    }

    /// Add or remove stock (admin)
    ///
    /// # Errors
    ///
    /// Returns `ActionError::AuthenticationRequired` when signed out, or
    /// `ActionError::Failed` if the server rejects the adjustment
    pub async fn adjust_stock(&self, product_id: i64, quantity_delta: i64) -> Result<Product> {
        self.ensure_authenticated("adjust_stock")?;
        let descriptor = Self::with_body(
            RequestDescriptor::post(endpoints::stock_adjust(product_id)),
            &StockAdjustRequest { quantity_delta },
        )?;
        self.call_signed_in(&descriptor).await
    }

    /// Place an order
    ///
    /// Uses `key`, trimmed, when given and non-blank, otherwise the pending
    /// order key.
    /// Once the attempt completes, successfully or not, a fresh pending key
    /// is minted so the next submission never reuses this one.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::AuthenticationRequired` when signed out, or
    /// `ActionError::Failed` if the server rejects the order
    pub async fn create_order(
        &self,
        request: &CreateOrderRequest,
        key: Option<IdempotencyKey>,
    ) -> Result<Order> {
        self.ensure_authenticated("create_order")?;

        let key = key
            .map(|key| key.as_str().trim().to_string())
            .filter(|key| !key.is_empty())
            .map_or_else(|| self.pending_order_key(), IdempotencyKey::new);
        let descriptor = Self::with_body(RequestDescriptor::post(endpoints::ORDERS), request)?
            .with_idempotency_key(&key);

        let result = self.call_signed_in(&descriptor).await;
        self.regenerate_order_key();
        result
    }

    /// The caller's orders
    ///
    /// # Errors
    ///
    /// Returns `ActionError::AuthenticationRequired` when signed out, or
    /// `ActionError::Failed` if the request fails
    pub async fn list_orders(&self) -> Result<OrderList> {
        self.ensure_authenticated("list_orders")?;
        self.call_signed_in(&RequestDescriptor::get(endpoints::ORDERS)).await
    }

    /// A single order
    ///
    /// # Errors
    ///
    /// Returns `ActionError::AuthenticationRequired` when signed out, or
    /// `ActionError::Failed` if the request fails
    pub async fn get_order(&self, order_id: i64) -> Result<Order> {
        self.ensure_authenticated("get_order")?;
        self.call_signed_in(&RequestDescriptor::get(endpoints::order(order_id)))
            .await
    }

    /// Cancel an order
    ///
    /// # Errors
    ///
    /// Returns `ActionError::AuthenticationRequired` when signed out, or
    /// `ActionError::Failed` if the server refuses the cancellation
    pub async fn cancel_order(&self, order_id: i64) -> Result<Order> {
        self.ensure_authenticated("cancel_order")?;
        self.call_signed_in(&RequestDescriptor::post(endpoints::cancel_order(order_id)))
            .await
    }

    /// Key the next order submission will use unless the caller supplies one
    #[must_use]
    pub fn pending_order_key(&self) -> IdempotencyKey {
        self.pending_order_key
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the pending order key and return the new one
    pub fn regenerate_order_key(&self) -> IdempotencyKey {
        let key = self.keys.generate();
        *self
            .pending_order_key
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = key.clone();
        key
    }

    /// Cooperative guard for signed-in actions
    fn ensure_authenticated(&self, action: &'static str) -> Result<()> {
        let session = self.session();

        if session.clear_if_expired(&self.clock) {
            tracing::info!(action, "access token expired");
        }

        if session.is_authenticated() {
            Ok(())
        } else {
            tracing::warn!(action, "authentication required");
            Err(ActionError::AuthenticationRequired)
        }
    }

    fn with_body<B: Serialize>(descriptor: RequestDescriptor, body: &B) -> Result<RequestDescriptor> {
        descriptor
            .with_body(body)
            .map_err(|e| ActionError::UnexpectedPayload(format!("request body: {e}")))
    }

    fn apply_identity(&self, response: &AuthResponse) -> Result<()> {
        if response.access_token.is_empty() {
            tracing::warn!("auth response carried no access token");
            return Err(ActionError::UnexpectedPayload("empty access token".to_string()));
        }

        let mut identity = Identity::new(
            response.access_token.clone(),
            response.role.as_deref().map(Role::parse),
            Some(response.email.clone()),
        );
        let expires_at = response
            .expires_in_seconds
            .and_then(Duration::try_seconds)
            .and_then(|ttl| self.clock.now().checked_add_signed(ttl));
        if let Some(expires_at) = expires_at {
            identity = identity.with_expiry(expires_at);
        }
        self.session().replace(identity);
        Ok(())
    }

    async fn call<R: DeserializeOwned>(&self, descriptor: &RequestDescriptor) -> Result<R> {
        match self.dispatcher.dispatch(descriptor).await {
            Outcome::Success { payload } => serde_json::from_value(payload).map_err(|e| {
                tracing::warn!(path = descriptor.path(), error = %e, "unexpected payload");
                ActionError::UnexpectedPayload(e.to_string())
            }),
            Outcome::Failure(failure) => Err(ActionError::Failed(failure)),
        }
    }

    /// Like `call`, for requests made on behalf of a signed-in user
    ///
    /// A 401 means the server no longer accepts the token that was sent. The
    /// session is cleared only if it still holds that token.
    async fn call_signed_in<R: DeserializeOwned>(
        &self,
        descriptor: &RequestDescriptor,
    ) -> Result<R> {
        let sent_token = self.session().token();
        let result = self.call(descriptor).await;
        if let (Err(ActionError::Failed(failure)), Some(token)) = (&result, sent_token) {
            if failure.is_unauthorized() && self.session().clear_if_token(&token) {
                tracing::info!("server rejected the access token");
            }
        }
        result
    }
}
