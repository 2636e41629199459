//! Commerce API request and response types
//!
//! Field names are camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request to create an account
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Display name
    pub name: String,
    /// Email address, also the login
    pub email: String,
    /// Plain-text password
    pub password: String,
}

impl RegisterRequest {
    /// Create a register request, trimming name and email
    #[must_use]
    pub fn new(name: &str, email: &str, password: impl Into<String>) -> Self {
        Self {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            password: password.into(),
        }
    }
}

/// Request to obtain an access token
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Email address
    pub email: String,
    /// Plain-text password
    pub password: String,
}

impl LoginRequest {
    /// Create a login request, trimming the email
    #[must_use]
    pub fn new(email: &str, password: impl Into<String>) -> Self {
        Self {
            email: email.trim().to_string(),
            password: password.into(),
        }
    }
}

/// Successful register/login response
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// Server-side user id
    #[serde(default)]
    pub user_id: Option<i64>,
    /// Email address
    pub email: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Role, e.g. `ADMIN`
    #[serde(default)]
    pub role: Option<String>,
    /// Bearer token
    pub access_token: String,
    /// Token lifetime
    #[serde(default)]
    pub expires_in_seconds: Option<i64>,
}

/// Admin request to create a product with initial stock
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    /// Stock keeping unit
    pub sku: String,
    /// Product name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Unit price
    pub price: f64,
    /// Stock on hand after creation
    pub initial_quantity: i64,
}

/// Admin request to change stock by a signed amount
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustRequest {
    /// Amount to add (negative to remove)
    pub quantity_delta: i64,
}

/// A catalog product with its current stock
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Product id
    pub id: i64,
    /// Stock keeping unit
    pub sku: String,
    /// Product name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Unit price
    pub price: f64,
    /// Stock on hand
    pub quantity: i64,
}

/// One page of the product catalog
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    /// Products on this page
    #[serde(default)]
    pub items: Vec<Product>,
    /// Products across all pages
    #[serde(default)]
    pub total_elements: u64,
    /// Number of pages
    #[serde(default)]
    pub total_pages: u32,
    /// Zero-based page index
    #[serde(default)]
    pub page: u32,
    /// Page size
    #[serde(default)]
    pub size: u32,
}

/// One line of an order request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    /// Product to order
    pub product_id: i64,
    /// Units to order
    pub quantity: u32,
}

/// Request to place an order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    /// Order lines
    pub items: Vec<OrderItemRequest>,
}

impl CreateOrderRequest {
    /// Order a single product
    #[must_use]
    pub fn single(product_id: i64, quantity: u32) -> Self {
        Self {
            items: vec![OrderItemRequest {
                product_id,
                quantity,
            }],
        }
    }
}

/// Order lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Placed
    Created,
    /// Cancelled by the customer
    Cancelled,
    /// A status this client does not know about
    #[serde(other)]
    Unknown,
}

/// One line of a placed order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Product ordered
    pub product_id: i64,
    /// Units ordered
    pub quantity: u32,
    /// Unit price at order time
    pub price: f64,
    /// `price * quantity`
    pub line_amount: f64,
}

/// A placed order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Order id
    pub id: i64,
    /// Current status
    pub status: OrderStatus,
    /// Sum of line amounts
    pub total_amount: f64,
    /// Key the order was submitted with
    #[serde(default)]
    pub idempotency_key: Option<String>,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Order lines
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

/// The caller's orders
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderList {
    /// Orders, newest first as returned by the server
    #[serde(default)]
    pub orders: Vec<Order>,
}

/// Error envelope returned by the API on non-2xx responses
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Server time of the failure
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Request path
    #[serde(default)]
    pub path: Option<String>,
    /// Machine-readable code, e.g. `VALIDATION_ERROR`
    #[serde(default)]
    pub code: Option<String>,
    /// Human-readable message
    #[serde(default)]
    pub message: Option<String>,
    /// Per-field details
    #[serde(default)]
    pub details: Vec<String>,
}

/// Request paths
pub mod endpoints {
    /// Account registration
    pub const REGISTER: &str = "/api/v1/auth/register";
    /// Token issuance
    pub const LOGIN: &str = "/api/v1/auth/login";
    /// Product catalog
    pub const PRODUCTS: &str = "/api/v1/products";
    /// Admin product creation
    pub const ADMIN_PRODUCTS: &str = "/api/v1/admin/products";
    /// Orders of the current user
    pub const ORDERS: &str = "/api/v1/orders";

    /// Catalog page
    #[must_use]
    pub fn product_page(page: u32, size: u32) -> String {
        format!("{PRODUCTS}?page={page}&size={size}")
    }

    /// Single product
    #[must_use]
    pub fn product(product_id: i64) -> String {
        format!("{PRODUCTS}/{product_id}")
    }

    /// Stock adjustment for a product
    #[must_use]
    pub fn stock_adjust(product_id: i64) -> String {
        format!("{ADMIN_PRODUCTS}/{product_id}/stock-adjust")
    }

    /// Single order
    #[must_use]
    pub fn order(order_id: i64) -> String {
        format!("{ORDERS}/{order_id}")
    }

    /// Order cancellation
    #[must_use]
    pub fn cancel_order(order_id: i64) -> String {
        format!("{ORDERS}/{order_id}/cancel")
    }
}
