//! Storefront Console
//!
//! Walks through a typical session against a running storefront API:
//! sign in, browse the catalog, place an order, list orders. Failures are
//! printed the way an alert banner would show them.
//!
//! ## Usage
//!
//! ```bash
//! export STOREFRONT_BASE_URL="http://localhost:8080"
//! cargo run --bin storefront-console -- admin@example.com password
//! ```
//!
//! Set `RUST_LOG=storefront_client=debug` to see every dispatch.

use serde_json::json;
use storefront_client::{
    ActionError, Capability, ClientConfig, CreateOrderRequest, LoginRequest, Storefront,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let email = args.next().unwrap_or_else(|| "admin@example.com".to_string());
    let password = args.next().unwrap_or_else(|| "password".to_string());

    let config = ClientConfig::from_env()?;
    tracing::info!(base_url = %config.base_url, "connecting");
    let storefront = Storefront::connect(&config)?;

    println!("=== Storefront Console ===\n");

    // Catalog is public
    match storefront.list_products(0, 50).await {
        Ok(page) => print_log("products", &json!(page.items)),
        Err(e) => show_alert("GET /api/v1/products", &e),
    }

    // Signed-in actions before login are refused locally
    if let Err(e) = storefront.list_orders().await {
        show_alert("GET /api/v1/orders", &e);
    }

    match storefront.login(&LoginRequest::new(&email, password)).await {
        Ok(auth) => print_log(
            "login",
            &json!({
                "email": auth.email,
                "role": auth.role,
                "expiresInSeconds": auth.expires_in_seconds,
            }),
        ),
        Err(e) => {
            show_alert("POST /api/v1/auth/login", &e);
            return Ok(());
        }
    }

    let state = storefront.session().snapshot();
    println!(
        "Signed in as {} ({}), admin: {}\n",
        state.identity_label().unwrap_or("-"),
        state.role().map_or("-", |role| role.as_str()),
        storefront.session().has_capability(Capability::AdminOnly)
    );

    let first_product = storefront
        .list_products(0, 50)
        .await
        .ok()
        .and_then(|page| page.items.into_iter().next());

    if let Some(product) = first_product {
        println!("Order key: {}", storefront.pending_order_key());
        match storefront
            .create_order(&CreateOrderRequest::single(product.id, 1), None)
            .await
        {
            Ok(order) => print_log("createOrder", &json!(order)),
            Err(e) => show_alert("POST /api/v1/orders", &e),
        }
        println!("Next order key: {}\n", storefront.pending_order_key());
    }

    match storefront.list_orders().await {
        Ok(list) => print_log("orders", &json!(list.orders)),
        Err(e) => show_alert("GET /api/v1/orders", &e),
    }

    Ok(())
}

fn print_log(label: &str, payload: &serde_json::Value) {
    let pretty = serde_json::to_string_pretty(&json!({"label": label, "payload": payload}))
        .unwrap_or_default();
    println!("{pretty}\n");
}

fn show_alert(request: &str, error: &ActionError) {
    match error.failure() {
        Some(failure) => {
            let (method, path) = request.split_once(' ').unwrap_or(("", request));
            eprintln!("[error] {}", failure.status_line(method, path));
            eprintln!("        {}", failure.message());
            for detail in failure.details() {
                eprintln!("        - {detail}");
            }
        }
        None => eprintln!("[warning] {error}"),
    }
    eprintln!();
}
