use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any client.
/// This is the customer-facing surface: a diner who scanned a table QR code
/// resolves the table, reads the menu, and places an order without ever
/// signing in.
///
/// Security Mandate:
/// Nothing here exposes management data. The one route in this module that
/// *does* require a session (GET /orders) authenticates inside its handler via
/// the `AuthUser` extractor; it lives here only because it shares the /orders
/// path with the anonymous order-placement POST.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load
        // balancer checks. Returns "ok" immediately.
        .route("/health", get(|| async { "ok" }))
        // GET /menu?branchId=...
        // The customer-facing menu for one branch, grouped by category. Only
        // available items of active categories appear.
        .route("/menu", get(handlers::get_menu))
        // GET /branches?restaurantId=...
        // The public branch directory backing the customer's branch picker.
        .route("/branches", get(handlers::get_branches))
        // GET /tables/qr/{qrCode}
        // Resolves a scanned table QR code string to the table and its
        // branch/restaurant context. 404 for codes that resolve to nothing.
        .route("/tables/qr/{qrCode}", get(handlers::get_table_by_qr))
        // POST /orders — anonymous order placement (validated, totals computed
        // server-side, status starts at PENDING).
        // GET /orders — staff order listing; authenticates via the AuthUser
        // extractor and applies the branch scope check in the handler.
        .route(
            "/orders",
            post(handlers::create_order).get(handlers::get_orders),
        )
}
