use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Defines the routes exclusively accessible to the SUPER_ADMIN role, nested
/// under `/admin`. These endpoints provide system-wide oversight across every
/// restaurant and branch.
///
/// Access Control:
/// Handlers here resolve the identity via the `AuthUser` extractor and then
/// explicitly require the SUPER_ADMIN role; there is no scope narrower than
/// "the whole system" at this tier.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/super/stats
        // System-wide dashboard metrics: restaurant/branch/user/order totals
        // and the most recent orders across all branches.
        .route("/super/stats", get(handlers::get_super_stats))
}
