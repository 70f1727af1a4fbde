use crate::{AppState, handlers};
use axum::{
    Router,
    routing::get,
};

/// Authenticated Router Module
///
/// Defines the staff-side routes: everything here sits behind the `AuthUser`
/// extractor middleware layered on top of this router, so every handler
/// receives a resolved identity (role + restaurant/branch affiliation).
///
/// Access Control Strategy:
/// Authentication happens in the middleware layer; authorization happens in
/// the handlers, which run the role and scope checks from `rbac` against the
/// target resource's owning branch/restaurant before touching the repository.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Orders ---
        // GET /orders/{id}
        // A single order with its line items; the acting identity must be in
        // scope for the order's branch.
        // PATCH /orders/{id}
        // Advances the order's lifecycle. The transition is validated against
        // the state graph and the write is guarded by the version counter.
        .route(
            "/orders/{id}",
            get(handlers::get_order).patch(handlers::update_order_status),
        )
        // --- Branch Dashboards ---
        // GET /branches/{id}
        // Branch detail with tables for the branch-management screen.
        .route("/branches/{id}", get(handlers::get_branch))
        // GET /branches/{id}/stats
        // Aggregate counters plus a bounded recent-orders list.
        .route("/branches/{id}/stats", get(handlers::get_branch_stats))
        // GET /branches/{id}/staff-stats
        // Today's workload counters for the kitchen/floor dashboard.
        .route(
            "/branches/{id}/staff-stats",
            get(handlers::get_branch_staff_stats),
        )
        // --- Restaurant Dashboards ---
        // GET /restaurants/{id}
        // Restaurant detail with branches; SUPER_ADMIN or the owning owner.
        .route("/restaurants/{id}", get(handlers::get_restaurant))
        // GET /restaurants/{id}/stats
        .route(
            "/restaurants/{id}/stats",
            get(handlers::get_restaurant_stats),
        )
        // --- Table Management ---
        // GET /tables?branchId=... / POST /tables
        // Listing is branch-scope-checked; creation additionally requires a
        // management role and rejects duplicate table numbers.
        .route(
            "/tables",
            get(handlers::get_tables).post(handlers::create_table),
        )
        // --- Menu Management ---
        // GET /categories?restaurantId=... / POST /categories
        .route(
            "/categories",
            get(handlers::get_categories).post(handlers::create_category),
        )
        // GET /menu-items?restaurantId=... / POST /menu-items
        // The restaurant scope of a new item is derived from its category.
        .route(
            "/menu-items",
            get(handlers::get_menu_items).post(handlers::create_menu_item),
        )
        // --- Staff Management ---
        // GET /users?restaurantId=... / POST /users
        // Non-super-admins only ever see and create users within their own
        // restaurant.
        .route(
            "/users",
            get(handlers::get_users).post(handlers::create_user),
        )
}
