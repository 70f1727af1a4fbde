use crate::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    models::{
        Branch, BranchDetail, BranchListing, BranchStats, Category, CategoryListing,
        CreateCategoryRequest, CreateMenuItemRequest, CreateOrderRequest, CreateTableRequest,
        CreateUserRequest, MenuItem, MenuItemListing, MenuResponse, NewOrder, OrderWithItems,
        QrTable, RestaurantDetail, RestaurantStats, StaffStats, SuperAdminStats, Table,
        UpdateOrderStatusRequest, User,
    },
    orders::{self, OrderStatus},
    rbac::{self, Role},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{Duration, NaiveTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

// --- Filter Structs ---

/// OrderFilter
///
/// Accepted query parameters for the order listing endpoint (GET /orders).
#[derive(Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct OrderFilter {
    /// Restrict to a single branch. Required for every role without the
    /// `access_all_branches` capability.
    pub branch_id: Option<Uuid>,
    /// Restrict to a single lifecycle status.
    pub status: Option<OrderStatus>,
}

/// BranchFilter
///
/// Accepted query parameters for the public branch directory (GET /branches).
#[derive(Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct BranchFilter {
    pub restaurant_id: Option<Uuid>,
}

/// MenuQuery
///
/// Query parameters for the public menu endpoint (GET /menu). The branch id is
/// required; it arrives as an Option only so the handler can reply 400 instead
/// of a generic extractor rejection.
#[derive(Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct MenuQuery {
    pub branch_id: Option<Uuid>,
}

/// TableFilter
#[derive(Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct TableFilter {
    pub branch_id: Option<Uuid>,
}

/// RestaurantScopedFilter
///
/// Shared query shape for restaurant-scoped listings (categories, menu items,
/// users).
#[derive(Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantScopedFilter {
    pub restaurant_id: Option<Uuid>,
}

// --- Scope Helpers ---

/// Loads the branch and runs the branch scope check against it.
///
/// Existence is resolved first because the hardened owner/manager check needs
/// the branch's owning restaurant; SUPER_ADMIN therefore sees a 404 (not a
/// 403) for ids that resolve to nothing, which leaks no information it is not
/// entitled to.
async fn load_branch_checked(
    state: &AppState,
    user: &AuthUser,
    branch_id: Uuid,
) -> Result<Branch, ApiError> {
    let branch = state
        .repo
        .get_branch(branch_id)
        .await?
        .ok_or(ApiError::NotFound("Branch"))?;
    if !rbac::can_access_branch(user, branch.id, branch.restaurant_id) {
        return Err(ApiError::Forbidden);
    }
    Ok(branch)
}

/// Today's half-open UTC window, used by the staff dashboard counters.
fn today_window() -> (chrono::DateTime<Utc>, chrono::DateTime<Utc>) {
    let start = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

// --- Public Handlers ---

/// get_menu
///
/// [Public Route] The customer-facing menu for one branch, grouped by category.
/// Reached from the page a table QR code points at; no session is involved.
#[utoipa::path(
    get,
    path = "/menu",
    params(MenuQuery),
    responses(
        (status = 200, description = "Branch menu", body = MenuResponse),
        (status = 400, description = "Missing branch id"),
        (status = 404, description = "Unknown branch")
    )
)]
pub async fn get_menu(
    State(state): State<AppState>,
    Query(query): Query<MenuQuery>,
) -> Result<Json<MenuResponse>, ApiError> {
    let branch_id = query
        .branch_id
        .ok_or_else(|| ApiError::Validation("Branch ID is required".into()))?;

    let branch = state
        .repo
        .get_menu_branch(branch_id)
        .await?
        .ok_or(ApiError::NotFound("Branch"))?;
    let categories = state.repo.branch_menu(branch_id).await?;

    Ok(Json(MenuResponse { branch, categories }))
}

/// get_branches
///
/// [Public Route] Lists active branches, optionally filtered to one
/// restaurant. Backs the branch-picker on the customer side.
#[utoipa::path(
    get,
    path = "/branches",
    params(BranchFilter),
    responses((status = 200, description = "Active branches", body = [BranchListing]))
)]
pub async fn get_branches(
    State(state): State<AppState>,
    Query(filter): Query<BranchFilter>,
) -> Result<Json<Vec<BranchListing>>, ApiError> {
    let branches = state.repo.list_branches(filter.restaurant_id).await?;
    Ok(Json(branches))
}

/// get_table_by_qr
///
/// [Public Route] Resolves a scanned table QR code to the table and its
/// branch/restaurant context. A thin lookup by the code string; the QR image
/// itself is produced elsewhere.
#[utoipa::path(
    get,
    path = "/tables/qr/{qrCode}",
    params(("qrCode" = String, Path, description = "QR code string")),
    responses(
        (status = 200, description = "Resolved table", body = QrTable),
        (status = 404, description = "Unknown code")
    )
)]
pub async fn get_table_by_qr(
    State(state): State<AppState>,
    Path(qr_code): Path<String>,
) -> Result<Json<QrTable>, ApiError> {
    let table = state
        .repo
        .get_table_by_qr(&qr_code)
        .await?
        .ok_or(ApiError::NotFound("Table"))?;
    Ok(Json(table))
}

/// create_order
///
/// [Public Route] Places a new order. Customers order anonymously, so there is
/// no identity to resolve; the branch is the ownership anchor.
///
/// Totals are a pure function of the submitted lines: subtotal = Σ(price ×
/// quantity), tax = 10%, plus a flat delivery fee for DELIVERY orders. The
/// order starts in PENDING with payment PENDING and receives a unique
/// human-readable order number.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = OrderWithItems),
        (status = 400, description = "Missing or invalid fields"),
        (status = 404, description = "Unknown branch")
    )
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderWithItems>), ApiError> {
    orders::validate_order_request(&payload)?;

    // The branch must exist before anything is persisted; it is the owner of
    // the order for every later access check.
    state
        .repo
        .get_branch(payload.branch_id)
        .await?
        .ok_or(ApiError::NotFound("Branch"))?;

    let lines: Vec<(f64, i32)> = payload
        .items
        .iter()
        .map(|item| (item.price, item.quantity))
        .collect();
    let totals = orders::compute_totals(&lines, payload.order_type);

    let notes = payload
        .delivery_address
        .as_ref()
        .map(|address| format!("Delivery to: {address}"));

    let order = state
        .repo
        .create_order(NewOrder {
            order_number: orders::next_order_number(),
            order_type: payload.order_type,
            subtotal: totals.subtotal,
            tax: totals.tax,
            delivery_fee: totals.delivery_fee,
            total: totals.total,
            customer_name: payload.customer_name,
            customer_phone: payload.customer_phone,
            customer_email: payload.customer_email,
            delivery_address: payload.delivery_address,
            notes,
            branch_id: payload.branch_id,
            table_id: payload.table_id,
            items: payload.items,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(order)))
}

// --- Order Handlers (Authenticated) ---

/// get_orders
///
/// [Authenticated Route] Lists orders, optionally filtered by branch and
/// status. Without a branch filter the caller needs system-wide reach
/// (`access_all_branches`); with one, the standard branch scope check applies.
#[utoipa::path(
    get,
    path = "/orders",
    params(OrderFilter),
    responses(
        (status = 200, description = "Orders", body = [OrderWithItems]),
        (status = 403, description = "Out of scope")
    )
)]
pub async fn get_orders(
    user: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<OrderFilter>,
) -> Result<Json<Vec<OrderWithItems>>, ApiError> {
    if !rbac::has_capability(&user, "view_orders") && !rbac::has_capability(&user, "manage_orders")
    {
        return Err(ApiError::Forbidden);
    }

    match filter.branch_id {
        Some(branch_id) => {
            load_branch_checked(&state, &user, branch_id).await?;
        }
        None => {
            if !rbac::has_capability(&user, "access_all_branches") {
                return Err(ApiError::Forbidden);
            }
        }
    }

    let orders = state.repo.list_orders(filter.branch_id, filter.status).await?;
    Ok(Json(orders))
}

/// get_order
///
/// [Authenticated Route] A single order with its line items. The acting
/// identity must be in scope for the order's branch.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order", body = OrderWithItems),
        (status = 403, description = "Out of scope"),
        (status = 404, description = "Unknown order")
    )
)]
pub async fn get_order(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderWithItems>, ApiError> {
    let order = state
        .repo
        .get_order(id)
        .await?
        .ok_or(ApiError::NotFound("Order"))?;
    load_branch_checked(&state, &user, order.order.branch_id).await?;
    Ok(Json(order))
}

/// update_order_status
///
/// [Authenticated Route] Advances an order through its lifecycle.
///
/// The transition is validated server-side against the state graph
/// (PENDING → CONFIRMED → PREPARING → READY → DELIVERED, CANCELLED from any
/// non-terminal state); a requested status that is not a legal successor is a
/// 400 regardless of what a client rendered. The write itself is guarded by
/// the order's version counter, so of two concurrent transitions exactly one
/// wins and the loser sees a 409.
#[utoipa::path(
    patch,
    path = "/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Updated order", body = OrderWithItems),
        (status = 400, description = "Missing or illegal status"),
        (status = 403, description = "Out of scope"),
        (status = 404, description = "Unknown order"),
        (status = 409, description = "Lost a concurrent update")
    )
)]
pub async fn update_order_status(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> Result<Json<OrderWithItems>, ApiError> {
    let order = state
        .repo
        .get_order(id)
        .await?
        .ok_or(ApiError::NotFound("Order"))?;

    load_branch_checked(&state, &user, order.order.branch_id).await?;

    // Advancing an order takes more than branch membership: STAFF can see
    // orders but not move them.
    if !rbac::has_capability(&user, "manage_orders")
        && !rbac::has_capability(&user, "update_order_status")
    {
        return Err(ApiError::Forbidden);
    }

    let requested = payload
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Validation("Status is required".into()))?;
    let next: OrderStatus = requested
        .parse()
        .map_err(|_| ApiError::Validation(format!("Unknown order status: {requested}")))?;

    let current = order.order.status;
    if !current.can_transition_to(next) {
        return Err(ApiError::Validation(format!(
            "Illegal status transition from {current} to {next}"
        )));
    }

    let updated = state
        .repo
        .update_order_status(id, next, order.order.version)
        .await?
        .ok_or_else(|| ApiError::Conflict("Order was updated concurrently".into()))?;

    tracing::info!(order = %updated.order.order_number, from = %current, to = %next, "order status updated");
    Ok(Json(updated))
}

// --- Branch Handlers (Authenticated) ---

/// get_branch
///
/// [Authenticated Route] Branch detail with its tables, for the branch
/// dashboard.
#[utoipa::path(
    get,
    path = "/branches/{id}",
    params(("id" = Uuid, Path, description = "Branch ID")),
    responses(
        (status = 200, description = "Branch detail", body = BranchDetail),
        (status = 403, description = "Out of scope"),
        (status = 404, description = "Unknown branch")
    )
)]
pub async fn get_branch(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BranchDetail>, ApiError> {
    let branch = load_branch_checked(&state, &user, id).await?;
    let tables = state.repo.list_branch_tables(id).await?;
    let restaurant_name = state
        .repo
        .get_restaurant(branch.restaurant_id)
        .await?
        .map(|r| r.name)
        .unwrap_or_default();

    Ok(Json(BranchDetail {
        branch,
        restaurant_name,
        tables,
    }))
}

/// get_branch_stats
///
/// [Authenticated Route] Aggregate counters and a bounded recent-orders list
/// for the branch dashboard.
#[utoipa::path(
    get,
    path = "/branches/{id}/stats",
    params(("id" = Uuid, Path, description = "Branch ID")),
    responses(
        (status = 200, description = "Branch stats", body = BranchStats),
        (status = 403, description = "Out of scope")
    )
)]
pub async fn get_branch_stats(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BranchStats>, ApiError> {
    load_branch_checked(&state, &user, id).await?;
    let stats = state.repo.branch_stats(id).await?;
    Ok(Json(stats))
}

/// get_branch_staff_stats
///
/// [Authenticated Route] Today's workload counters for the kitchen/floor
/// dashboard, with the most recent orders (including items) for the queue
/// view.
#[utoipa::path(
    get,
    path = "/branches/{id}/staff-stats",
    params(("id" = Uuid, Path, description = "Branch ID")),
    responses(
        (status = 200, description = "Staff stats", body = StaffStats),
        (status = 403, description = "Out of scope")
    )
)]
pub async fn get_branch_staff_stats(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StaffStats>, ApiError> {
    load_branch_checked(&state, &user, id).await?;
    let (day_start, day_end) = today_window();
    let stats = state.repo.branch_staff_stats(id, day_start, day_end).await?;
    Ok(Json(stats))
}

// --- Restaurant Handlers (Authenticated) ---

/// get_restaurant
///
/// [Authenticated Route] Restaurant detail with its branches, for the owner
/// dashboard. Restricted to SUPER_ADMIN and the restaurant's own owner.
#[utoipa::path(
    get,
    path = "/restaurants/{id}",
    params(("id" = Uuid, Path, description = "Restaurant ID")),
    responses(
        (status = 200, description = "Restaurant detail", body = RestaurantDetail),
        (status = 403, description = "Out of scope"),
        (status = 404, description = "Unknown restaurant")
    )
)]
pub async fn get_restaurant(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RestaurantDetail>, ApiError> {
    rbac::require_role(&user, &[Role::SuperAdmin, Role::RestaurantOwner])?;
    if !rbac::can_access_restaurant(&user, id) {
        return Err(ApiError::Forbidden);
    }

    let restaurant = state
        .repo
        .get_restaurant(id)
        .await?
        .ok_or(ApiError::NotFound("Restaurant"))?;
    let branches = state.repo.list_restaurant_branches(id).await?;

    Ok(Json(RestaurantDetail {
        restaurant,
        branches,
    }))
}

/// get_restaurant_stats
///
/// [Authenticated Route] Aggregates for the restaurant-owner dashboard. The
/// scope check precedes the existence check: an out-of-scope id is a 403 even
/// if it resolves to nothing.
#[utoipa::path(
    get,
    path = "/restaurants/{id}/stats",
    params(("id" = Uuid, Path, description = "Restaurant ID")),
    responses(
        (status = 200, description = "Restaurant stats", body = RestaurantStats),
        (status = 403, description = "Out of scope")
    )
)]
pub async fn get_restaurant_stats(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RestaurantStats>, ApiError> {
    rbac::require_role(&user, &[Role::SuperAdmin, Role::RestaurantOwner])?;
    if !rbac::can_access_restaurant(&user, id) {
        return Err(ApiError::Forbidden);
    }

    let stats = state.repo.restaurant_stats(id).await?;
    Ok(Json(stats))
}

// --- Table Handlers (Authenticated) ---

/// get_tables
///
/// [Authenticated Route] Lists a branch's tables for the table-management
/// screen.
#[utoipa::path(
    get,
    path = "/tables",
    params(TableFilter),
    responses(
        (status = 200, description = "Tables", body = [Table]),
        (status = 400, description = "Missing branch id"),
        (status = 403, description = "Out of scope")
    )
)]
pub async fn get_tables(
    user: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<TableFilter>,
) -> Result<Json<Vec<Table>>, ApiError> {
    let branch_id = filter
        .branch_id
        .ok_or_else(|| ApiError::Validation("Branch ID is required".into()))?;
    load_branch_checked(&state, &user, branch_id).await?;
    let tables = state.repo.list_branch_tables(branch_id).await?;
    Ok(Json(tables))
}

/// create_table
///
/// [Authenticated Route] Registers a new table in a branch. Table numbers are
/// unique per branch; the table's QR code string is derived here and stays
/// stable for the life of the table.
#[utoipa::path(
    post,
    path = "/tables",
    request_body = CreateTableRequest,
    responses(
        (status = 201, description = "Table created", body = Table),
        (status = 400, description = "Duplicate table number"),
        (status = 403, description = "Out of scope")
    )
)]
pub async fn create_table(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateTableRequest>,
) -> Result<(StatusCode, Json<Table>), ApiError> {
    rbac::require_role(
        &user,
        &[
            Role::SuperAdmin,
            Role::RestaurantOwner,
            Role::Manager,
            Role::BranchManager,
        ],
    )?;
    load_branch_checked(&state, &user, payload.branch_id).await?;

    if state
        .repo
        .find_table(payload.branch_id, payload.number)
        .await?
        .is_some()
    {
        return Err(ApiError::Validation(
            "Table number already exists in this branch".into(),
        ));
    }

    let qr_code = format!("qr-table-{}-{}", payload.branch_id, payload.number);
    let table = state
        .repo
        .create_table(payload.branch_id, payload.number, payload.capacity, &qr_code)
        .await?;

    Ok((StatusCode::CREATED, Json(table)))
}

// --- Category Handlers (Authenticated) ---

/// get_categories
///
/// [Authenticated Route] Lists a restaurant's menu categories with item
/// counts.
#[utoipa::path(
    get,
    path = "/categories",
    params(RestaurantScopedFilter),
    responses(
        (status = 200, description = "Categories", body = [CategoryListing]),
        (status = 400, description = "Missing restaurant id"),
        (status = 403, description = "Out of scope")
    )
)]
pub async fn get_categories(
    user: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<RestaurantScopedFilter>,
) -> Result<Json<Vec<CategoryListing>>, ApiError> {
    let restaurant_id = filter
        .restaurant_id
        .ok_or_else(|| ApiError::Validation("Restaurant ID is required".into()))?;
    if !rbac::can_access_restaurant(&user, restaurant_id) {
        return Err(ApiError::Forbidden);
    }

    let categories = state.repo.list_categories(restaurant_id).await?;
    Ok(Json(categories))
}

/// create_category
///
/// [Authenticated Route] Creates a menu category. Names are unique within a
/// restaurant.
#[utoipa::path(
    post,
    path = "/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Missing fields or duplicate name"),
        (status = 403, description = "Out of scope")
    )
)]
pub async fn create_category(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    rbac::require_role(&user, &[Role::SuperAdmin, Role::RestaurantOwner])?;
    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation(
            "Name and restaurant ID are required".into(),
        ));
    }
    if !rbac::can_access_restaurant(&user, payload.restaurant_id) {
        return Err(ApiError::Forbidden);
    }

    if state
        .repo
        .find_category_by_name(payload.restaurant_id, &payload.name)
        .await?
        .is_some()
    {
        return Err(ApiError::Validation(
            "Category name already exists in this restaurant".into(),
        ));
    }

    let category = state.repo.create_category(&payload).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

// --- Menu Item Handlers (Authenticated) ---

/// get_menu_items
///
/// [Authenticated Route] Lists all of a restaurant's menu items (available or
/// not) for the menu-management screen.
#[utoipa::path(
    get,
    path = "/menu-items",
    params(RestaurantScopedFilter),
    responses(
        (status = 200, description = "Menu items", body = [MenuItemListing]),
        (status = 400, description = "Missing restaurant id"),
        (status = 403, description = "Out of scope")
    )
)]
pub async fn get_menu_items(
    user: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<RestaurantScopedFilter>,
) -> Result<Json<Vec<MenuItemListing>>, ApiError> {
    let restaurant_id = filter
        .restaurant_id
        .ok_or_else(|| ApiError::Validation("Restaurant ID is required".into()))?;
    if !rbac::can_access_restaurant(&user, restaurant_id) {
        return Err(ApiError::Forbidden);
    }

    let items = state.repo.list_menu_items(restaurant_id).await?;
    Ok(Json(items))
}

/// create_menu_item
///
/// [Authenticated Route] Creates a menu item under an existing category. The
/// restaurant scope is derived from the category, not trusted from the client.
#[utoipa::path(
    post,
    path = "/menu-items",
    request_body = CreateMenuItemRequest,
    responses(
        (status = 201, description = "Menu item created", body = MenuItem),
        (status = 400, description = "Missing fields"),
        (status = 403, description = "Out of scope"),
        (status = 404, description = "Unknown category")
    )
)]
pub async fn create_menu_item(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateMenuItemRequest>,
) -> Result<(StatusCode, Json<MenuItem>), ApiError> {
    rbac::require_role(
        &user,
        &[
            Role::SuperAdmin,
            Role::RestaurantOwner,
            Role::Manager,
            Role::BranchManager,
        ],
    )?;
    if payload.name.trim().is_empty() || payload.price <= 0.0 {
        return Err(ApiError::Validation(
            "Name, price, and category ID are required".into(),
        ));
    }

    let category = state
        .repo
        .get_category(payload.category_id)
        .await?
        .ok_or(ApiError::NotFound("Category"))?;
    if !rbac::can_access_restaurant(&user, category.restaurant_id) {
        return Err(ApiError::Forbidden);
    }

    let item = state.repo.create_menu_item(&payload).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

// --- User Handlers (Authenticated) ---

/// get_users
///
/// [Authenticated Route] Lists staff users. SUPER_ADMIN sees everyone (with an
/// optional restaurant filter); every other management role sees only users
/// affiliated with its own restaurant, resolved through its branch when the
/// identity is branch-scoped.
#[utoipa::path(
    get,
    path = "/users",
    params(RestaurantScopedFilter),
    responses(
        (status = 200, description = "Users", body = [User]),
        (status = 403, description = "Out of scope")
    )
)]
pub async fn get_users(
    user: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<RestaurantScopedFilter>,
) -> Result<Json<Vec<User>>, ApiError> {
    rbac::require_role(
        &user,
        &[
            Role::SuperAdmin,
            Role::RestaurantOwner,
            Role::Manager,
            Role::BranchManager,
        ],
    )?;

    let scope = if user.role == Role::SuperAdmin {
        filter.restaurant_id
    } else {
        // Non-super-admins are always pinned to their own restaurant,
        // regardless of what the query string asks for.
        match (user.restaurant_id, user.branch_id) {
            (Some(rid), _) => Some(rid),
            (None, Some(bid)) => {
                let branch = state
                    .repo
                    .get_branch(bid)
                    .await?
                    .ok_or(ApiError::Forbidden)?;
                Some(branch.restaurant_id)
            }
            (None, None) => return Err(ApiError::Forbidden),
        }
    };

    let users = state.repo.list_users(scope).await?;
    Ok(Json(users))
}

/// create_user
///
/// [Authenticated Route] Creates a staff user. The password is bcrypt-hashed
/// before storage; the affiliation columns are derived from the requested role
/// — restaurant tier gets a restaurant, branch tier gets a branch.
#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Missing fields or duplicate email"),
        (status = 403, description = "Out of scope")
    )
)]
pub async fn create_user(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    rbac::require_role(
        &user,
        &[Role::SuperAdmin, Role::RestaurantOwner, Role::Manager],
    )?;
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "Email, password, and role are required".into(),
        ));
    }

    if state
        .repo
        .find_user_by_email(&payload.email)
        .await?
        .is_some()
    {
        return Err(ApiError::Validation(
            "User with this email already exists".into(),
        ));
    }

    let password_hash = bcrypt::hash(&payload.password, 10)
        .map_err(|e| ApiError::Internal(format!("password hash failed: {e}")))?;

    let (restaurant_id, branch_id) = match payload.role {
        Role::SuperAdmin => (None, None),
        Role::RestaurantOwner | Role::Manager => {
            (payload.restaurant_id.or(user.restaurant_id), None)
        }
        Role::BranchManager | Role::Chef | Role::Waiter | Role::Staff => {
            (None, payload.branch_id)
        }
    };

    let created = state
        .repo
        .create_user(&payload, &password_hash, restaurant_id, branch_id)
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

// --- Admin Handlers ---

/// get_super_stats
///
/// [Admin Route] System-wide aggregates for the super-admin dashboard.
/// SUPER_ADMIN only.
#[utoipa::path(
    get,
    path = "/admin/super/stats",
    responses(
        (status = 200, description = "System stats", body = SuperAdminStats),
        (status = 403, description = "Not a super admin")
    )
)]
pub async fn get_super_stats(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<SuperAdminStats>, ApiError> {
    rbac::require_role(&user, &[Role::SuperAdmin])?;
    let stats = state.repo.super_stats().await?;
    Ok(Json(stats))
}
