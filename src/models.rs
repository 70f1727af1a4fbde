use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    orders::{OrderStatus, OrderType, PaymentStatus},
    rbac::Role,
};

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// A staff-side identity: the super admin, a restaurant owner/manager, or a
/// branch-tier employee. `restaurant_id` and `branch_id` are the affiliation
/// fields every access check runs against; which of them is meaningful depends
/// on the role. The password hash is intentionally absent from this struct so
/// it can never be serialized into a response.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    pub active: bool,
    // Set for the restaurant tier (RESTAURANT_OWNER, MANAGER).
    pub restaurant_id: Option<Uuid>,
    // Set for the branch tier (BRANCH_MANAGER, CHEF, WAITER, STAFF).
    pub branch_id: Option<Uuid>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Restaurant
///
/// The top of the ownership hierarchy: a restaurant owns its branches,
/// categories, and staff.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Restaurant {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub active: bool,
}

/// Branch
///
/// A physical restaurant location. Owned by exactly one restaurant; owns
/// tables and orders.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Branch {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub active: bool,
}

/// Table
///
/// A physical table within a branch. The `qr_code` string is the stable lookup
/// key printed on the table; scanning it resolves the branch and menu.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Table {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub number: i32,
    pub capacity: i32,
    pub qr_code: String,
    pub active: bool,
}

/// Category
///
/// A menu category. Scoped to a restaurant; names are unique per restaurant.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Category {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub sort_order: i32,
    pub active: bool,
}

/// MenuItem
///
/// A dish belonging to a category. `available` controls whether customers see
/// it on the public menu.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MenuItem {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub vegetarian: bool,
    pub available: bool,
    pub sort_order: i32,
}

/// Order
///
/// A customer order. Created PENDING at placement time, mutated only through
/// status transitions, and never deleted — orders are the historical record.
/// `version` is the optimistic-concurrency counter compared on every write.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    /// Serialized as "type" for API compatibility; `type` is reserved in Rust.
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub subtotal: f64,
    pub tax: f64,
    pub delivery_fee: f64,
    pub total: f64,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
    pub branch_id: Uuid,
    pub table_id: Option<Uuid>,
    pub version: i32,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// OrderItem
///
/// A single line of an order. The price is captured at placement time so later
/// menu edits do not rewrite order history.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub menu_item_id: Uuid,
    pub quantity: i32,
    pub price: f64,
}

/// OrderWithItems
///
/// The order representation returned by the API: the order row plus its lines.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

// --- Enriched Listing Schemas (Output) ---

/// BranchListing
///
/// Row shape for the public branch directory: the branch plus its restaurant's
/// name and a couple of counters.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BranchListing {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub active: bool,
    pub restaurant_name: String,
    pub table_count: i64,
    pub order_count: i64,
}

/// BranchDetail
///
/// Full branch view for the dashboards: the branch, its restaurant's name, and
/// its tables.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BranchDetail {
    #[serde(flatten)]
    pub branch: Branch,
    pub restaurant_name: String,
    pub tables: Vec<Table>,
}

/// RestaurantDetail
///
/// Full restaurant view for the owner dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RestaurantDetail {
    #[serde(flatten)]
    pub restaurant: Restaurant,
    pub branches: Vec<Branch>,
}

/// QrTable
///
/// What a scanned table QR code resolves to: the table plus enough branch and
/// restaurant context to render the ordering page header.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct QrTable {
    pub id: Uuid,
    pub number: i32,
    pub capacity: i32,
    pub qr_code: String,
    pub active: bool,
    pub branch_id: Uuid,
    pub branch_name: String,
    pub branch_address: Option<String>,
    pub branch_phone: Option<String>,
    pub restaurant_id: Uuid,
    pub restaurant_name: String,
}

/// CategoryListing
///
/// Category row augmented with its menu-item count.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CategoryListing {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub sort_order: i32,
    pub active: bool,
    pub item_count: i64,
}

/// MenuItemListing
///
/// Menu-item row augmented with its category's name.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MenuItemListing {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub vegetarian: bool,
    pub available: bool,
    pub sort_order: i32,
    pub category_name: String,
}

/// MenuCategory
///
/// One section of the customer-facing menu: a category and its available items.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MenuCategory {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub sort_order: i32,
    pub items: Vec<MenuItem>,
}

/// MenuBranch
///
/// Branch header info returned alongside the public menu.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MenuBranch {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub restaurant_id: Uuid,
    pub restaurant_name: String,
}

/// MenuResponse
///
/// The public menu for one branch, grouped by category and sorted by each
/// category's sort order.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MenuResponse {
    pub branch: MenuBranch,
    pub categories: Vec<MenuCategory>,
}

// --- Request Payloads (Input Schemas) ---

/// OrderItemInput
///
/// One requested line of a new order.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderItemInput {
    pub menu_item_id: Uuid,
    pub quantity: i32,
    pub price: f64,
}

/// CreateOrderRequest
///
/// Input payload for order placement (POST /orders). Customers submit this
/// anonymously from the table/ordering page; no session is involved.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateOrderRequest {
    pub branch_id: Uuid,
    pub table_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub delivery_address: Option<String>,
    pub items: Vec<OrderItemInput>,
}

/// UpdateOrderStatusRequest
///
/// Body of PATCH /orders/{id}. The status arrives as a raw string and is parsed
/// by the handler so a missing or unknown value surfaces as a 400 with a
/// descriptive message rather than a deserialization rejection.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateOrderStatusRequest {
    pub status: Option<String>,
}

/// CreateTableRequest
///
/// Input payload for registering a table in a branch. The QR code string is
/// derived server-side from the branch and table number.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateTableRequest {
    pub branch_id: Uuid,
    pub number: i32,
    pub capacity: i32,
}

/// CreateCategoryRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
    pub restaurant_id: Uuid,
}

/// CreateMenuItemRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateMenuItemRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub category_id: Uuid,
    pub vegetarian: Option<bool>,
    pub available: Option<bool>,
    pub sort_order: Option<i32>,
}

/// CreateUserRequest
///
/// Input payload for staff-user creation. The password is bcrypt-hashed before
/// it reaches the repository and is never logged or echoed back.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: Option<String>,
    pub password: String,
    pub role: Role,
    pub phone: Option<String>,
    pub restaurant_id: Option<Uuid>,
    pub branch_id: Option<Uuid>,
}

/// NewOrder
///
/// Internal insert shape handed to the repository after validation and totals
/// computation. Not part of the wire contract.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: String,
    pub order_type: OrderType,
    pub subtotal: f64,
    pub tax: f64,
    pub delivery_fee: f64,
    pub total: f64,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
    pub branch_id: Uuid,
    pub table_id: Option<Uuid>,
    pub items: Vec<OrderItemInput>,
}

// --- Dashboard Schemas (Output) ---

/// BranchStats
///
/// Aggregates for the branch dashboard (GET /branches/{id}/stats).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BranchStats {
    pub total_tables: i64,
    pub total_orders: i64,
    pub total_staff: i64,
    pub recent_orders: Vec<Order>,
}

/// StaffStats
///
/// Today's workload counters for the kitchen/floor dashboard
/// (GET /branches/{id}/staff-stats). Recent orders include line items so the
/// kitchen view can render them without extra round trips.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StaffStats {
    pub pending_orders: i64,
    pub preparing_orders: i64,
    pub ready_orders: i64,
    pub total_orders: i64,
    pub recent_orders: Vec<OrderWithItems>,
}

/// RestaurantStats
///
/// Aggregates for the restaurant-owner dashboard (GET /restaurants/{id}/stats).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RestaurantStats {
    pub total_branches: i64,
    pub total_orders: i64,
    pub total_users: i64,
    pub recent_orders: Vec<Order>,
}

/// SuperAdminStats
///
/// System-wide aggregates for the super-admin dashboard
/// (GET /admin/super/stats).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SuperAdminStats {
    pub total_restaurants: i64,
    pub total_branches: i64,
    pub total_users: i64,
    pub total_orders: i64,
    pub recent_orders: Vec<Order>,
}
