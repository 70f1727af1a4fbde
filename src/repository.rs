use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, query_builder::QueryBuilder};
use uuid::Uuid;

use crate::models::{
    Branch, BranchListing, BranchStats, Category, CategoryListing, CreateCategoryRequest,
    CreateMenuItemRequest, CreateUserRequest, MenuBranch, MenuCategory, MenuItem,
    MenuItemListing, NewOrder, Order, OrderItem, OrderWithItems, QrTable, Restaurant,
    RestaurantStats, StaffStats, SuperAdminStats, Table, User,
};
use crate::orders::{OrderStatus, PaymentStatus};
use crate::rbac::Role;

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations. Handlers
/// interact with the data layer exclusively through this trait, so the concrete
/// implementation (Postgres in deployment, in-memory in tests and local demos)
/// can be swapped without touching business logic.
///
/// Every method returns `Result<_, sqlx::Error>`: a persistence failure is
/// never retried here, it propagates to the handler and surfaces as a 500.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's async task
/// boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error>;
    /// Inserts a staff user. The affiliation columns are resolved by the
    /// handler from the creating identity and the requested role.
    async fn create_user(
        &self,
        req: &CreateUserRequest,
        password_hash: &str,
        restaurant_id: Option<Uuid>,
        branch_id: Option<Uuid>,
    ) -> Result<User, sqlx::Error>;
    /// Lists users. `restaurant_id = Some(..)` restricts to users affiliated
    /// with that restaurant directly or through one of its branches.
    async fn list_users(&self, restaurant_id: Option<Uuid>) -> Result<Vec<User>, sqlx::Error>;

    // --- Restaurants ---
    async fn get_restaurant(&self, id: Uuid) -> Result<Option<Restaurant>, sqlx::Error>;
    async fn list_restaurant_branches(
        &self,
        restaurant_id: Uuid,
    ) -> Result<Vec<Branch>, sqlx::Error>;
    async fn restaurant_stats(&self, restaurant_id: Uuid) -> Result<RestaurantStats, sqlx::Error>;

    // --- Branches ---
    /// Public branch directory: active branches, optionally filtered by
    /// restaurant, each enriched with the restaurant name and counters.
    async fn list_branches(
        &self,
        restaurant_id: Option<Uuid>,
    ) -> Result<Vec<BranchListing>, sqlx::Error>;
    async fn get_branch(&self, id: Uuid) -> Result<Option<Branch>, sqlx::Error>;
    async fn list_branch_tables(&self, branch_id: Uuid) -> Result<Vec<Table>, sqlx::Error>;
    async fn branch_stats(&self, branch_id: Uuid) -> Result<BranchStats, sqlx::Error>;
    /// Today's workload counters. The day window is computed by the caller so
    /// the repository stays clock-free.
    async fn branch_staff_stats(
        &self,
        branch_id: Uuid,
        day_start: DateTime<Utc>,
        day_end: DateTime<Utc>,
    ) -> Result<StaffStats, sqlx::Error>;
    async fn super_stats(&self) -> Result<SuperAdminStats, sqlx::Error>;

    // --- Tables ---
    async fn find_table(&self, branch_id: Uuid, number: i32)
        -> Result<Option<Table>, sqlx::Error>;
    async fn create_table(
        &self,
        branch_id: Uuid,
        number: i32,
        capacity: i32,
        qr_code: &str,
    ) -> Result<Table, sqlx::Error>;
    /// The QR resolution lookup: a thin find-by-code-string.
    async fn get_table_by_qr(&self, qr_code: &str) -> Result<Option<QrTable>, sqlx::Error>;

    // --- Categories ---
    async fn list_categories(
        &self,
        restaurant_id: Uuid,
    ) -> Result<Vec<CategoryListing>, sqlx::Error>;
    async fn find_category_by_name(
        &self,
        restaurant_id: Uuid,
        name: &str,
    ) -> Result<Option<Category>, sqlx::Error>;
    async fn get_category(&self, id: Uuid) -> Result<Option<Category>, sqlx::Error>;
    async fn create_category(
        &self,
        req: &CreateCategoryRequest,
    ) -> Result<Category, sqlx::Error>;

    // --- Menu ---
    async fn list_menu_items(
        &self,
        restaurant_id: Uuid,
    ) -> Result<Vec<MenuItemListing>, sqlx::Error>;
    async fn create_menu_item(
        &self,
        req: &CreateMenuItemRequest,
    ) -> Result<MenuItem, sqlx::Error>;
    /// The customer-facing menu for a branch: active categories of the branch's
    /// restaurant holding their currently available items. Categories with no
    /// available items are omitted.
    async fn branch_menu(&self, branch_id: Uuid) -> Result<Vec<MenuCategory>, sqlx::Error>;
    async fn get_menu_branch(&self, branch_id: Uuid) -> Result<Option<MenuBranch>, sqlx::Error>;

    // --- Orders ---
    /// Inserts the order and its line items atomically. The order arrives
    /// pre-validated with totals already computed.
    async fn create_order(&self, order: NewOrder) -> Result<OrderWithItems, sqlx::Error>;
    async fn get_order(&self, id: Uuid) -> Result<Option<OrderWithItems>, sqlx::Error>;
    async fn list_orders(
        &self,
        branch_id: Option<Uuid>,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderWithItems>, sqlx::Error>;
    /// Applies a status transition guarded by the optimistic version counter:
    /// the UPDATE only matches when `version` still equals `expected_version`,
    /// and increments it. `Ok(None)` means a concurrent writer won the race.
    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
        expected_version: i32,
    ) -> Result<Option<OrderWithItems>, sqlx::Error>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

// Column lists reused across queries so every SELECT/RETURNING stays in sync
// with the FromRow structs.
const USER_COLS: &str =
    "id, email, name, phone, role, active, restaurant_id, branch_id, created_at";
const ORDER_COLS: &str = "id, order_number, order_type, status, payment_status, subtotal, tax, \
     delivery_fee, total, customer_name, customer_phone, customer_email, delivery_address, \
     notes, branch_id, table_id, version, created_at";

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by the
/// PostgreSQL database. Queries use the runtime-checked sqlx API with bound
/// parameters throughout, so the crate builds without a live database and no
/// user input is ever interpolated into SQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetches the line items for a set of orders in one round trip and
    /// attaches them, preserving the given order ordering.
    async fn attach_items(&self, orders: Vec<Order>) -> Result<Vec<OrderWithItems>, sqlx::Error> {
        if orders.is_empty() {
            return Ok(vec![]);
        }
        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT id, order_id, menu_item_id, quantity, price FROM order_items \
             WHERE order_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for item in items {
            by_order.entry(item.order_id).or_default().push(item);
        }
        Ok(orders
            .into_iter()
            .map(|order| {
                let items = by_order.remove(&order.id).unwrap_or_default();
                OrderWithItems { order, items }
            })
            .collect())
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    async fn create_user(
        &self,
        req: &CreateUserRequest,
        password_hash: &str,
        restaurant_id: Option<Uuid>,
        branch_id: Option<Uuid>,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, email, name, phone, password, role, active, restaurant_id, \
             branch_id, created_at) VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, $8, NOW()) \
             RETURNING {USER_COLS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&req.email)
        .bind(&req.name)
        .bind(&req.phone)
        .bind(password_hash)
        .bind(req.role)
        .bind(restaurant_id)
        .bind(branch_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn list_users(&self, restaurant_id: Option<Uuid>) -> Result<Vec<User>, sqlx::Error> {
        match restaurant_id {
            Some(rid) => {
                // Direct restaurant affiliation, or affiliation through one of
                // the restaurant's branches.
                sqlx::query_as::<_, User>(&format!(
                    "SELECT {USER_COLS} FROM users WHERE restaurant_id = $1 OR branch_id IN \
                     (SELECT id FROM branches WHERE restaurant_id = $1) \
                     ORDER BY created_at DESC"
                ))
                .bind(rid)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, User>(&format!(
                    "SELECT {USER_COLS} FROM users ORDER BY created_at DESC"
                ))
                .fetch_all(&self.pool)
                .await
            }
        }
    }

    async fn get_restaurant(&self, id: Uuid) -> Result<Option<Restaurant>, sqlx::Error> {
        sqlx::query_as::<_, Restaurant>(
            "SELECT id, name, description, address, phone, email, active \
             FROM restaurants WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_restaurant_branches(
        &self,
        restaurant_id: Uuid,
    ) -> Result<Vec<Branch>, sqlx::Error> {
        sqlx::query_as::<_, Branch>(
            "SELECT id, restaurant_id, name, address, phone, active \
             FROM branches WHERE restaurant_id = $1 ORDER BY name ASC",
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn restaurant_stats(&self, restaurant_id: Uuid) -> Result<RestaurantStats, sqlx::Error> {
        let total_branches: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM branches WHERE restaurant_id = $1 AND active = TRUE",
        )
        .bind(restaurant_id)
        .fetch_one(&self.pool)
        .await?;
        let total_orders: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders o JOIN branches b ON o.branch_id = b.id \
             WHERE b.restaurant_id = $1",
        )
        .bind(restaurant_id)
        .fetch_one(&self.pool)
        .await?;
        let total_users: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE restaurant_id = $1 OR branch_id IN \
             (SELECT id FROM branches WHERE restaurant_id = $1)",
        )
        .bind(restaurant_id)
        .fetch_one(&self.pool)
        .await?;
        let recent_orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT o.* FROM (SELECT {ORDER_COLS} FROM orders) o \
             JOIN branches b ON o.branch_id = b.id WHERE b.restaurant_id = $1 \
             ORDER BY o.created_at DESC LIMIT 10"
        ))
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(RestaurantStats {
            total_branches,
            total_orders,
            total_users,
            recent_orders,
        })
    }

    async fn list_branches(
        &self,
        restaurant_id: Option<Uuid>,
    ) -> Result<Vec<BranchListing>, sqlx::Error> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
            "SELECT b.id, b.restaurant_id, b.name, b.address, b.phone, b.active, \
             r.name AS restaurant_name, \
             (SELECT COUNT(*) FROM tables t WHERE t.branch_id = b.id) AS table_count, \
             (SELECT COUNT(*) FROM orders o WHERE o.branch_id = b.id) AS order_count \
             FROM branches b JOIN restaurants r ON b.restaurant_id = r.id \
             WHERE b.active = TRUE",
        );
        if let Some(rid) = restaurant_id {
            builder.push(" AND b.restaurant_id = ");
            builder.push_bind(rid);
        }
        builder.push(" ORDER BY b.name ASC");

        builder
            .build_query_as::<BranchListing>()
            .fetch_all(&self.pool)
            .await
    }

    async fn get_branch(&self, id: Uuid) -> Result<Option<Branch>, sqlx::Error> {
        sqlx::query_as::<_, Branch>(
            "SELECT id, restaurant_id, name, address, phone, active FROM branches WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_branch_tables(&self, branch_id: Uuid) -> Result<Vec<Table>, sqlx::Error> {
        sqlx::query_as::<_, Table>(
            "SELECT id, branch_id, number, capacity, qr_code, active \
             FROM tables WHERE branch_id = $1 ORDER BY number ASC",
        )
        .bind(branch_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn branch_stats(&self, branch_id: Uuid) -> Result<BranchStats, sqlx::Error> {
        let total_tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tables WHERE branch_id = $1 AND active = TRUE",
        )
        .bind(branch_id)
        .fetch_one(&self.pool)
        .await?;
        let total_orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE branch_id = $1")
            .bind(branch_id)
            .fetch_one(&self.pool)
            .await?;
        let total_staff: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE branch_id = $1 AND active = TRUE",
        )
        .bind(branch_id)
        .fetch_one(&self.pool)
        .await?;
        let recent_orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLS} FROM orders WHERE branch_id = $1 \
             ORDER BY created_at DESC LIMIT 10"
        ))
        .bind(branch_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(BranchStats {
            total_tables,
            total_orders,
            total_staff,
            recent_orders,
        })
    }

    async fn branch_staff_stats(
        &self,
        branch_id: Uuid,
        day_start: DateTime<Utc>,
        day_end: DateTime<Utc>,
    ) -> Result<StaffStats, sqlx::Error> {
        let count_with_status = |status: OrderStatus| {
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM orders WHERE branch_id = $1 AND status = $2 \
                 AND created_at >= $3 AND created_at < $4",
            )
            .bind(branch_id)
            .bind(status)
            .bind(day_start)
            .bind(day_end)
            .fetch_one(&self.pool)
        };

        let pending_orders = count_with_status(OrderStatus::Pending).await?;
        let preparing_orders = count_with_status(OrderStatus::Preparing).await?;
        let ready_orders = count_with_status(OrderStatus::Ready).await?;
        let total_orders: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders WHERE branch_id = $1 \
             AND created_at >= $2 AND created_at < $3",
        )
        .bind(branch_id)
        .bind(day_start)
        .bind(day_end)
        .fetch_one(&self.pool)
        .await?;

        let recent = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLS} FROM orders WHERE branch_id = $1 \
             AND created_at >= $2 AND created_at < $3 \
             ORDER BY created_at DESC LIMIT 20"
        ))
        .bind(branch_id)
        .bind(day_start)
        .bind(day_end)
        .fetch_all(&self.pool)
        .await?;
        let recent_orders = self.attach_items(recent).await?;

        Ok(StaffStats {
            pending_orders,
            preparing_orders,
            ready_orders,
            total_orders,
            recent_orders,
        })
    }

    async fn super_stats(&self) -> Result<SuperAdminStats, sqlx::Error> {
        let total_restaurants: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM restaurants WHERE active = TRUE")
                .fetch_one(&self.pool)
                .await?;
        let total_branches: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM branches WHERE active = TRUE")
                .fetch_one(&self.pool)
                .await?;
        let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE active = TRUE")
            .fetch_one(&self.pool)
            .await?;
        let total_orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        let recent_orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLS} FROM orders ORDER BY created_at DESC LIMIT 10"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(SuperAdminStats {
            total_restaurants,
            total_branches,
            total_users,
            total_orders,
            recent_orders,
        })
    }

    async fn find_table(
        &self,
        branch_id: Uuid,
        number: i32,
    ) -> Result<Option<Table>, sqlx::Error> {
        sqlx::query_as::<_, Table>(
            "SELECT id, branch_id, number, capacity, qr_code, active \
             FROM tables WHERE branch_id = $1 AND number = $2",
        )
        .bind(branch_id)
        .bind(number)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_table(
        &self,
        branch_id: Uuid,
        number: i32,
        capacity: i32,
        qr_code: &str,
    ) -> Result<Table, sqlx::Error> {
        sqlx::query_as::<_, Table>(
            "INSERT INTO tables (id, branch_id, number, capacity, qr_code, active) \
             VALUES ($1, $2, $3, $4, $5, TRUE) \
             RETURNING id, branch_id, number, capacity, qr_code, active",
        )
        .bind(Uuid::new_v4())
        .bind(branch_id)
        .bind(number)
        .bind(capacity)
        .bind(qr_code)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_table_by_qr(&self, qr_code: &str) -> Result<Option<QrTable>, sqlx::Error> {
        sqlx::query_as::<_, QrTable>(
            "SELECT t.id, t.number, t.capacity, t.qr_code, t.active, \
             b.id AS branch_id, b.name AS branch_name, b.address AS branch_address, \
             b.phone AS branch_phone, r.id AS restaurant_id, r.name AS restaurant_name \
             FROM tables t \
             JOIN branches b ON t.branch_id = b.id \
             JOIN restaurants r ON b.restaurant_id = r.id \
             WHERE t.qr_code = $1",
        )
        .bind(qr_code)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_categories(
        &self,
        restaurant_id: Uuid,
    ) -> Result<Vec<CategoryListing>, sqlx::Error> {
        sqlx::query_as::<_, CategoryListing>(
            "SELECT c.id, c.restaurant_id, c.name, c.description, c.sort_order, c.active, \
             (SELECT COUNT(*) FROM menu_items m WHERE m.category_id = c.id) AS item_count \
             FROM categories c WHERE c.restaurant_id = $1 ORDER BY c.sort_order ASC",
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn find_category_by_name(
        &self,
        restaurant_id: Uuid,
        name: &str,
    ) -> Result<Option<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            "SELECT id, restaurant_id, name, description, sort_order, active \
             FROM categories WHERE restaurant_id = $1 AND name = $2",
        )
        .bind(restaurant_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_category(&self, id: Uuid) -> Result<Option<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            "SELECT id, restaurant_id, name, description, sort_order, active \
             FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_category(
        &self,
        req: &CreateCategoryRequest,
    ) -> Result<Category, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            "INSERT INTO categories (id, restaurant_id, name, description, sort_order, active) \
             VALUES ($1, $2, $3, $4, $5, TRUE) \
             RETURNING id, restaurant_id, name, description, sort_order, active",
        )
        .bind(Uuid::new_v4())
        .bind(req.restaurant_id)
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.sort_order.unwrap_or(0))
        .fetch_one(&self.pool)
        .await
    }

    async fn list_menu_items(
        &self,
        restaurant_id: Uuid,
    ) -> Result<Vec<MenuItemListing>, sqlx::Error> {
        sqlx::query_as::<_, MenuItemListing>(
            "SELECT m.id, m.category_id, m.name, m.description, m.price, m.vegetarian, \
             m.available, m.sort_order, c.name AS category_name \
             FROM menu_items m JOIN categories c ON m.category_id = c.id \
             WHERE c.restaurant_id = $1 ORDER BY m.sort_order ASC",
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn create_menu_item(
        &self,
        req: &CreateMenuItemRequest,
    ) -> Result<MenuItem, sqlx::Error> {
        sqlx::query_as::<_, MenuItem>(
            "INSERT INTO menu_items (id, category_id, name, description, price, vegetarian, \
             available, sort_order) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING id, category_id, name, description, price, vegetarian, available, \
             sort_order",
        )
        .bind(Uuid::new_v4())
        .bind(req.category_id)
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.price)
        .bind(req.vegetarian.unwrap_or(false))
        .bind(req.available.unwrap_or(true))
        .bind(req.sort_order.unwrap_or(0))
        .fetch_one(&self.pool)
        .await
    }

    async fn branch_menu(&self, branch_id: Uuid) -> Result<Vec<MenuCategory>, sqlx::Error> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT c.id, c.restaurant_id, c.name, c.description, c.sort_order, c.active \
             FROM categories c JOIN branches b ON c.restaurant_id = b.restaurant_id \
             WHERE b.id = $1 AND c.active = TRUE ORDER BY c.sort_order ASC",
        )
        .bind(branch_id)
        .fetch_all(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, MenuItem>(
            "SELECT m.id, m.category_id, m.name, m.description, m.price, m.vegetarian, \
             m.available, m.sort_order \
             FROM menu_items m \
             JOIN categories c ON m.category_id = c.id \
             JOIN branches b ON c.restaurant_id = b.restaurant_id \
             WHERE b.id = $1 AND c.active = TRUE AND m.available = TRUE \
             ORDER BY m.sort_order ASC",
        )
        .bind(branch_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(group_menu(categories, items))
    }

    async fn get_menu_branch(&self, branch_id: Uuid) -> Result<Option<MenuBranch>, sqlx::Error> {
        sqlx::query_as::<_, MenuBranch>(
            "SELECT b.id, b.name, b.address, b.phone, \
             r.id AS restaurant_id, r.name AS restaurant_name \
             FROM branches b JOIN restaurants r ON b.restaurant_id = r.id WHERE b.id = $1",
        )
        .bind(branch_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_order(&self, order: NewOrder) -> Result<OrderWithItems, sqlx::Error> {
        // Order row and line items land together or not at all.
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Order>(&format!(
            "INSERT INTO orders (id, order_number, order_type, status, payment_status, subtotal, \
             tax, delivery_fee, total, customer_name, customer_phone, customer_email, \
             delivery_address, notes, branch_id, table_id, version, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, 0, \
             NOW()) RETURNING {ORDER_COLS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&order.order_number)
        .bind(order.order_type)
        .bind(OrderStatus::Pending)
        .bind(PaymentStatus::Pending)
        .bind(order.subtotal)
        .bind(order.tax)
        .bind(order.delivery_fee)
        .bind(order.total)
        .bind(&order.customer_name)
        .bind(&order.customer_phone)
        .bind(&order.customer_email)
        .bind(&order.delivery_address)
        .bind(&order.notes)
        .bind(order.branch_id)
        .bind(order.table_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(order.items.len());
        for line in &order.items {
            let item = sqlx::query_as::<_, OrderItem>(
                "INSERT INTO order_items (id, order_id, menu_item_id, quantity, price) \
                 VALUES ($1, $2, $3, $4, $5) \
                 RETURNING id, order_id, menu_item_id, quantity, price",
            )
            .bind(Uuid::new_v4())
            .bind(created.id)
            .bind(line.menu_item_id)
            .bind(line.quantity)
            .bind(line.price)
            .fetch_one(&mut *tx)
            .await?;
            items.push(item);
        }

        tx.commit().await?;
        Ok(OrderWithItems {
            order: created,
            items,
        })
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<OrderWithItems>, sqlx::Error> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match order {
            Some(order) => Ok(self.attach_items(vec![order]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_orders(
        &self,
        branch_id: Option<Uuid>,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderWithItems>, sqlx::Error> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {ORDER_COLS} FROM orders WHERE TRUE"));
        if let Some(bid) = branch_id {
            builder.push(" AND branch_id = ");
            builder.push_bind(bid);
        }
        if let Some(status) = status {
            builder.push(" AND status = ");
            builder.push_bind(status);
        }
        builder.push(" ORDER BY created_at DESC");

        let orders = builder
            .build_query_as::<Order>()
            .fetch_all(&self.pool)
            .await?;
        self.attach_items(orders).await
    }

    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
        expected_version: i32,
    ) -> Result<Option<OrderWithItems>, sqlx::Error> {
        let updated = sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET status = $2, version = version + 1 \
             WHERE id = $1 AND version = $3 RETURNING {ORDER_COLS}"
        ))
        .bind(id)
        .bind(status)
        .bind(expected_version)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(order) => Ok(self.attach_items(vec![order]).await?.pop()),
            None => Ok(None),
        }
    }
}

/// Groups available items under their (already sorted) categories, dropping
/// categories that end up empty.
fn group_menu(categories: Vec<Category>, items: Vec<MenuItem>) -> Vec<MenuCategory> {
    let mut by_category: HashMap<Uuid, Vec<MenuItem>> = HashMap::new();
    for item in items {
        by_category.entry(item.category_id).or_default().push(item);
    }
    categories
        .into_iter()
        .filter_map(|category| {
            by_category.remove(&category.id).map(|items| MenuCategory {
                id: category.id,
                name: category.name,
                description: category.description,
                sort_order: category.sort_order,
                items,
            })
        })
        .collect()
}

// --- In-Memory Implementation (Tests & Local Demos) ---

#[derive(Default)]
struct InMemoryState {
    users: Vec<User>,
    restaurants: Vec<Restaurant>,
    branches: Vec<Branch>,
    tables: Vec<Table>,
    categories: Vec<Category>,
    menu_items: Vec<MenuItem>,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
}

/// InMemoryRepository
///
/// A `Repository` implementation over plain vectors behind a mutex. Used by
/// the integration tests (and handy for demos) so the full HTTP surface can be
/// exercised without a running Postgres. Semantics mirror the Postgres
/// implementation, including the optimistic version check on order updates.
#[derive(Default)]
pub struct InMemoryRepository {
    state: Mutex<InMemoryState>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    // Seed helpers used by tests to build fixtures without going through the
    // HTTP surface. Each returns the created entity so ids can be captured.

    pub fn seed_restaurant(&self, name: &str) -> Restaurant {
        let restaurant = Restaurant {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            address: None,
            phone: None,
            email: None,
            active: true,
        };
        self.state
            .lock()
            .unwrap()
            .restaurants
            .push(restaurant.clone());
        restaurant
    }

    pub fn seed_branch(&self, restaurant_id: Uuid, name: &str) -> Branch {
        let branch = Branch {
            id: Uuid::new_v4(),
            restaurant_id,
            name: name.to_string(),
            address: None,
            phone: None,
            active: true,
        };
        self.state.lock().unwrap().branches.push(branch.clone());
        branch
    }

    pub fn seed_table(&self, branch_id: Uuid, number: i32, capacity: i32) -> Table {
        let table = Table {
            id: Uuid::new_v4(),
            branch_id,
            number,
            capacity,
            qr_code: format!("qr-table-{branch_id}-{number}"),
            active: true,
        };
        self.state.lock().unwrap().tables.push(table.clone());
        table
    }

    pub fn seed_user(
        &self,
        role: Role,
        restaurant_id: Option<Uuid>,
        branch_id: Option<Uuid>,
    ) -> User {
        let id = Uuid::new_v4();
        let user = User {
            id,
            email: format!("user-{id}@example.com"),
            name: None,
            phone: None,
            role,
            active: true,
            restaurant_id,
            branch_id,
            created_at: Utc::now(),
        };
        self.state.lock().unwrap().users.push(user.clone());
        user
    }

    pub fn seed_category(&self, restaurant_id: Uuid, name: &str, sort_order: i32) -> Category {
        let category = Category {
            id: Uuid::new_v4(),
            restaurant_id,
            name: name.to_string(),
            description: None,
            sort_order,
            active: true,
        };
        self.state
            .lock()
            .unwrap()
            .categories
            .push(category.clone());
        category
    }

    pub fn seed_menu_item(&self, category_id: Uuid, name: &str, price: f64) -> MenuItem {
        let item = MenuItem {
            id: Uuid::new_v4(),
            category_id,
            name: name.to_string(),
            description: None,
            price,
            vegetarian: false,
            available: true,
            sort_order: 0,
        };
        self.state.lock().unwrap().menu_items.push(item.clone());
        item
    }

    fn with_items(state: &InMemoryState, order: Order) -> OrderWithItems {
        let items = state
            .order_items
            .iter()
            .filter(|i| i.order_id == order.id)
            .cloned()
            .collect();
        OrderWithItems { order, items }
    }

    fn restaurant_user_filter(state: &InMemoryState, user: &User, restaurant_id: Uuid) -> bool {
        if user.restaurant_id == Some(restaurant_id) {
            return true;
        }
        user.branch_id.is_some_and(|bid| {
            state
                .branches
                .iter()
                .any(|b| b.id == bid && b.restaurant_id == restaurant_id)
        })
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(
        &self,
        req: &CreateUserRequest,
        _password_hash: &str,
        restaurant_id: Option<Uuid>,
        branch_id: Option<Uuid>,
    ) -> Result<User, sqlx::Error> {
        let user = User {
            id: Uuid::new_v4(),
            email: req.email.clone(),
            name: req.name.clone(),
            phone: req.phone.clone(),
            role: req.role,
            active: true,
            restaurant_id,
            branch_id,
            created_at: Utc::now(),
        };
        self.state.lock().unwrap().users.push(user.clone());
        Ok(user)
    }

    async fn list_users(&self, restaurant_id: Option<Uuid>) -> Result<Vec<User>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        let mut users: Vec<User> = match restaurant_id {
            Some(rid) => state
                .users
                .iter()
                .filter(|u| Self::restaurant_user_filter(&state, u, rid))
                .cloned()
                .collect(),
            None => state.users.clone(),
        };
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn get_restaurant(&self, id: Uuid) -> Result<Option<Restaurant>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state.restaurants.iter().find(|r| r.id == id).cloned())
    }

    async fn list_restaurant_branches(
        &self,
        restaurant_id: Uuid,
    ) -> Result<Vec<Branch>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        let mut branches: Vec<Branch> = state
            .branches
            .iter()
            .filter(|b| b.restaurant_id == restaurant_id)
            .cloned()
            .collect();
        branches.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(branches)
    }

    async fn restaurant_stats(&self, restaurant_id: Uuid) -> Result<RestaurantStats, sqlx::Error> {
        let state = self.state.lock().unwrap();
        let branch_ids: Vec<Uuid> = state
            .branches
            .iter()
            .filter(|b| b.restaurant_id == restaurant_id)
            .map(|b| b.id)
            .collect();
        let total_branches = state
            .branches
            .iter()
            .filter(|b| b.restaurant_id == restaurant_id && b.active)
            .count() as i64;
        let total_users = state
            .users
            .iter()
            .filter(|u| Self::restaurant_user_filter(&state, u, restaurant_id))
            .count() as i64;
        let mut orders: Vec<Order> = state
            .orders
            .iter()
            .filter(|o| branch_ids.contains(&o.branch_id))
            .cloned()
            .collect();
        let total_orders = orders.len() as i64;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders.truncate(10);

        Ok(RestaurantStats {
            total_branches,
            total_orders,
            total_users,
            recent_orders: orders,
        })
    }

    async fn list_branches(
        &self,
        restaurant_id: Option<Uuid>,
    ) -> Result<Vec<BranchListing>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        let mut listings: Vec<BranchListing> = state
            .branches
            .iter()
            .filter(|b| b.active && restaurant_id.is_none_or(|rid| b.restaurant_id == rid))
            .map(|b| BranchListing {
                id: b.id,
                restaurant_id: b.restaurant_id,
                name: b.name.clone(),
                address: b.address.clone(),
                phone: b.phone.clone(),
                active: b.active,
                restaurant_name: state
                    .restaurants
                    .iter()
                    .find(|r| r.id == b.restaurant_id)
                    .map(|r| r.name.clone())
                    .unwrap_or_default(),
                table_count: state.tables.iter().filter(|t| t.branch_id == b.id).count() as i64,
                order_count: state.orders.iter().filter(|o| o.branch_id == b.id).count() as i64,
            })
            .collect();
        listings.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(listings)
    }

    async fn get_branch(&self, id: Uuid) -> Result<Option<Branch>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state.branches.iter().find(|b| b.id == id).cloned())
    }

    async fn list_branch_tables(&self, branch_id: Uuid) -> Result<Vec<Table>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        let mut tables: Vec<Table> = state
            .tables
            .iter()
            .filter(|t| t.branch_id == branch_id)
            .cloned()
            .collect();
        tables.sort_by_key(|t| t.number);
        Ok(tables)
    }

    async fn branch_stats(&self, branch_id: Uuid) -> Result<BranchStats, sqlx::Error> {
        let state = self.state.lock().unwrap();
        let total_tables = state
            .tables
            .iter()
            .filter(|t| t.branch_id == branch_id && t.active)
            .count() as i64;
        let total_staff = state
            .users
            .iter()
            .filter(|u| u.branch_id == Some(branch_id) && u.active)
            .count() as i64;
        let mut orders: Vec<Order> = state
            .orders
            .iter()
            .filter(|o| o.branch_id == branch_id)
            .cloned()
            .collect();
        let total_orders = orders.len() as i64;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders.truncate(10);

        Ok(BranchStats {
            total_tables,
            total_orders,
            total_staff,
            recent_orders: orders,
        })
    }

    async fn branch_staff_stats(
        &self,
        branch_id: Uuid,
        day_start: DateTime<Utc>,
        day_end: DateTime<Utc>,
    ) -> Result<StaffStats, sqlx::Error> {
        let state = self.state.lock().unwrap();
        let todays: Vec<&Order> = state
            .orders
            .iter()
            .filter(|o| {
                o.branch_id == branch_id && o.created_at >= day_start && o.created_at < day_end
            })
            .collect();
        let count_with_status = |status: OrderStatus| {
            todays.iter().filter(|o| o.status == status).count() as i64
        };

        let mut recent: Vec<Order> = todays.iter().map(|o| (*o).clone()).collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(20);
        let recent_orders = recent
            .into_iter()
            .map(|o| Self::with_items(&state, o))
            .collect();

        Ok(StaffStats {
            pending_orders: count_with_status(OrderStatus::Pending),
            preparing_orders: count_with_status(OrderStatus::Preparing),
            ready_orders: count_with_status(OrderStatus::Ready),
            total_orders: todays.len() as i64,
            recent_orders,
        })
    }

    async fn super_stats(&self) -> Result<SuperAdminStats, sqlx::Error> {
        let state = self.state.lock().unwrap();
        let mut orders = state.orders.clone();
        let total_orders = orders.len() as i64;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders.truncate(10);

        Ok(SuperAdminStats {
            total_restaurants: state.restaurants.iter().filter(|r| r.active).count() as i64,
            total_branches: state.branches.iter().filter(|b| b.active).count() as i64,
            total_users: state.users.iter().filter(|u| u.active).count() as i64,
            total_orders,
            recent_orders: orders,
        })
    }

    async fn find_table(
        &self,
        branch_id: Uuid,
        number: i32,
    ) -> Result<Option<Table>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .tables
            .iter()
            .find(|t| t.branch_id == branch_id && t.number == number)
            .cloned())
    }

    async fn create_table(
        &self,
        branch_id: Uuid,
        number: i32,
        capacity: i32,
        qr_code: &str,
    ) -> Result<Table, sqlx::Error> {
        let table = Table {
            id: Uuid::new_v4(),
            branch_id,
            number,
            capacity,
            qr_code: qr_code.to_string(),
            active: true,
        };
        self.state.lock().unwrap().tables.push(table.clone());
        Ok(table)
    }

    async fn get_table_by_qr(&self, qr_code: &str) -> Result<Option<QrTable>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        let Some(table) = state.tables.iter().find(|t| t.qr_code == qr_code) else {
            return Ok(None);
        };
        let Some(branch) = state.branches.iter().find(|b| b.id == table.branch_id) else {
            return Ok(None);
        };
        let Some(restaurant) = state
            .restaurants
            .iter()
            .find(|r| r.id == branch.restaurant_id)
        else {
            return Ok(None);
        };
        Ok(Some(QrTable {
            id: table.id,
            number: table.number,
            capacity: table.capacity,
            qr_code: table.qr_code.clone(),
            active: table.active,
            branch_id: branch.id,
            branch_name: branch.name.clone(),
            branch_address: branch.address.clone(),
            branch_phone: branch.phone.clone(),
            restaurant_id: restaurant.id,
            restaurant_name: restaurant.name.clone(),
        }))
    }

    async fn list_categories(
        &self,
        restaurant_id: Uuid,
    ) -> Result<Vec<CategoryListing>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        let mut listings: Vec<CategoryListing> = state
            .categories
            .iter()
            .filter(|c| c.restaurant_id == restaurant_id)
            .map(|c| CategoryListing {
                id: c.id,
                restaurant_id: c.restaurant_id,
                name: c.name.clone(),
                description: c.description.clone(),
                sort_order: c.sort_order,
                active: c.active,
                item_count: state
                    .menu_items
                    .iter()
                    .filter(|m| m.category_id == c.id)
                    .count() as i64,
            })
            .collect();
        listings.sort_by_key(|c| c.sort_order);
        Ok(listings)
    }

    async fn find_category_by_name(
        &self,
        restaurant_id: Uuid,
        name: &str,
    ) -> Result<Option<Category>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .categories
            .iter()
            .find(|c| c.restaurant_id == restaurant_id && c.name == name)
            .cloned())
    }

    async fn get_category(&self, id: Uuid) -> Result<Option<Category>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn create_category(
        &self,
        req: &CreateCategoryRequest,
    ) -> Result<Category, sqlx::Error> {
        let category = Category {
            id: Uuid::new_v4(),
            restaurant_id: req.restaurant_id,
            name: req.name.clone(),
            description: req.description.clone(),
            sort_order: req.sort_order.unwrap_or(0),
            active: true,
        };
        self.state
            .lock()
            .unwrap()
            .categories
            .push(category.clone());
        Ok(category)
    }

    async fn list_menu_items(
        &self,
        restaurant_id: Uuid,
    ) -> Result<Vec<MenuItemListing>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        let mut listings: Vec<MenuItemListing> = state
            .menu_items
            .iter()
            .filter_map(|m| {
                let category = state
                    .categories
                    .iter()
                    .find(|c| c.id == m.category_id && c.restaurant_id == restaurant_id)?;
                Some(MenuItemListing {
                    id: m.id,
                    category_id: m.category_id,
                    name: m.name.clone(),
                    description: m.description.clone(),
                    price: m.price,
                    vegetarian: m.vegetarian,
                    available: m.available,
                    sort_order: m.sort_order,
                    category_name: category.name.clone(),
                })
            })
            .collect();
        listings.sort_by_key(|m| m.sort_order);
        Ok(listings)
    }

    async fn create_menu_item(
        &self,
        req: &CreateMenuItemRequest,
    ) -> Result<MenuItem, sqlx::Error> {
        let item = MenuItem {
            id: Uuid::new_v4(),
            category_id: req.category_id,
            name: req.name.clone(),
            description: req.description.clone(),
            price: req.price,
            vegetarian: req.vegetarian.unwrap_or(false),
            available: req.available.unwrap_or(true),
            sort_order: req.sort_order.unwrap_or(0),
        };
        self.state.lock().unwrap().menu_items.push(item.clone());
        Ok(item)
    }

    async fn branch_menu(&self, branch_id: Uuid) -> Result<Vec<MenuCategory>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        let Some(branch) = state.branches.iter().find(|b| b.id == branch_id) else {
            return Ok(vec![]);
        };
        let mut categories: Vec<Category> = state
            .categories
            .iter()
            .filter(|c| c.restaurant_id == branch.restaurant_id && c.active)
            .cloned()
            .collect();
        categories.sort_by_key(|c| c.sort_order);
        let category_ids: Vec<Uuid> = categories.iter().map(|c| c.id).collect();
        let mut items: Vec<MenuItem> = state
            .menu_items
            .iter()
            .filter(|m| m.available && category_ids.contains(&m.category_id))
            .cloned()
            .collect();
        items.sort_by_key(|m| m.sort_order);
        Ok(group_menu(categories, items))
    }

    async fn get_menu_branch(&self, branch_id: Uuid) -> Result<Option<MenuBranch>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        let Some(branch) = state.branches.iter().find(|b| b.id == branch_id) else {
            return Ok(None);
        };
        let Some(restaurant) = state
            .restaurants
            .iter()
            .find(|r| r.id == branch.restaurant_id)
        else {
            return Ok(None);
        };
        Ok(Some(MenuBranch {
            id: branch.id,
            name: branch.name.clone(),
            address: branch.address.clone(),
            phone: branch.phone.clone(),
            restaurant_id: restaurant.id,
            restaurant_name: restaurant.name.clone(),
        }))
    }

    async fn create_order(&self, order: NewOrder) -> Result<OrderWithItems, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let created = Order {
            id: Uuid::new_v4(),
            order_number: order.order_number,
            order_type: order.order_type,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            subtotal: order.subtotal,
            tax: order.tax,
            delivery_fee: order.delivery_fee,
            total: order.total,
            customer_name: order.customer_name,
            customer_phone: order.customer_phone,
            customer_email: order.customer_email,
            delivery_address: order.delivery_address,
            notes: order.notes,
            branch_id: order.branch_id,
            table_id: order.table_id,
            version: 0,
            created_at: Utc::now(),
        };
        let items: Vec<OrderItem> = order
            .items
            .iter()
            .map(|line| OrderItem {
                id: Uuid::new_v4(),
                order_id: created.id,
                menu_item_id: line.menu_item_id,
                quantity: line.quantity,
                price: line.price,
            })
            .collect();
        state.orders.push(created.clone());
        state.order_items.extend(items.clone());
        Ok(OrderWithItems {
            order: created,
            items,
        })
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<OrderWithItems>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .orders
            .iter()
            .find(|o| o.id == id)
            .cloned()
            .map(|o| Self::with_items(&state, o)))
    }

    async fn list_orders(
        &self,
        branch_id: Option<Uuid>,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderWithItems>, sqlx::Error> {
        let state = self.state.lock().unwrap();
        let mut orders: Vec<Order> = state
            .orders
            .iter()
            .filter(|o| branch_id.is_none_or(|bid| o.branch_id == bid))
            .filter(|o| status.is_none_or(|s| o.status == s))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders
            .into_iter()
            .map(|o| Self::with_items(&state, o))
            .collect())
    }

    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
        expected_version: i32,
    ) -> Result<Option<OrderWithItems>, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let updated = match state
            .orders
            .iter_mut()
            .find(|o| o.id == id && o.version == expected_version)
        {
            Some(order) => {
                order.status = status;
                order.version += 1;
                order.clone()
            }
            None => return Ok(None),
        };
        Ok(Some(Self::with_items(&state, updated)))
    }
}
