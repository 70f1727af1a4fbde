use std::sync::Arc;

use jsonwebtoken::{EncodingKey, Header, encode};
use qr_dine::{
    AppConfig, AppState, InMemoryRepository, create_router,
    auth::Claims,
    models::{
        Branch, BranchStats, MenuItem, MenuResponse, OrderWithItems, Restaurant, StaffStats,
        SuperAdminStats, Table, User,
    },
    orders::OrderStatus,
    rbac::Role,
    repository::{Repository, RepositoryState},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use uuid::Uuid;

// --- Test Harness ---

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub repo: Arc<InMemoryRepository>,
}

/// Boots the full router on an ephemeral port over the in-memory repository.
/// The default config runs in Env::Local, so tests authenticate with the
/// x-user-id header against seeded users (the same path a developer uses).
async fn spawn_app() -> TestApp {
    let repo = Arc::new(InMemoryRepository::new());
    let state = AppState {
        repo: repo.clone() as RepositoryState,
        config: AppConfig::default(),
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp {
        address,
        client: reqwest::Client::new(),
        repo,
    }
}

/// Two restaurants, two branches, a table, a menu, and one user per role tier.
struct Fixture {
    app: TestApp,
    r1: Restaurant,
    r2: Restaurant,
    b1: Branch,
    b2: Branch,
    t1: Table,
    item1: MenuItem,
    super_admin: User,
    owner1: User,
    owner2: User,
    manager1: User,
    branch_manager1: User,
    chef1: User,
    waiter1: User,
    staff1: User,
}

async fn fixture() -> Fixture {
    let app = spawn_app().await;
    let repo = &app.repo;

    let r1 = repo.seed_restaurant("Sample Restaurant");
    let r2 = repo.seed_restaurant("Rival Restaurant");
    let b1 = repo.seed_branch(r1.id, "Gulshan Branch");
    let b2 = repo.seed_branch(r2.id, "Dhanmondi Branch");
    let t1 = repo.seed_table(b1.id, 1, 4);

    let appetizers = repo.seed_category(r1.id, "Appetizers", 1);
    let item1 = repo.seed_menu_item(appetizers.id, "Spring Rolls", 250.0);

    let super_admin = repo.seed_user(Role::SuperAdmin, None, None);
    let owner1 = repo.seed_user(Role::RestaurantOwner, Some(r1.id), None);
    let owner2 = repo.seed_user(Role::RestaurantOwner, Some(r2.id), None);
    let manager1 = repo.seed_user(Role::Manager, Some(r1.id), None);
    let branch_manager1 = repo.seed_user(Role::BranchManager, None, Some(b1.id));
    let chef1 = repo.seed_user(Role::Chef, None, Some(b1.id));
    let waiter1 = repo.seed_user(Role::Waiter, None, Some(b1.id));
    let staff1 = repo.seed_user(Role::Staff, None, Some(b1.id));

    Fixture {
        app,
        r1,
        r2,
        b1,
        b2,
        t1,
        item1,
        super_admin,
        owner1,
        owner2,
        manager1,
        branch_manager1,
        chef1,
        waiter1,
        staff1,
    }
}

impl Fixture {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.app.address, path)
    }

    /// Places a valid dine-in order on the given branch and returns it.
    async fn place_order(&self, branch_id: Uuid) -> OrderWithItems {
        let response = self
            .app
            .client
            .post(self.url("/orders"))
            .json(&json!({
                "branchId": branch_id,
                "tableId": self.t1.id,
                "type": "DINE_IN",
                "customerName": "Alice",
                "customerPhone": "+8801234567890",
                "items": [
                    {"menuItemId": self.item1.id, "quantity": 2, "price": 500.0}
                ]
            }))
            .send()
            .await
            .expect("order placement failed");
        assert_eq!(response.status(), 201);
        response.json().await.unwrap()
    }

    async fn patch_status(&self, acting: &User, order_id: Uuid, status: &str) -> reqwest::Response {
        self.app
            .client
            .patch(self.url(&format!("/orders/{order_id}")))
            .header("x-user-id", acting.id.to_string())
            .json(&json!({ "status": status }))
            .send()
            .await
            .unwrap()
    }
}

async fn error_message(response: reqwest::Response) -> String {
    let body: Value = response.json().await.unwrap();
    body["error"].as_str().unwrap_or_default().to_string()
}

// --- Health ---

#[tokio::test]
async fn health_check_works() {
    let app = spawn_app().await;
    let response = reqwest::get(format!("{}/health", app.address)).await.unwrap();
    assert!(response.status().is_success());
}

// --- Order Placement (Public) ---

#[tokio::test]
async fn placing_a_dine_in_order_computes_totals_and_starts_pending() {
    let fx = fixture().await;
    let order = fx.place_order(fx.b1.id).await;

    assert_eq!(order.order.subtotal, 1000.0);
    assert_eq!(order.order.tax, 100.0);
    assert_eq!(order.order.delivery_fee, 0.0);
    assert_eq!(order.order.total, 1100.0);
    assert_eq!(order.order.status, OrderStatus::Pending);
    assert!(order.order.order_number.starts_with("ORD-"));
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].quantity, 2);
}

#[tokio::test]
async fn delivery_orders_carry_the_flat_fee_and_address_note() {
    let fx = fixture().await;
    let response = fx
        .app
        .client
        .post(fx.url("/orders"))
        .json(&json!({
            "branchId": fx.b1.id,
            "type": "DELIVERY",
            "customerName": "Bob",
            "customerPhone": "+880111",
            "deliveryAddress": "12 Gulshan Avenue",
            "items": [{"menuItemId": fx.item1.id, "quantity": 1, "price": 300.0}]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let order: OrderWithItems = response.json().await.unwrap();
    assert_eq!(order.order.delivery_fee, 50.0);
    assert_eq!(order.order.total, 300.0 + 30.0 + 50.0);
    assert_eq!(
        order.order.notes.as_deref(),
        Some("Delivery to: 12 Gulshan Avenue")
    );
}

#[tokio::test]
async fn invalid_order_payloads_are_rejected_with_400() {
    let fx = fixture().await;

    // Empty items.
    let response = fx
        .app
        .client
        .post(fx.url("/orders"))
        .json(&json!({
            "branchId": fx.b1.id,
            "tableId": fx.t1.id,
            "type": "DINE_IN",
            "customerName": "Alice",
            "customerPhone": "+880123",
            "items": []
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // Delivery without an address.
    let response = fx
        .app
        .client
        .post(fx.url("/orders"))
        .json(&json!({
            "branchId": fx.b1.id,
            "type": "DELIVERY",
            "customerName": "Alice",
            "customerPhone": "+880123",
            "items": [{"menuItemId": fx.item1.id, "quantity": 1, "price": 100.0}]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // Dine-in without a table.
    let response = fx
        .app
        .client
        .post(fx.url("/orders"))
        .json(&json!({
            "branchId": fx.b1.id,
            "type": "DINE_IN",
            "customerName": "Alice",
            "customerPhone": "+880123",
            "items": [{"menuItemId": fx.item1.id, "quantity": 1, "price": 100.0}]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn ordering_from_an_unknown_branch_is_404() {
    let fx = fixture().await;
    let response = fx
        .app
        .client
        .post(fx.url("/orders"))
        .json(&json!({
            "branchId": Uuid::new_v4(),
            "type": "TAKEAWAY",
            "customerName": "Alice",
            "customerPhone": "+880123",
            "items": [{"menuItemId": fx.item1.id, "quantity": 1, "price": 100.0}]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

// --- Menu & QR Resolution (Public) ---

#[tokio::test]
async fn the_menu_is_grouped_by_category() {
    let fx = fixture().await;
    let response = fx
        .app
        .client
        .get(fx.url(&format!("/menu?branchId={}", fx.b1.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let menu: MenuResponse = response.json().await.unwrap();
    assert_eq!(menu.branch.restaurant_name, fx.r1.name);
    assert_eq!(menu.categories.len(), 1);
    assert_eq!(menu.categories[0].name, "Appetizers");
    assert_eq!(menu.categories[0].items[0].name, "Spring Rolls");
}

#[tokio::test]
async fn the_menu_requires_a_branch_id() {
    let fx = fixture().await;
    let response = fx.app.client.get(fx.url("/menu")).send().await.unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(error_message(response).await, "Branch ID is required");
}

#[tokio::test]
async fn scanning_a_table_qr_code_resolves_table_and_branch() {
    let fx = fixture().await;
    let response = fx
        .app
        .client
        .get(fx.url(&format!("/tables/qr/{}", fx.t1.qr_code)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["branchName"], fx.b1.name.as_str());
    assert_eq!(body["restaurantName"], fx.r1.name.as_str());

    let missing = fx
        .app
        .client
        .get(fx.url("/tables/qr/qr-table-nope-99"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
}

// --- Order Lifecycle (Authenticated) ---

#[tokio::test]
async fn a_waiter_walks_an_order_through_the_full_lifecycle() {
    let fx = fixture().await;
    let order = fx.place_order(fx.b1.id).await;

    for status in ["CONFIRMED", "PREPARING", "READY", "DELIVERED"] {
        let response = fx.patch_status(&fx.waiter1, order.order.id, status).await;
        assert_eq!(response.status(), 200, "transition to {status} should work");
        let updated: OrderWithItems = response.json().await.unwrap();
        assert_eq!(updated.order.status.to_string(), status);
    }

    // DELIVERED is terminal.
    let response = fx.patch_status(&fx.waiter1, order.order.id, "CANCELLED").await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn skipping_straight_to_delivered_is_rejected() {
    let fx = fixture().await;
    let order = fx.place_order(fx.b1.id).await;

    let response = fx.patch_status(&fx.chef1, order.order.id, "DELIVERED").await;
    assert_eq!(response.status(), 400);
    assert_eq!(
        error_message(response).await,
        "Illegal status transition from PENDING to DELIVERED"
    );
}

#[tokio::test]
async fn missing_and_unknown_statuses_are_400s() {
    let fx = fixture().await;
    let order = fx.place_order(fx.b1.id).await;

    let response = fx
        .app
        .client
        .patch(fx.url(&format!("/orders/{}", order.order.id)))
        .header("x-user-id", fx.waiter1.id.to_string())
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(error_message(response).await, "Status is required");

    let response = fx.patch_status(&fx.waiter1, order.order.id, "BOGUS").await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn updating_an_unknown_order_is_404() {
    let fx = fixture().await;
    let response = fx.patch_status(&fx.waiter1, Uuid::new_v4(), "CONFIRMED").await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn a_waiter_cannot_advance_another_branchs_order() {
    let fx = fixture().await;
    let order = fx.place_order(fx.b2.id).await;

    let response = fx.patch_status(&fx.waiter1, order.order.id, "CONFIRMED").await;
    assert_eq!(response.status(), 403);
    assert_eq!(error_message(response).await, "Access denied");
}

#[tokio::test]
async fn a_manager_cannot_reach_into_another_restaurant() {
    // The hardened owner/manager check: restaurant-tier reach stops at the
    // restaurant boundary.
    let fx = fixture().await;
    let order = fx.place_order(fx.b2.id).await;

    let response = fx.patch_status(&fx.manager1, order.order.id, "CONFIRMED").await;
    assert_eq!(response.status(), 403);

    let stats = fx
        .app
        .client
        .get(fx.url(&format!("/branches/{}/stats", fx.b2.id)))
        .header("x-user-id", fx.manager1.id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(stats.status(), 403);
}

#[tokio::test]
async fn staff_can_view_but_not_advance_orders() {
    let fx = fixture().await;
    let order = fx.place_order(fx.b1.id).await;

    let view = fx
        .app
        .client
        .get(fx.url(&format!("/orders/{}", order.order.id)))
        .header("x-user-id", fx.staff1.id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(view.status(), 200);

    let advance = fx.patch_status(&fx.staff1, order.order.id, "CONFIRMED").await;
    assert_eq!(advance.status(), 403);
}

#[tokio::test]
async fn concurrent_transitions_lose_on_the_version_check() {
    // Two writers read the same version; only the first update matches it.
    let fx = fixture().await;
    let order = fx.place_order(fx.b1.id).await;
    let version = order.order.version;

    let first = fx
        .app
        .repo
        .update_order_status(order.order.id, OrderStatus::Confirmed, version)
        .await
        .unwrap();
    assert!(first.is_some());

    let second = fx
        .app
        .repo
        .update_order_status(order.order.id, OrderStatus::Cancelled, version)
        .await
        .unwrap();
    assert!(second.is_none(), "the stale writer must lose");
}

// --- Order Listing ---

#[tokio::test]
async fn order_listing_is_scoped_by_branch_and_capability() {
    let fx = fixture().await;
    fx.place_order(fx.b1.id).await;
    fx.place_order(fx.b2.id).await;

    // Unauthenticated: 401.
    let response = fx.app.client.get(fx.url("/orders")).send().await.unwrap();
    assert_eq!(response.status(), 401);

    // A waiter may list their own branch.
    let response = fx
        .app
        .client
        .get(fx.url(&format!("/orders?branchId={}", fx.b1.id)))
        .header("x-user-id", fx.waiter1.id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let orders: Vec<OrderWithItems> = response.json().await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].order.branch_id, fx.b1.id);

    // ...but not the whole system.
    let response = fx
        .app
        .client
        .get(fx.url("/orders"))
        .header("x-user-id", fx.waiter1.id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    // ...and not another branch.
    let response = fx
        .app
        .client
        .get(fx.url(&format!("/orders?branchId={}", fx.b2.id)))
        .header("x-user-id", fx.waiter1.id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    // The super admin sees everything, with optional status filtering.
    let response = fx
        .app
        .client
        .get(fx.url("/orders?status=PENDING"))
        .header("x-user-id", fx.super_admin.id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let orders: Vec<OrderWithItems> = response.json().await.unwrap();
    assert_eq!(orders.len(), 2);
}

// --- Dashboards ---

#[tokio::test]
async fn branch_stats_respect_branch_scope() {
    let fx = fixture().await;
    fx.place_order(fx.b1.id).await;

    let response = fx
        .app
        .client
        .get(fx.url(&format!("/branches/{}/stats", fx.b1.id)))
        .header("x-user-id", fx.waiter1.id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let stats: BranchStats = response.json().await.unwrap();
    assert_eq!(stats.total_tables, 1);
    assert_eq!(stats.total_orders, 1);
    // Branch manager, chef, waiter, and staff are seeded into b1.
    assert_eq!(stats.total_staff, 4);
    assert_eq!(stats.recent_orders.len(), 1);

    let forbidden = fx
        .app
        .client
        .get(fx.url(&format!("/branches/{}/stats", fx.b2.id)))
        .header("x-user-id", fx.waiter1.id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status(), 403);

    let super_view = fx
        .app
        .client
        .get(fx.url(&format!("/branches/{}/stats", fx.b2.id)))
        .header("x-user-id", fx.super_admin.id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(super_view.status(), 200);
}

#[tokio::test]
async fn staff_stats_count_todays_workload() {
    let fx = fixture().await;
    fx.place_order(fx.b1.id).await;
    let second = fx.place_order(fx.b1.id).await;
    let response = fx.patch_status(&fx.chef1, second.order.id, "CONFIRMED").await;
    assert_eq!(response.status(), 200);
    let response = fx.patch_status(&fx.chef1, second.order.id, "PREPARING").await;
    assert_eq!(response.status(), 200);

    let response = fx
        .app
        .client
        .get(fx.url(&format!("/branches/{}/staff-stats", fx.b1.id)))
        .header("x-user-id", fx.chef1.id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let stats: StaffStats = response.json().await.unwrap();
    assert_eq!(stats.pending_orders, 1);
    assert_eq!(stats.preparing_orders, 1);
    assert_eq!(stats.ready_orders, 0);
    assert_eq!(stats.total_orders, 2);
    assert_eq!(stats.recent_orders.len(), 2);
    assert!(!stats.recent_orders[0].items.is_empty());
}

#[tokio::test]
async fn restaurant_stats_are_owner_and_super_admin_only() {
    let fx = fixture().await;
    fx.place_order(fx.b1.id).await;

    let response = fx
        .app
        .client
        .get(fx.url(&format!("/restaurants/{}/stats", fx.r1.id)))
        .header("x-user-id", fx.owner1.id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["totalBranches"], 1);
    assert_eq!(body["totalOrders"], 1);

    // An owner of another restaurant is out of scope.
    let response = fx
        .app
        .client
        .get(fx.url(&format!("/restaurants/{}/stats", fx.r1.id)))
        .header("x-user-id", fx.owner2.id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    // MANAGER is outside the allowed role set for this endpoint.
    let response = fx
        .app
        .client
        .get(fx.url(&format!("/restaurants/{}/stats", fx.r1.id)))
        .header("x-user-id", fx.manager1.id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn super_admin_stats_cover_the_whole_system() {
    let fx = fixture().await;
    fx.place_order(fx.b1.id).await;
    fx.place_order(fx.b2.id).await;

    let response = fx
        .app
        .client
        .get(fx.url("/admin/super/stats"))
        .header("x-user-id", fx.waiter1.id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let response = fx
        .app
        .client
        .get(fx.url("/admin/super/stats"))
        .header("x-user-id", fx.super_admin.id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let stats: SuperAdminStats = response.json().await.unwrap();
    assert_eq!(stats.total_restaurants, 2);
    assert_eq!(stats.total_branches, 2);
    assert_eq!(stats.total_orders, 2);
    assert_eq!(stats.recent_orders.len(), 2);
}

// --- Management Endpoints ---

#[tokio::test]
async fn table_creation_enforces_role_scope_and_uniqueness() {
    let fx = fixture().await;

    // A waiter lacks the management role.
    let response = fx
        .app
        .client
        .post(fx.url("/tables"))
        .header("x-user-id", fx.waiter1.id.to_string())
        .json(&json!({"branchId": fx.b1.id, "number": 2, "capacity": 4}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    // The branch manager may create tables in their branch.
    let response = fx
        .app
        .client
        .post(fx.url("/tables"))
        .header("x-user-id", fx.branch_manager1.id.to_string())
        .json(&json!({"branchId": fx.b1.id, "number": 2, "capacity": 4}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let table: Table = response.json().await.unwrap();
    assert_eq!(table.qr_code, format!("qr-table-{}-2", fx.b1.id));

    // Duplicate table numbers within a branch are rejected.
    let response = fx
        .app
        .client
        .post(fx.url("/tables"))
        .header("x-user-id", fx.branch_manager1.id.to_string())
        .json(&json!({"branchId": fx.b1.id, "number": 2, "capacity": 6}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // ...but not in another branch.
    let response = fx
        .app
        .client
        .post(fx.url("/tables"))
        .header("x-user-id", fx.branch_manager1.id.to_string())
        .json(&json!({"branchId": fx.b2.id, "number": 2, "capacity": 4}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn category_creation_is_owner_scoped_and_names_are_unique() {
    let fx = fixture().await;

    let response = fx
        .app
        .client
        .post(fx.url("/categories"))
        .header("x-user-id", fx.owner1.id.to_string())
        .json(&json!({"name": "Desserts", "restaurantId": fx.r1.id, "sortOrder": 3}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    // The name is already taken within r1.
    let response = fx
        .app
        .client
        .post(fx.url("/categories"))
        .header("x-user-id", fx.owner1.id.to_string())
        .json(&json!({"name": "Desserts", "restaurantId": fx.r1.id}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(
        error_message(response).await,
        "Category name already exists in this restaurant"
    );

    // An owner cannot create categories in another restaurant.
    let response = fx
        .app
        .client
        .post(fx.url("/categories"))
        .header("x-user-id", fx.owner1.id.to_string())
        .json(&json!({"name": "Desserts", "restaurantId": fx.r2.id}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    // Branch-tier roles have no restaurant-wide reach at all.
    let response = fx
        .app
        .client
        .get(fx.url(&format!("/categories?restaurantId={}", fx.r1.id)))
        .header("x-user-id", fx.waiter1.id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn menu_item_creation_derives_scope_from_the_category() {
    let fx = fixture().await;

    let response = fx
        .app
        .client
        .post(fx.url("/menu-items"))
        .header("x-user-id", fx.owner1.id.to_string())
        .json(&json!({
            "name": "Samosa",
            "price": 120.0,
            "categoryId": fx.item1.category_id
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    // Unknown category.
    let response = fx
        .app
        .client
        .post(fx.url("/menu-items"))
        .header("x-user-id", fx.owner1.id.to_string())
        .json(&json!({
            "name": "Samosa",
            "price": 120.0,
            "categoryId": Uuid::new_v4()
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    // The category belongs to r1, so r2's owner is out of scope.
    let response = fx
        .app
        .client
        .post(fx.url("/menu-items"))
        .header("x-user-id", fx.owner2.id.to_string())
        .json(&json!({
            "name": "Samosa",
            "price": 120.0,
            "categoryId": fx.item1.category_id
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn user_management_is_pinned_to_the_callers_restaurant() {
    let fx = fixture().await;

    // The owner of r1 hires a waiter for b1.
    let response = fx
        .app
        .client
        .post(fx.url("/users"))
        .header("x-user-id", fx.owner1.id.to_string())
        .json(&json!({
            "email": "new.waiter@example.com",
            "password": "s3cret-pw",
            "role": "WAITER",
            "branchId": fx.b1.id
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let created: User = response.json().await.unwrap();
    assert_eq!(created.role, Role::Waiter);
    assert_eq!(created.branch_id, Some(fx.b1.id));

    // Duplicate email.
    let response = fx
        .app
        .client
        .post(fx.url("/users"))
        .header("x-user-id", fx.owner1.id.to_string())
        .json(&json!({
            "email": "new.waiter@example.com",
            "password": "s3cret-pw",
            "role": "WAITER",
            "branchId": fx.b1.id
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(
        error_message(response).await,
        "User with this email already exists"
    );

    // A waiter may not create users at all.
    let response = fx
        .app
        .client
        .post(fx.url("/users"))
        .header("x-user-id", fx.waiter1.id.to_string())
        .json(&json!({
            "email": "intruder@example.com",
            "password": "pw",
            "role": "WAITER"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    // The owner's listing only covers r1-affiliated users.
    let response = fx
        .app
        .client
        .get(fx.url("/users"))
        .header("x-user-id", fx.owner1.id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let users: Vec<User> = response.json().await.unwrap();
    assert!(users.iter().any(|u| u.id == fx.waiter1.id));
    assert!(users.iter().all(|u| u.id != fx.owner2.id));

    // The super admin sees everyone.
    let response = fx
        .app
        .client
        .get(fx.url("/users"))
        .header("x-user-id", fx.super_admin.id.to_string())
        .send()
        .await
        .unwrap();
    let users: Vec<User> = response.json().await.unwrap();
    assert!(users.iter().any(|u| u.id == fx.owner2.id));
}

// --- Authentication ---

#[tokio::test]
async fn bearer_tokens_authenticate_and_garbage_does_not() {
    let fx = fixture().await;
    let config = AppConfig::default();

    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: fx.waiter1.id,
        exp: now + 3600,
        iat: now,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .unwrap();

    let response = fx
        .app
        .client
        .get(fx.url(&format!("/orders?branchId={}", fx.b1.id)))
        .header("Authorization", format!("Bearer {token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = fx
        .app
        .client
        .get(fx.url(&format!("/orders?branchId={}", fx.b1.id)))
        .header("Authorization", "Bearer not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn unknown_user_ids_do_not_authenticate() {
    let fx = fixture().await;
    let response = fx
        .app
        .client
        .get(fx.url(&format!("/orders?branchId={}", fx.b1.id)))
        .header("x-user-id", Uuid::new_v4().to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}
