use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{auth::AuthUser, error::ApiError};

/// Role
///
/// The closed set of user roles. Modeled as an enum rather than a string so the
/// compiler enforces that every access-check function handles every role; adding
/// a role fails to compile until each `match` below is extended.
///
/// The hierarchy mirrors the physical ownership hierarchy:
/// system (SUPER_ADMIN) ⊃ restaurant (RESTAURANT_OWNER, MANAGER) ⊃ branch
/// (BRANCH_MANAGER, CHEF, WAITER, STAFF).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, TS, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum Role {
    SuperAdmin,
    RestaurantOwner,
    Manager,
    BranchManager,
    Chef,
    Waiter,
    Staff,
}

impl Role {
    /// The capability set granted to this role.
    ///
    /// This is the entire permission table: a static role → capability mapping,
    /// baked in at compile time and therefore safe for unsynchronized concurrent
    /// reads from any number of worker tasks. Permissions are entirely
    /// role-derived; there are no per-user overrides.
    pub fn permissions(self) -> &'static [&'static str] {
        match self {
            Role::SuperAdmin => &[
                "manage_restaurants",
                "manage_branches",
                "manage_users",
                "manage_menus",
                "manage_orders",
                "manage_settings",
                "manage_addons",
                "manage_themes",
                "view_analytics",
                "access_all_branches",
            ],
            Role::RestaurantOwner => &[
                "manage_restaurant",
                "manage_branches",
                "manage_users",
                "manage_menus",
                "manage_orders",
                "manage_settings",
                "view_analytics",
                "access_restaurant_branches",
            ],
            Role::Manager => &[
                "manage_branches",
                "manage_users",
                "manage_menus",
                "manage_orders",
                "view_analytics",
                "access_assigned_branches",
            ],
            Role::BranchManager => &[
                "manage_branch",
                "manage_users",
                "manage_menus",
                "manage_orders",
                "view_branch_analytics",
                "access_assigned_branch",
            ],
            Role::Chef => &[
                "view_orders",
                "update_order_status",
                "manage_kitchen",
                "access_assigned_branch",
            ],
            Role::Waiter => &[
                "create_orders",
                "view_orders",
                "update_order_status",
                "manage_tables",
                "access_assigned_branch",
            ],
            Role::Staff => &["view_orders", "manage_tables", "access_assigned_branch"],
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::RestaurantOwner => "RESTAURANT_OWNER",
            Role::Manager => "MANAGER",
            Role::BranchManager => "BRANCH_MANAGER",
            Role::Chef => "CHEF",
            Role::Waiter => "WAITER",
            Role::Staff => "STAFF",
        };
        f.write_str(name)
    }
}

/// has_capability
///
/// Pure lookup into the permission table. An unknown capability is simply not
/// in any role's set, so the function returns false rather than erroring.
pub fn has_capability(user: &AuthUser, capability: &str) -> bool {
    user.role.permissions().contains(&capability)
}

/// require_role
///
/// Fails with `Forbidden` (not `Unauthenticated` — the identity itself is
/// valid) when the user's role is outside the allowed set.
pub fn require_role(user: &AuthUser, allowed: &[Role]) -> Result<(), ApiError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

/// can_access_branch
///
/// Scope check for branch-owned resources (tables, orders, branch dashboards).
///
/// `target_restaurant_id` is the restaurant owning the target branch; callers
/// have already loaded the branch (or the order's branch) and pass it along so
/// restaurant-tier roles are verified against actual ownership instead of being
/// granted blanket access. SUPER_ADMIN passes unconditionally — scope precedes
/// existence, so even ids that resolve to nothing are in scope for it.
pub fn can_access_branch(
    user: &AuthUser,
    target_branch_id: Uuid,
    target_restaurant_id: Uuid,
) -> bool {
    match user.role {
        Role::SuperAdmin => true,
        Role::RestaurantOwner | Role::Manager => {
            user.restaurant_id == Some(target_restaurant_id)
        }
        Role::BranchManager | Role::Chef | Role::Waiter | Role::Staff => {
            user.branch_id == Some(target_branch_id)
        }
    }
}

/// can_access_restaurant
///
/// Scope check for restaurant-owned resources (categories, menu items, the
/// restaurant dashboard). Branch-tier roles never have restaurant-wide reach.
pub fn can_access_restaurant(user: &AuthUser, target_restaurant_id: Uuid) -> bool {
    match user.role {
        Role::SuperAdmin => true,
        Role::RestaurantOwner | Role::Manager => {
            user.restaurant_id == Some(target_restaurant_id)
        }
        Role::BranchManager | Role::Chef | Role::Waiter | Role::Staff => false,
    }
}
