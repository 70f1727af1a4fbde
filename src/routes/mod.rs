/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated modules.
/// This structure ensures that access control is applied explicitly at the
/// module level (via Axum layers), preventing accidental exposure of protected
/// endpoints.
///
/// The three modules map directly to the application's access tiers.

/// Customer-facing routes (anonymous): menu, QR resolution, order placement.
pub mod public;

/// Staff routes protected by the `AuthUser` extractor middleware.
/// Requires a validated session; scope checks happen per handler.
pub mod authenticated;

/// Routes restricted exclusively to the SUPER_ADMIN role.
pub mod admin;
