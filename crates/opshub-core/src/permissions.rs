//! Permission string helpers.
//!
//! Permissions are flat `module:action` strings (e.g. `ops:view`,
//! `finance:export`). The auth layer owns grant storage; these helpers only
//! answer membership questions against an already-resolved grant set.

/// Checks whether a single permission is granted.
pub fn has_permission(granted: &[String], required: &str) -> bool {
    granted.iter().any(|p| p == required)
}

/// Checks whether at least one of the required permissions is granted.
pub fn has_any_permission(granted: &[String], required: &[String]) -> bool {
    required.iter().any(|p| has_permission(granted, p))
}

/// Checks whether every required permission is granted.
///
/// An empty requirement set is always satisfied.
pub fn has_all_permissions(granted: &[String], required: &[String]) -> bool {
    required.iter().all(|p| has_permission(granted, p))
}
