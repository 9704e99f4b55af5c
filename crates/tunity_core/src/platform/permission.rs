//! Runtime permission seam.

/// Location permissions relevant to geofencing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    FineLocation,
    /// Required on newer OS versions for transitions while the app is closed.
    BackgroundLocation,
}

/// Answers whether the host currently holds a permission.
pub trait PermissionChecker: Send + Sync {
    fn is_granted(&self, permission: Permission) -> bool;
}
