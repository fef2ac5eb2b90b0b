/// License status and feature gating for the console
///
/// This module handles:
/// - Normalizing the licensing authority's status document
/// - Feature entitlement evaluation
/// - The status store that owns the current license snapshot
/// - The HTTP collaborator that talks to the licensing authority
pub mod client;
pub mod entitlements;
pub mod error;
pub mod normalize;
pub mod store;
pub mod types;

// ============================================================================
// Feature Constants
// ============================================================================

/// Data pipeline - run pipelines
pub const FEATURE_PIPELINE_EXECUTION: &str = "pipeline_execution";

/// Data pipeline - export results beyond the basic formats
pub const FEATURE_ADVANCED_EXPORT: &str = "advanced_export";

/// Data pipeline - invoke custom connectors
pub const FEATURE_CUSTOM_CONNECTORS: &str = "custom_connectors";

/// Features the console's panels gate on
pub const CONSOLE_FEATURES: &[&str] = &[
    FEATURE_PIPELINE_EXECUTION,
    FEATURE_ADVANCED_EXPORT,
    FEATURE_CUSTOM_CONNECTORS,
];

// Re-export main functions and types for convenience
pub use client::{HttpLicenseClient, LicenseClient};
pub use entitlements::{can_use, disabled_reason, evaluate, FeatureAccess};
pub use error::TransportError;
pub use normalize::normalize;
pub use store::{LicenseStore, StoreState};
pub use types::{FeatureFlag, LicenseSnapshot, RawStatusDocument};
