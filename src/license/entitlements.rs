//! Entitlement evaluation. Decides whether a named feature is usable under
//! the current license snapshot.
//!
//! Precedence of denials is fixed: no license, then invalid license, then
//! feature not granted.

use serde::Serialize;
use serde_json::{Map, Value};

use super::types::{FeatureFlag, LicenseSnapshot};

/// Result of a feature gate check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "access", rename_all = "snake_case")]
pub enum FeatureAccess {
    Granted,
    NoLicense,
    LicenseInvalid { status: String },
    NotGranted { feature: String },
}

impl FeatureAccess {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Granted)
    }

    pub fn denial_message(&self) -> Option<String> {
        match self {
            Self::Granted => None,
            Self::NoLicense => Some(no_license_message()),
            Self::LicenseInvalid { status } => Some(invalid_license_message(status)),
            Self::NotGranted { feature } => Some(not_granted_message(feature)),
        }
    }
}

/// Evaluate a feature against a snapshot.
///
/// An empty or missing feature key asks only whether a valid license exists.
pub fn evaluate(snapshot: Option<&LicenseSnapshot>, feature_key: Option<&str>) -> FeatureAccess {
    let snapshot = match snapshot {
        Some(snapshot) => snapshot,
        None => return FeatureAccess::NoLicense,
    };

    if !snapshot.is_valid {
        return FeatureAccess::LicenseInvalid {
            status: snapshot.status.clone(),
        };
    }

    let key = match feature_key {
        Some(key) if !key.is_empty() => key,
        _ => return FeatureAccess::Granted,
    };

    if snapshot.feature(key).is_granted() {
        FeatureAccess::Granted
    } else {
        FeatureAccess::NotGranted {
            feature: key.to_string(),
        }
    }
}

/// Whether the feature is usable under the snapshot.
pub fn can_use(snapshot: Option<&LicenseSnapshot>, feature_key: Option<&str>) -> bool {
    evaluate(snapshot, feature_key).is_allowed()
}

/// Explanation for a disabled feature, or `None` when `allowed`.
pub fn disabled_reason(
    snapshot: Option<&LicenseSnapshot>,
    feature_key: &str,
    allowed: bool,
) -> Option<String> {
    if allowed {
        return None;
    }
    match snapshot {
        None => Some(no_license_message()),
        Some(snapshot) if !snapshot.is_valid => Some(invalid_license_message(&snapshot.status)),
        Some(_) => Some(not_granted_message(feature_key)),
    }
}

/// Extra configuration carried by a descriptor flag (everything but `enabled`).
pub fn feature_config(snapshot: &LicenseSnapshot, feature_key: &str) -> Map<String, Value> {
    match snapshot.feature(feature_key) {
        FeatureFlag::Descriptor { extra, .. } => extra.clone(),
        _ => Map::new(),
    }
}

/// Per-action usage ceilings, for display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageLimit {
    pub max_per_day: Option<u64>,
    pub max_per_month: Option<u64>,
}

/// Read `limits[action]`. Only non-negative integer ceilings count.
pub fn usage_limit(snapshot: &LicenseSnapshot, action: &str) -> Option<UsageLimit> {
    let entry = snapshot.limits.get(action)?.as_object()?;
    let limit = UsageLimit {
        max_per_day: entry.get("max_per_day").and_then(Value::as_u64),
        max_per_month: entry.get("max_per_month").and_then(Value::as_u64),
    };
    if limit.max_per_day.is_none() && limit.max_per_month.is_none() {
        return None;
    }
    Some(limit)
}

fn no_license_message() -> String {
    "No license installed. Upload a license to enable this feature.".to_string()
}

fn invalid_license_message(status: &str) -> String {
    format!("License is not valid (status: {}).", status)
}

fn not_granted_message(feature_key: &str) -> String {
    format!("Feature '{}' is not enabled in the license.", feature_key)
}
