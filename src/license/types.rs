/// License snapshot type definitions
///
/// Defines the canonical, normalized view of the licensing authority's
/// status document and the per-feature entitlement flags it carries.
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Raw status document as received from the licensing authority.
///
/// No shape is guaranteed; fields may be missing, null or mistyped.
pub type RawStatusDocument = Value;

/// Per-feature entitlement value, resolved during normalization
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FeatureFlag {
    /// Key not present in the features mapping
    Absent,
    /// Direct on/off flag
    Boolean { value: bool },
    /// Structured value; `enabled` is authoritative when present
    Descriptor {
        enabled: Option<Value>,
        extra: Map<String, Value>,
    },
    /// Any other shape (string, number, null, array)
    Other { value: Value },
}

impl FeatureFlag {
    /// Resolve a raw feature value into a flag variant
    pub fn from_raw(value: &Value) -> Self {
        match value {
            Value::Bool(b) => FeatureFlag::Boolean { value: *b },
            Value::Object(map) => {
                let enabled = map.get("enabled").cloned();
                let extra = map
                    .iter()
                    .filter(|(k, _)| k.as_str() != "enabled")
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                FeatureFlag::Descriptor { enabled, extra }
            }
            other => FeatureFlag::Other {
                value: other.clone(),
            },
        }
    }

    /// Whether this flag grants the feature
    pub fn is_granted(&self) -> bool {
        match self {
            FeatureFlag::Absent => false,
            FeatureFlag::Boolean { value } => *value,
            // A descriptor without `enabled` is treated as granted
            FeatureFlag::Descriptor { enabled, .. } => enabled.as_ref().map_or(true, is_truthy),
            FeatureFlag::Other { .. } => false,
        }
    }
}

/// Canonical license status, immutable once built
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseSnapshot {
    pub status: String,
    pub status_message: String,
    pub is_valid: bool,
    pub license_id: Option<String>,
    pub customer_name: Option<String>,
    pub product_code: Option<String>,
    pub product_name: Option<String>,
    pub edition_code: Option<String>,
    pub edition_name: Option<String>,
    pub license_type: Option<String>,
    pub valid_from: Option<String>,
    pub valid_until: Option<String>,
    pub installed_at: Option<String>,
    pub last_validated_at: Option<String>,
    pub features: BTreeMap<String, FeatureFlag>,
    pub limits: Map<String, Value>,
    pub deployment: Map<String, Value>,
    pub warnings: Vec<String>,
    /// The exact document this snapshot was built from
    pub raw: RawStatusDocument,
}

impl LicenseSnapshot {
    /// Look up a feature flag; missing keys resolve to `Absent`
    pub fn feature(&self, key: &str) -> &FeatureFlag {
        static ABSENT: FeatureFlag = FeatureFlag::Absent;
        self.features.get(key).unwrap_or(&ABSENT)
    }
}

/// Truthiness coercion for loosely-typed JSON values
///
/// `false`, `null`, zero and the empty string are falsy; everything else
/// (including empty arrays and objects) is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
