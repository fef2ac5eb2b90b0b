/// Status document normalization
///
/// Converts an untrusted raw status document into a `LicenseSnapshot`.
/// Malformed or missing fields degrade to their defaults; nothing here fails.
use super::types::{is_truthy, FeatureFlag, LicenseSnapshot, RawStatusDocument};
use serde_json::{Map, Value};

const DEFAULT_STATUS: &str = "unknown";

/// Build a snapshot from a raw document. `None` and JSON `null` yield `None`.
pub fn normalize(raw: Option<&RawStatusDocument>) -> Option<LicenseSnapshot> {
    let raw = match raw {
        None | Some(Value::Null) => return None,
        Some(raw) => raw,
    };

    let empty = Map::new();
    let doc = raw.as_object().unwrap_or(&empty);

    Some(LicenseSnapshot {
        status: string_field(doc, "status").unwrap_or_else(|| DEFAULT_STATUS.to_string()),
        status_message: string_field(doc, "status_message").unwrap_or_default(),
        is_valid: doc.get("is_valid").map_or(false, is_truthy),
        license_id: string_field(doc, "license_id"),
        customer_name: string_field(doc, "customer_name"),
        product_code: string_field(doc, "product_code"),
        product_name: string_field(doc, "product_name"),
        edition_code: string_field(doc, "edition_code"),
        edition_name: string_field(doc, "edition_name"),
        license_type: string_field(doc, "license_type"),
        valid_from: string_field(doc, "valid_from"),
        valid_until: string_field(doc, "valid_until"),
        installed_at: string_field(doc, "installed_at"),
        last_validated_at: string_field(doc, "last_validated_at"),
        features: object_field(doc, "features")
            .map(|features| {
                features
                    .iter()
                    .map(|(key, value)| (key.clone(), FeatureFlag::from_raw(value)))
                    .collect()
            })
            .unwrap_or_default(),
        // The status endpoint names this block `usage_limits`
        limits: object_field(doc, "limits")
            .or_else(|| object_field(doc, "usage_limits"))
            .cloned()
            .unwrap_or_default(),
        deployment: object_field(doc, "deployment").cloned().unwrap_or_default(),
        warnings: warnings_field(doc),
        raw: raw.clone(),
    })
}

fn string_field(doc: &Map<String, Value>, key: &str) -> Option<String> {
    doc.get(key).and_then(Value::as_str).map(str::to_string)
}

fn object_field<'a>(doc: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    doc.get(key).and_then(Value::as_object)
}

fn warnings_field(doc: &Map<String, Value>) -> Vec<String> {
    match doc.get("warnings") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
