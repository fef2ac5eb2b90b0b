// Status panel rendering - plain-text view of the license store state

use std::fmt::Write;

use serde_json::Value;

use super::license::LicenseStatusResponse;

const LABEL_WIDTH: usize = 15;

/// Render the full status panel
pub fn render_status_panel(status: &LicenseStatusResponse) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== License Status ===");
    if status.loading {
        let _ = writeln!(out, "Loading license status...");
    }
    if let Some(error) = &status.error {
        let _ = writeln!(out, "Error: {}", error);
    }
    let _ = writeln!(out);

    line(&mut out, "Status", &status.status);
    line(&mut out, "Message", or_dash(Some(status.status_message.as_str())));
    line(&mut out, "Valid", if status.is_valid { "yes" } else { "no" });
    line(&mut out, "Installed at", or_dash(status.installed_at.as_deref()));
    if let Some(validated) = &status.last_validated_at {
        line(&mut out, "Last validated", validated);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "--- Identity ---");
    line(&mut out, "License ID", or_dash(status.license_id.as_deref()));
    line(&mut out, "License type", or_dash(status.license_type.as_deref()));
    line(&mut out, "Customer", or_dash(status.customer_name.as_deref()));
    line(
        &mut out,
        "Product",
        &named_code(status.product_name.as_deref(), status.product_code.as_deref()),
    );
    line(
        &mut out,
        "Edition",
        &named_code(status.edition_name.as_deref(), status.edition_code.as_deref()),
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "--- Validity ---");
    line(&mut out, "Valid from", or_dash(status.valid_from.as_deref()));
    line(&mut out, "Valid until", or_dash(status.valid_until.as_deref()));
    let _ = writeln!(out);

    let _ = writeln!(out, "--- Warnings ---");
    if status.warnings.is_empty() {
        let _ = writeln!(out, "(none)");
    }
    for warning in &status.warnings {
        let _ = writeln!(out, "- {}", warning);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "--- Features ---");
    if status.features.is_empty() {
        let _ = writeln!(out, "(none)");
    }
    for feature in &status.features {
        let state = if feature.enabled { "enabled" } else { "disabled" };
        if feature.config.is_empty() {
            let _ = writeln!(out, "- {}: {}", feature.key, state);
        } else {
            let _ = writeln!(
                out,
                "- {}: {} ({})",
                feature.key,
                state,
                inline_map(&feature.config)
            );
        }
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "--- Usage limits ---");
    if status.limits.is_empty() {
        let _ = writeln!(out, "(none)");
    }
    for (key, value) in &status.limits {
        let _ = writeln!(out, "- {}: {}", key, inline_value(value));
    }

    out
}

fn line(out: &mut String, label: &str, value: &str) {
    let _ = writeln!(out, "{:<width$}{}", format!("{}:", label), value, width = LABEL_WIDTH);
}

fn or_dash(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => "-",
    }
}

fn named_code(name: Option<&str>, code: Option<&str>) -> String {
    format!("{} ({})", or_dash(name), or_dash(code))
}

fn inline_map(map: &serde_json::Map<String, Value>) -> String {
    map.iter()
        .map(|(k, v)| format!("{}={}", k, inline_value(v)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn inline_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => format!("{{{}}}", inline_map(map)),
        other => other.to_string(),
    }
}
