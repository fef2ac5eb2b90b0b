/// License commands for the console's panels
///
/// The read surface panels use: current status, feature checks, refresh and
/// the upload placeholder. Panels never mutate the store except through refresh.
use crate::license::entitlements::{self, feature_config, usage_limit, UsageLimit};
use crate::license::{LicenseSnapshot, LicenseStore, StoreState};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSummary {
    pub key: String,
    pub enabled: bool,
    pub config: Map<String, Value>,
    pub limit: Option<UsageLimitSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageLimitSummary {
    pub max_per_day: Option<u64>,
    pub max_per_month: Option<u64>,
}

impl From<UsageLimit> for UsageLimitSummary {
    fn from(limit: UsageLimit) -> Self {
        UsageLimitSummary {
            max_per_day: limit.max_per_day,
            max_per_month: limit.max_per_month,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseStatusResponse {
    pub loading: bool,
    pub error: Option<String>,
    pub error_status_code: Option<u16>,
    pub installed: bool,
    pub status: String, // "missing", "valid", "expired", "not_yet_valid", ... or "unknown"
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
    pub features: Vec<FeatureSummary>,
    pub limits: Map<String, Value>,
    pub deployment: Map<String, Value>,
    pub warnings: Vec<String>,
}

impl From<&StoreState> for LicenseStatusResponse {
    fn from(state: &StoreState) -> Self {
        let mut response = match state.snapshot.as_deref() {
            Some(snapshot) => LicenseStatusResponse::from(snapshot),
            None => LicenseStatusResponse {
                loading: false,
                error: None,
                error_status_code: None,
                installed: false,
                status: "missing".to_string(),
                status_message: String::new(),
                is_valid: false,
                license_id: None,
                customer_name: None,
                product_code: None,
                product_name: None,
                edition_code: None,
                edition_name: None,
                license_type: None,
                valid_from: None,
                valid_until: None,
                installed_at: None,
                last_validated_at: None,
                features: Vec::new(),
                limits: Map::new(),
                deployment: Map::new(),
                warnings: Vec::new(),
            },
        };

        response.loading = state.loading;
        response.error = state.last_error.as_ref().map(|e| e.to_string());
        response.error_status_code = state.last_error.as_ref().and_then(|e| e.status_code());
        response
    }
}

impl From<&LicenseSnapshot> for LicenseStatusResponse {
    fn from(snapshot: &LicenseSnapshot) -> Self {
        let features = snapshot
            .features
            .iter()
            .map(|(key, flag)| FeatureSummary {
                key: key.clone(),
                enabled: flag.is_granted(),
                config: feature_config(snapshot, key),
                limit: usage_limit(snapshot, key).map(UsageLimitSummary::from),
            })
            .collect();

        LicenseStatusResponse {
            loading: false,
            error: None,
            error_status_code: None,
            installed: true,
            status: snapshot.status.clone(),
            status_message: snapshot.status_message.clone(),
            is_valid: snapshot.is_valid,
            license_id: snapshot.license_id.clone(),
            customer_name: snapshot.customer_name.clone(),
            product_code: snapshot.product_code.clone(),
            product_name: snapshot.product_name.clone(),
            edition_code: snapshot.edition_code.clone(),
            edition_name: snapshot.edition_name.clone(),
            license_type: snapshot.license_type.clone(),
            valid_from: snapshot.valid_from.clone(),
            valid_until: snapshot.valid_until.clone(),
            installed_at: snapshot.installed_at.clone(),
            last_validated_at: snapshot.last_validated_at.clone(),
            features,
            limits: snapshot.limits.clone(),
            deployment: snapshot.deployment.clone(),
            warnings: snapshot.warnings.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureCheckResponse {
    pub feature: String,
    pub allowed: bool,
    pub reason: Option<String>,
}

/// Get current license status
pub fn get_license_status(store: &LicenseStore) -> LicenseStatusResponse {
    LicenseStatusResponse::from(&store.state())
}

/// Check whether a single feature is usable, with the reason when it is not
pub fn check_feature(store: &LicenseStore, feature: &str) -> FeatureCheckResponse {
    // Read once so the decision and its reason come from the same snapshot
    let snapshot = store.snapshot();
    let access = entitlements::evaluate(snapshot.as_deref(), Some(feature));

    FeatureCheckResponse {
        feature: feature.to_string(),
        allowed: access.is_allowed(),
        reason: access.denial_message(),
    }
}

/// Check several features, in order
pub fn check_features<S: AsRef<str>>(
    store: &LicenseStore,
    features: &[S],
) -> Vec<FeatureCheckResponse> {
    features
        .iter()
        .map(|feature| check_feature(store, feature.as_ref()))
        .collect()
}

/// Re-fetch the license status and return the result
pub async fn refresh_license(store: &LicenseStore) -> LicenseStatusResponse {
    store.refresh().await;
    get_license_status(store)
}

/// Upload a license document, then refresh so the new license becomes current
pub async fn upload_license(
    store: &LicenseStore,
    document: Value,
) -> Result<LicenseStatusResponse, String> {
    if !document.is_object() {
        return Err("License must be a JSON object.".to_string());
    }

    let uploaded = store.client().upload_license_document(&document).await?;
    let status = uploaded
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    tracing::info!(status, "License document uploaded");

    Ok(refresh_license(store).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::license::{LicenseClient, RawStatusDocument, TransportError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::Arc;

    /// In-memory licensing authority: uploads replace the installed document
    struct FakeAuthority {
        installed: Mutex<Option<Value>>,
        fail_fetch: bool,
    }

    impl FakeAuthority {
        fn with(installed: Option<Value>) -> Arc<Self> {
            Arc::new(Self {
                installed: Mutex::new(installed),
                fail_fetch: false,
            })
        }
    }

    #[async_trait]
    impl LicenseClient for FakeAuthority {
        async fn fetch_license_status(&self) -> Result<RawStatusDocument, TransportError> {
            if self.fail_fetch {
                return Err(TransportError::Http {
                    status: 500,
                    message: "Unexpected error while evaluating current license.".to_string(),
                });
            }
            Ok(self.installed.lock().clone().unwrap_or_else(|| {
                json!({
                    "status": "missing",
                    "status_message": "No license installed.",
                    "is_valid": false
                })
            }))
        }

        async fn upload_license_document(
            &self,
            document: &Value,
        ) -> Result<RawStatusDocument, TransportError> {
            if document.get("signature").is_none() {
                return Err(TransportError::Http {
                    status: 400,
                    message: "Missing required field in license document: 'signature'"
                        .to_string(),
                });
            }
            let status = json!({
                "status": "valid",
                "is_valid": true,
                "license_id": document["payload"]["license_id"],
                "features": document["payload"]["features"]
            });
            *self.installed.lock() = Some(status.clone());
            Ok(status)
        }
    }

    fn valid_document() -> Value {
        json!({
            "status": "valid",
            "status_message": "License is valid.",
            "is_valid": true,
            "license_id": "LIC-42",
            "customer_name": "Acme Corp",
            "edition_name": "Professional",
            "features": {
                "pipeline_execution": true,
                "advanced_export": {"enabled": true, "max_export_size_mb": 500},
                "custom_connectors": false
            },
            "usage_limits": {
                "pipeline_execution": {"max_per_day": 50, "max_per_month": 1000}
            },
            "warnings": ["expiring_soon"]
        })
    }

    #[tokio::test]
    async fn test_get_license_status_before_refresh() {
        let store = LicenseStore::new(FakeAuthority::with(None));

        let status = get_license_status(&store);
        assert!(!status.installed);
        assert_eq!(status.status, "missing");
        assert!(!status.loading);
        assert!(status.error.is_none());
    }

    #[tokio::test]
    async fn test_refresh_license_reports_snapshot() {
        let store = LicenseStore::new(FakeAuthority::with(Some(valid_document())));

        let status = refresh_license(&store).await;

        assert!(status.installed);
        assert!(status.is_valid);
        assert_eq!(status.license_id.as_deref(), Some("LIC-42"));
        assert_eq!(status.features.len(), 3);

        let export = status
            .features
            .iter()
            .find(|f| f.key == "advanced_export")
            .unwrap();
        assert!(export.enabled);
        assert_eq!(export.config.get("max_export_size_mb"), Some(&json!(500)));

        let pipeline = status
            .features
            .iter()
            .find(|f| f.key == "pipeline_execution")
            .unwrap();
        assert_eq!(
            pipeline.limit,
            Some(UsageLimitSummary {
                max_per_day: Some(50),
                max_per_month: Some(1000)
            })
        );
    }

    #[tokio::test]
    async fn test_refresh_license_reports_error() {
        let authority = Arc::new(FakeAuthority {
            installed: Mutex::new(Some(valid_document())),
            fail_fetch: true,
        });
        let store = LicenseStore::new(authority);

        let status = refresh_license(&store).await;

        assert!(!status.installed);
        assert_eq!(status.error_status_code, Some(500));
        assert!(status.error.unwrap().contains("Unexpected error"));
    }

    #[tokio::test]
    async fn test_check_features() {
        let store = LicenseStore::new(FakeAuthority::with(Some(valid_document())));
        store.refresh().await;

        let checks = check_features(
            &store,
            &["pipeline_execution", "custom_connectors", "advanced_export"],
        );

        assert_eq!(
            checks[0],
            FeatureCheckResponse {
                feature: "pipeline_execution".to_string(),
                allowed: true,
                reason: None
            }
        );
        assert!(!checks[1].allowed);
        assert!(checks[1].reason.as_ref().unwrap().contains("'custom_connectors'"));
        assert!(checks[2].allowed);
    }

    #[tokio::test]
    async fn test_check_feature_without_license() {
        let store = LicenseStore::new(FakeAuthority::with(None));
        store.refresh().await;

        let check = check_feature(&store, "pipeline_execution");
        assert!(!check.allowed);
        // A "missing" status document is still a snapshot, just an invalid one
        assert!(check.reason.unwrap().contains("missing"));
    }

    #[tokio::test]
    async fn test_check_feature_agrees_with_store() {
        let store = LicenseStore::new(FakeAuthority::with(Some(valid_document())));

        let check = check_feature(&store, "pipeline_execution");
        assert!(check.reason.unwrap().contains("No license installed"));

        store.refresh().await;
        for key in ["pipeline_execution", "advanced_export", "custom_connectors", "unknown"] {
            let check = check_feature(&store, key);
            assert_eq!(check.allowed, store.can_use(Some(key)), "{}", key);
            assert_eq!(
                check.reason,
                store.disabled_reason(key, check.allowed),
                "{}",
                key
            );
        }
    }

    #[tokio::test]
    async fn test_upload_license_refreshes_store() {
        let store = LicenseStore::new(FakeAuthority::with(None));
        store.refresh().await;
        assert!(!store.can_use(Some("pipeline_execution")));

        let document = json!({
            "meta": {"version": 1, "alg": "Ed25519", "key_id": "main-v1"},
            "payload": {"license_id": "LIC-7", "features": {"pipeline_execution": true}},
            "signature": "c2lnbmF0dXJl"
        });

        let status = upload_license(&store, document).await.unwrap();
        assert_eq!(status.license_id.as_deref(), Some("LIC-7"));
        assert!(store.can_use(Some("pipeline_execution")));
    }

    #[tokio::test]
    async fn test_upload_license_rejected_leaves_store_untouched() {
        let store = LicenseStore::new(FakeAuthority::with(Some(valid_document())));
        store.refresh().await;

        let err = upload_license(&store, json!({"meta": {}, "payload": {}}))
            .await
            .unwrap_err();
        assert!(err.contains("signature"));
        assert!(store.can_use(Some("pipeline_execution")));

        let err = upload_license(&store, json!("not a document")).await.unwrap_err();
        assert!(err.contains("JSON object"));
    }

    #[test]
    fn test_status_response_serializes_camel_case() {
        let state = StoreState::default();
        let json = serde_json::to_value(LicenseStatusResponse::from(&state)).unwrap();
        assert!(json.get("statusMessage").is_some());
        assert!(json.get("errorStatusCode").is_some());
        assert!(json.get("status_message").is_none());
    }
}
