//! REST endpoints for vendor profiles.
//!
//! GET /api/vendors/{vendor_id}: read a profile
//! PUT /api/vendors/{vendor_id}: create or update a profile
//!
//! The profile decides which translation a vendor receives and the name
//! shown on its messages.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::models::VendorProfile;
use crate::state::AppState;
use crate::store::StoreError;

/// Maximum display name length (chars).
const MAX_NAME_LENGTH: usize = 100;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorResponse {
    pub vendor_id: String,
    pub name: String,
    pub preferred_language: Option<String>,
}

impl From<VendorProfile> for VendorResponse {
    fn from(profile: VendorProfile) -> Self {
        Self {
            vendor_id: profile.vendor_id,
            name: profile.name,
            preferred_language: profile.preferred_language,
        }
    }
}

/// Fields left out keep their stored value.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVendorRequest {
    pub name: Option<String>,
    pub preferred_language: Option<String>,
}

fn bad_request(msg: &str) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, msg.to_string())
}

fn store_failure(vendor_id: &str, e: StoreError) -> (StatusCode, String) {
    tracing::warn!(vendor_id = %vendor_id, error = %e, "Vendor store failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Failed to access vendor".to_string(),
    )
}

/// Lowercased language code, or `None` if it is not shaped like one
/// (`fr`, `pt-br`). Codes outside the supported set are accepted; such
/// vendors receive original text.
fn normalize_language(raw: &str) -> Option<String> {
    let code = raw.trim().to_ascii_lowercase();
    let valid = !code.is_empty()
        && code.len() <= 16
        && code.chars().all(|c| c.is_ascii_alphabetic() || c == '-');
    valid.then_some(code)
}

/// GET /api/vendors/{vendor_id}
pub async fn get_vendor(
    State(state): State<AppState>,
    Path(vendor_id): Path<String>,
) -> Result<Json<VendorResponse>, (StatusCode, String)> {
    let vendors = state.vendors.clone();
    let id = vendor_id.clone();

    let profile = tokio::task::spawn_blocking(move || vendors.lookup_vendor(&id))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Task join: {}", e)))?
        .map_err(|e| store_failure(&vendor_id, e))?;

    profile
        .map(|p| Json(p.into()))
        .ok_or((StatusCode::NOT_FOUND, "Vendor not found".to_string()))
}

/// PUT /api/vendors/{vendor_id}
///
/// Merges the given fields into the stored profile, creating it if the
/// vendor is new. A new vendor without a name is shown by its identity.
pub async fn put_vendor(
    State(state): State<AppState>,
    Path(vendor_id): Path<String>,
    Json(req): Json<UpdateVendorRequest>,
) -> Result<Json<VendorResponse>, (StatusCode, String)> {
    let vendor_id = vendor_id.trim().to_string();
    if vendor_id.is_empty() {
        return Err(bad_request("vendorId must not be empty"));
    }

    let name = match req.name {
        Some(name) => {
            let name = name.trim();
            if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
                return Err(bad_request("name must be 1-100 characters"));
            }
            Some(name.to_string())
        }
        None => None,
    };

    let preferred_language = match req.preferred_language {
        Some(raw) => Some(
            normalize_language(&raw)
                .ok_or_else(|| bad_request("preferredLanguage must be a language code"))?,
        ),
        None => None,
    };

    let vendors = state.vendors.clone();
    let id = vendor_id.clone();
    let saved = tokio::task::spawn_blocking(move || -> Result<VendorProfile, StoreError> {
        let profile = match vendors.lookup_vendor(&id)? {
            Some(mut existing) => {
                if let Some(name) = name {
                    existing.name = name;
                }
                if preferred_language.is_some() {
                    existing.preferred_language = preferred_language;
                }
                existing
            }
            None => VendorProfile {
                name: name.unwrap_or_else(|| id.clone()),
                preferred_language,
                vendor_id: id,
            },
        };
        vendors.save_vendor(&profile)?;
        Ok(profile)
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Task join: {}", e)))?
    .map_err(|e| store_failure(&vendor_id, e))?;

    tracing::info!(
        vendor_id = %saved.vendor_id,
        language = ?saved.preferred_language,
        "Vendor profile saved"
    );

    Ok(Json(saved.into()))
}
