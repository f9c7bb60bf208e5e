//! # Dashboard Redirect Handler
//!
//! The redirect endpoint that forwards a user's browser into the platform
//! dashboard via single-sign-on, or reports why it cannot.

use crate::error::ApiError;
use crate::manager::EntryPoint;
use crate::server::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Redirect,
};
use uuid::Uuid;

/// Redirects to the platform dashboard through single-sign-on
#[utoipa::path(
    get,
    path = "/dashboard/{company_id}",
    params(
        ("company_id" = String, Path, description = "Company identifier")
    ),
    responses(
        (status = 303, description = "Redirect to the SSO dashboard URL"),
        (status = 404, description = "No configuration exists for this company", body = ApiError),
        (status = 409, description = "Configuration exists but registration has not issued a token", body = ApiError)
    ),
    tag = "dashboard"
)]
pub async fn open_dashboard(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
) -> Result<Redirect, ApiError> {
    let manager = state.manager();

    match manager.resolve_entry_point(&company_id).await? {
        EntryPoint::Dashboard { sso_url } => Ok(Redirect::to(&sso_url)),
        EntryPoint::CreateConfiguration { .. } => Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "NO_CONFIGURATION",
            "No platform configuration exists for this company; create one first",
        )),
        EntryPoint::EditConfiguration { .. } => Err(ApiError::new(
            StatusCode::CONFLICT,
            "NOT_REGISTERED",
            "The configuration has no dashboard token yet; complete registration first",
        )),
    }
}
