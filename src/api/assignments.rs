use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use uuid::Uuid;

use super::auth::AuthenticatedUser;
use super::{ApiError, AppState, AssignmentDto, validation};

/// Parse the raw body as JSON; a malformed body is a client error, never a
/// handler fault.
fn parse_json(body: &Bytes) -> Result<serde_json::Value, ApiError> {
    serde_json::from_slice(body).map_err(|_| {
        tracing::warn!("Syntax error in the request body");
        ApiError::validation("Syntax error in the request")
    })
}

/// Reads and deletes take no body; one that is present is itself a
/// validation error.
fn reject_unexpected_body(body: &Bytes) -> Result<(), ApiError> {
    if body.is_empty() {
        Ok(())
    } else {
        tracing::warn!("Unexpected request body on a bodiless endpoint");
        Err(ApiError::BadRequest)
    }
}

/// POST /assignments
pub async fn create_assignment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let payload = parse_json(&body)?;
    let fields = validation::validate_assignment_payload(&payload)?;

    state
        .store()
        .create_assignment(user.0, &fields)
        .await
        .map_err(|e| {
            tracing::error!("Error creating assignment: {}", e);
            ApiError::BadRequest
        })?;

    Ok((StatusCode::CREATED, "").into_response())
}

/// GET /assignments
pub async fn list_assignments(
    State(state): State<Arc<AppState>>,
    Extension(_user): Extension<AuthenticatedUser>,
    body: Bytes,
) -> Result<Json<Vec<AssignmentDto>>, ApiError> {
    reject_unexpected_body(&body)?;

    let assignments = state.store().list_assignments().await.map_err(|e| {
        tracing::error!("Error retrieving assignments: {}", e);
        ApiError::BadRequest
    })?;

    Ok(Json(
        assignments.into_iter().map(AssignmentDto::from).collect(),
    ))
}

/// GET /assignments/{id}
pub async fn get_assignment(
    State(state): State<Arc<AppState>>,
    Extension(_user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<AssignmentDto>, ApiError> {
    reject_unexpected_body(&body)?;

    let assignment = state
        .store()
        .get_assignment(id)
        .await
        .map_err(|e| {
            tracing::error!("Error retrieving assignment {}: {}", id, e);
            ApiError::BadRequest
        })?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(AssignmentDto::from(assignment)))
}

/// PUT/PATCH /assignments/{id}
///
/// Existence and ownership are checked before the payload, so a non-owner
/// sees 403 regardless of what they sent.
pub async fn update_assignment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let assignment = state
        .store()
        .get_assignment(id)
        .await
        .map_err(|e| {
            tracing::error!("Error retrieving assignment {}: {}", id, e);
            ApiError::BadRequest
        })?
        .ok_or(ApiError::NotFound)?;

    if assignment.user_id != user.0 {
        tracing::warn!(
            "Permission denied: user {} cannot update assignment {}",
            user.0,
            id
        );
        return Err(ApiError::Forbidden);
    }

    let payload = parse_json(&body)?;
    let fields = validation::validate_assignment_payload(&payload)?;

    state.store().update_assignment(id, &fields).await.map_err(|e| {
        tracing::error!("Error updating assignment {}: {}", id, e);
        ApiError::BadRequest
    })?;

    Ok((StatusCode::NO_CONTENT, "").into_response())
}

/// DELETE /assignments/{id}
pub async fn delete_assignment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let assignment = state
        .store()
        .get_assignment(id)
        .await
        .map_err(|e| {
            tracing::error!("Error retrieving assignment {}: {}", id, e);
            ApiError::BadRequest
        })?
        .ok_or(ApiError::NotFound)?;

    if assignment.user_id != user.0 {
        tracing::warn!(
            "Permission denied: user {} cannot remove assignment {}",
            user.0,
            id
        );
        return Err(ApiError::Forbidden);
    }

    reject_unexpected_body(&body)?;

    // An assignment that has already been submitted against stays.
    let attempts = state
        .store()
        .count_submission_attempts(user.0, id)
        .await
        .map_err(|e| {
            tracing::error!("Error counting submissions for {}: {}", id, e);
            ApiError::BadRequest
        })?;

    if attempts > 0 {
        tracing::warn!("Assignment {} has submissions, refusing to remove", id);
        return Err(ApiError::BadRequest);
    }

    state.store().delete_assignment(id).await.map_err(|e| {
        tracing::error!("Error removing assignment {}: {}", id, e);
        ApiError::BadRequest
    })?;

    Ok((StatusCode::NO_CONTENT, "").into_response())
}
