use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::auth::AuthenticatedUser;
use super::{ApiError, AppState, SubmissionDto, validation};
use crate::domain::events::NotificationEvent;

/// POST /assignments/{id}/submissions
///
/// Guard order: body shape, assignment existence, deadline window, attempt
/// limit. The attempt counter is incremented transactionally with the
/// submission write; the notification publish happens after and never
/// affects the response.
pub async fn create_submission(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(assignment_id): Path<Uuid>,
    body: Bytes,
) -> Result<(StatusCode, Json<SubmissionDto>), ApiError> {
    let payload = serde_json::from_slice(&body).map_err(|_| {
        tracing::warn!("Syntax error in the submission body");
        ApiError::validation("Syntax error in the request")
    })?;
    let submission_url = validation::validate_submission_payload(&payload)?;

    let assignment = state
        .store()
        .get_assignment(assignment_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load assignment: {e}")))?
        .ok_or(ApiError::NotFound)?;

    let deadline = validation::parse_deadline(&assignment.deadline)
        .ok_or_else(|| ApiError::internal("Stored deadline is not a valid date"))?;

    if Utc::now() > deadline {
        tracing::warn!(
            "Submission for assignment {} rejected: past deadline",
            assignment_id
        );
        return Err(ApiError::BadRequest);
    }

    let attempts = state
        .store()
        .count_submission_attempts(user.0, assignment_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to count attempts: {e}")))?;

    if attempts >= assignment.num_of_attempts {
        tracing::warn!(
            "Submission for assignment {} rejected: attempts exhausted ({}/{})",
            assignment_id,
            attempts,
            assignment.num_of_attempts
        );
        return Err(ApiError::Forbidden);
    }

    let submission = state
        .store()
        .record_submission(user.0, assignment_id, &submission_url)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to record submission: {e}")))?;

    publish_accepted(&state, user.0, &submission).await;

    Ok((StatusCode::CREATED, Json(SubmissionDto::from(submission))))
}

/// Fire-and-forget: the event carries the submitter's email and URL to the
/// notification bus. A lookup or publish failure is logged only.
async fn publish_accepted(
    state: &Arc<AppState>,
    user_id: Uuid,
    submission: &crate::entities::submissions::Model,
) {
    let email = match state.store().get_user(user_id).await {
        Ok(Some(user)) => user.email,
        Ok(None) => {
            tracing::error!("Submitter {} vanished before notification", user_id);
            return;
        }
        Err(e) => {
            tracing::error!("Failed to load submitter {}: {}", user_id, e);
            return;
        }
    };

    let event = NotificationEvent::SubmissionAccepted {
        email,
        submission_url: submission.submission_url.clone(),
        assignment_id: submission.assignment_id,
        attempt: submission.attempts,
    };

    if state.event_bus().send(event).is_err() {
        tracing::debug!("No notification listeners registered");
    }
}
