//! Domain events for the application.
//!
//! Events are published on the broadcast bus after the triggering write has
//! committed; delivery to the external topic is best-effort and never rolls
//! back the request that produced the event.

use serde::Serialize;
use uuid::Uuid;

/// Events forwarded to the external notification topic.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum NotificationEvent {
    SubmissionAccepted {
        email: String,
        submission_url: String,
        assignment_id: Uuid,
        attempt: i32,
    },
}
