use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use super::ApiError;

const REQUIRED_KEYS: [&str; 4] = ["name", "points", "num_of_attempts", "deadline"];
const OPTIONAL_KEYS: [&str; 2] = ["assignment_created", "assignment_updated"];

const SUBMISSION_KEY: &str = "submission_url";

/// Validated assignment payload. The timestamp keys are accepted in the
/// body but ignored; the server stamps its own.
#[derive(Debug, Clone)]
pub struct AssignmentFields {
    pub name: String,
    pub points: i32,
    pub num_of_attempts: i32,
    pub deadline: DateTime<Utc>,
}

/// Checks an assignment create/update body. The check order is fixed and
/// the first failure wins: required keys, extra keys, then per-field types
/// (name, points, num_of_attempts, deadline).
pub fn validate_assignment_payload(body: &Value) -> Result<AssignmentFields, ApiError> {
    let Some(object) = body.as_object() else {
        return Err(ApiError::validation("Request body must be a JSON object"));
    };

    let missing: Vec<&str> = REQUIRED_KEYS
        .iter()
        .filter(|key| !object.contains_key(**key))
        .copied()
        .collect();

    if !missing.is_empty() {
        tracing::warn!("Missing required keys in the payload: {}", missing.join(", "));
        return Err(ApiError::validation(format!(
            "Missing required keys: {}",
            missing.join(", ")
        )));
    }

    let extra: Vec<&str> = object
        .keys()
        .filter(|key| {
            !REQUIRED_KEYS.contains(&key.as_str()) && !OPTIONAL_KEYS.contains(&key.as_str())
        })
        .map(String::as_str)
        .collect();

    if !extra.is_empty() {
        tracing::warn!("Invalid keys in the payload: {}", extra.join(", "));
        return Err(ApiError::validation(format!(
            "Invalid keys in the payload: {}",
            extra.join(", ")
        )));
    }

    let Some(name) = object["name"].as_str() else {
        return Err(ApiError::validation("Name must be a string."));
    };

    let Some(points) = as_integer(&object["points"]) else {
        return Err(ApiError::validation("Points must be an integer."));
    };

    let Some(num_of_attempts) = as_integer(&object["num_of_attempts"]) else {
        return Err(ApiError::validation(
            "Number of attempts must be an integer.",
        ));
    };

    let deadline = object["deadline"]
        .as_str()
        .and_then(parse_deadline)
        .ok_or_else(|| ApiError::validation("Deadline must be a valid date."))?;

    Ok(AssignmentFields {
        name: name.to_string(),
        points,
        num_of_attempts,
        deadline,
    })
}

/// Checks a submission body: exactly one key, `submission_url`, holding a
/// string. Anything else is a validation failure.
pub fn validate_submission_payload(body: &Value) -> Result<String, ApiError> {
    let Some(object) = body.as_object() else {
        return Err(ApiError::validation("Request body must be a JSON object"));
    };

    if object.len() != 1 {
        tracing::warn!("Submission body must contain exactly one key");
        return Err(ApiError::validation(
            "Submission body must contain exactly the submission_url key",
        ));
    }

    let Some((key, value)) = object.iter().next() else {
        return Err(ApiError::validation(
            "Submission body must contain exactly the submission_url key",
        ));
    };

    if key != SUBMISSION_KEY {
        tracing::warn!("Invalid keys in the submission payload: {}", key);
        return Err(ApiError::validation(format!(
            "Invalid keys in the payload: {}",
            key
        )));
    }

    let Some(url) = value.as_str() else {
        return Err(ApiError::validation("submission_url must be a string."));
    };

    Ok(url.to_string())
}

/// Integer check that rejects floats and non-numbers outright; `5.0` is
/// not an integer here.
fn as_integer(value: &Value) -> Option<i32> {
    value.as_i64().and_then(|n| i32::try_from(n).ok())
}

/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS`, or a bare date
/// (interpreted as midnight UTC).
pub fn parse_deadline(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(Utc.from_utc_datetime(&dt));
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|dt| Utc.from_utc_datetime(&dt));
    }

    None
}
