use serde::Serialize;
use uuid::Uuid;

use crate::entities::{assignments, submissions};

#[derive(Debug, Serialize)]
pub struct AssignmentDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub points: i32,
    pub num_of_attempts: i32,
    pub deadline: String,
    pub assignment_created: String,
    pub assignment_updated: String,
}

impl From<assignments::Model> for AssignmentDto {
    fn from(model: assignments::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            points: model.points,
            num_of_attempts: model.num_of_attempts,
            deadline: model.deadline,
            assignment_created: model.assignment_created,
            assignment_updated: model.assignment_updated,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmissionDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub assignment_id: Uuid,
    pub submission_url: String,
    pub attempts: i32,
    pub submission_created: String,
    pub submission_updated: String,
}

impl From<submissions::Model> for SubmissionDto {
    fn from(model: submissions::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            assignment_id: model.assignment_id,
            submission_url: model.submission_url,
            attempts: model.attempts,
            submission_created: model.submission_created,
            submission_updated: model.submission_updated,
        }
    }
}
