use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use tracing::info;
use uuid::Uuid;

use crate::api::validation::AssignmentFields;
use crate::entities::{assignments, prelude::*};

/// Column ranges the original schema enforced at the store layer. The
/// payload validator only checks that the values are integers; range
/// violations surface as store errors.
const POINTS_RANGE: std::ops::RangeInclusive<i32> = 1..=10;
const ATTEMPTS_RANGE: std::ops::RangeInclusive<i32> = 1..=100;

pub struct AssignmentRepository {
    conn: DatabaseConnection,
}

impl AssignmentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn check_bounds(fields: &AssignmentFields) -> Result<()> {
        if !POINTS_RANGE.contains(&fields.points) {
            anyhow::bail!("points out of range: {}", fields.points);
        }
        if !ATTEMPTS_RANGE.contains(&fields.num_of_attempts) {
            anyhow::bail!("num_of_attempts out of range: {}", fields.num_of_attempts);
        }
        Ok(())
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        fields: &AssignmentFields,
    ) -> Result<assignments::Model> {
        Self::check_bounds(fields)?;

        let now = Utc::now().to_rfc3339();

        let active = assignments::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            name: Set(fields.name.clone()),
            points: Set(fields.points),
            num_of_attempts: Set(fields.num_of_attempts),
            deadline: Set(fields.deadline.to_rfc3339()),
            assignment_created: Set(now.clone()),
            assignment_updated: Set(now),
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert assignment")?;

        info!("Assignment created: {}", model.id);
        Ok(model)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<assignments::Model>> {
        Assignments::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query assignment by ID")
    }

    pub async fn list_all(&self) -> Result<Vec<assignments::Model>> {
        Assignments::find()
            .order_by_asc(assignments::Column::AssignmentCreated)
            .all(&self.conn)
            .await
            .context("Failed to list assignments")
    }

    /// Overwrites the mutable fields and stamps `assignment_updated`.
    /// `user_id` and `assignment_created` are never touched.
    pub async fn update(&self, id: Uuid, fields: &AssignmentFields) -> Result<bool> {
        Self::check_bounds(fields)?;

        let Some(existing) = Assignments::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query assignment for update")?
        else {
            return Ok(false);
        };

        let mut active: assignments::ActiveModel = existing.into();
        active.name = Set(fields.name.clone());
        active.points = Set(fields.points);
        active.num_of_attempts = Set(fields.num_of_attempts);
        active.deadline = Set(fields.deadline.to_rfc3339());
        active.assignment_updated = Set(Utc::now().to_rfc3339());
        active
            .update(&self.conn)
            .await
            .context("Failed to update assignment")?;

        info!("Assignment updated: {}", id);
        Ok(true)
    }

    pub async fn remove(&self, id: Uuid) -> Result<bool> {
        let result = Assignments::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete assignment")?;

        Ok(result.rows_affected > 0)
    }
}
