use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use crate::entities::{prelude::*, submissions};

pub struct SubmissionRepository {
    conn: DatabaseConnection,
}

impl SubmissionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Attempts already used by this user against this assignment.
    pub async fn count_attempts(&self, user_id: Uuid, assignment_id: Uuid) -> Result<i32> {
        let submission = Submissions::find()
            .filter(submissions::Column::UserId.eq(user_id))
            .filter(submissions::Column::AssignmentId.eq(assignment_id))
            .one(&self.conn)
            .await
            .context("Failed to query submission attempts")?;

        Ok(submission.map_or(0, |s| s.attempts))
    }

    /// Writes the submission and increments the attempt counter as one
    /// transaction: first submission inserts a row with `attempts = 1`,
    /// later ones update the URL and bump the counter.
    pub async fn record(
        &self,
        user_id: Uuid,
        assignment_id: Uuid,
        submission_url: &str,
    ) -> Result<submissions::Model> {
        let txn = self.conn.begin().await.context("Failed to open transaction")?;

        let existing = Submissions::find()
            .filter(submissions::Column::UserId.eq(user_id))
            .filter(submissions::Column::AssignmentId.eq(assignment_id))
            .one(&txn)
            .await
            .context("Failed to query submission for upsert")?;

        let now = Utc::now().to_rfc3339();

        let model = if let Some(existing) = existing {
            let attempts = existing.attempts + 1;
            let mut active: submissions::ActiveModel = existing.into();
            active.submission_url = Set(submission_url.to_string());
            active.attempts = Set(attempts);
            active.submission_updated = Set(now);
            active
                .update(&txn)
                .await
                .context("Failed to update submission")?
        } else {
            let active = submissions::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                assignment_id: Set(assignment_id),
                submission_url: Set(submission_url.to_string()),
                attempts: Set(1),
                submission_created: Set(now.clone()),
                submission_updated: Set(now),
            };
            active
                .insert(&txn)
                .await
                .context("Failed to insert submission")?
        };

        txn.commit().await.context("Failed to commit submission")?;

        info!(
            "Submission recorded for assignment {} (attempt {})",
            assignment_id, model.attempts
        );
        Ok(model)
    }
}
