use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::api::validation::AssignmentFields;
use crate::config::SecurityConfig;
use crate::entities::{assignments, submissions};

pub mod migrator;
pub mod repositories;

pub use repositories::user::User;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    /// Lightweight round-trip with no data access; the health gate's probe.
    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn assignment_repo(&self) -> repositories::assignment::AssignmentRepository {
        repositories::assignment::AssignmentRepository::new(self.conn.clone())
    }

    fn submission_repo(&self) -> repositories::submission::SubmissionRepository {
        repositories::submission::SubmissionRepository::new(self.conn.clone())
    }

    // ========== Users ==========

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().find_by_email(email).await
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        self.user_repo().find_by_id(id).await
    }

    /// Resolves Basic credentials to a user id. `None` covers both an
    /// unknown email and a password mismatch; callers cannot tell which.
    pub async fn verify_user_credentials(&self, email: &str, password: &str) -> Result<Option<Uuid>> {
        self.user_repo().verify_credentials(email, password).await
    }

    pub async fn create_user(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
        security: &SecurityConfig,
    ) -> Result<User> {
        self.user_repo()
            .create(first_name, last_name, email, password, security)
            .await
    }

    // ========== Assignments ==========

    pub async fn create_assignment(
        &self,
        user_id: Uuid,
        fields: &AssignmentFields,
    ) -> Result<assignments::Model> {
        self.assignment_repo().create(user_id, fields).await
    }

    pub async fn get_assignment(&self, id: Uuid) -> Result<Option<assignments::Model>> {
        self.assignment_repo().get(id).await
    }

    pub async fn list_assignments(&self) -> Result<Vec<assignments::Model>> {
        self.assignment_repo().list_all().await
    }

    pub async fn update_assignment(&self, id: Uuid, fields: &AssignmentFields) -> Result<bool> {
        self.assignment_repo().update(id, fields).await
    }

    pub async fn delete_assignment(&self, id: Uuid) -> Result<bool> {
        self.assignment_repo().remove(id).await
    }

    // ========== Submissions ==========

    pub async fn count_submission_attempts(
        &self,
        user_id: Uuid,
        assignment_id: Uuid,
    ) -> Result<i32> {
        self.submission_repo()
            .count_attempts(user_id, assignment_id)
            .await
    }

    /// Upserts the (user, assignment) submission row and increments its
    /// attempt counter inside one transaction.
    pub async fn record_submission(
        &self,
        user_id: Uuid,
        assignment_id: Uuid,
        submission_url: &str,
    ) -> Result<submissions::Model> {
        self.submission_repo()
            .record(user_id, assignment_id, submission_url)
            .await
    }
}
