//! One-shot user import at startup.
//!
//! Users are provisioned from a CSV dropped next to the deployment
//! (`first_name,last_name,email,password`, header row first). Passwords
//! are hashed before insert; rows whose email already exists are skipped,
//! so re-running the import is harmless.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

use crate::config::{BootstrapConfig, SecurityConfig};
use crate::db::Store;

pub struct ImportStats {
    pub imported: usize,
    pub skipped: usize,
}

pub async fn import_users(
    store: &Store,
    bootstrap: &BootstrapConfig,
    security: &SecurityConfig,
) -> Result<ImportStats> {
    let path = Path::new(&bootstrap.users_csv);

    if !path.exists() {
        warn!("User CSV not found at {}, skipping import", path.display());
        return Ok(ImportStats {
            imported: 0,
            skipped: 0,
        });
    }

    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read user CSV: {}", path.display()))?;

    let mut imported = 0;
    let mut skipped = 0;

    // Header row first, then first_name,last_name,email,password.
    for (line_no, line) in content.lines().enumerate().skip(1) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let &[first_name, last_name, email, password] = fields.as_slice() else {
            warn!("Skipping malformed CSV row {}", line_no + 1);
            skipped += 1;
            continue;
        };

        if store.find_user_by_email(email).await?.is_some() {
            skipped += 1;
            continue;
        }

        store
            .create_user(first_name, last_name, email, password, security)
            .await
            .with_context(|| format!("Failed to import user {email}"))?;
        imported += 1;
    }

    info!(
        "User bootstrap complete: {} imported, {} skipped",
        imported, skipped
    );

    Ok(ImportStats { imported, skipped })
}
