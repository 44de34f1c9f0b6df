//! API key verification against the database.

use crate::api_key::{hash_secret, AccessLevel, ApiScope, OrgEnrichedApiKey, Plan};
use crate::entity;
use crate::error::AuthError;
use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::debug;

/// Verifies Basic-auth credentials into an [`ApiScope`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApiKeyVerifier: Send + Sync {
    async fn verify(&self, public_key: &str, secret_key: &str) -> Result<ApiScope, AuthError>;
}

/// Database-backed verifier.
pub struct PgApiKeyVerifier {
    db: DatabaseConnection,
}

impl PgApiKeyVerifier {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ApiKeyVerifier for PgApiKeyVerifier {
    async fn verify(&self, public_key: &str, secret_key: &str) -> Result<ApiScope, AuthError> {
        let record = entity::Entity::find()
            .filter(entity::Column::PublicKey.eq(public_key))
            .one(&self.db)
            .await?
            .ok_or_else(|| AuthError::Unauthorized("Invalid credentials".to_string()))?;

        if record.hashed_secret != hash_secret(secret_key) {
            debug!(public_key = %public_key, "Secret hash mismatch");
            return Err(AuthError::Unauthorized("Invalid credentials".to_string()));
        }

        let plan = Plan::parse(&record.plan)?;
        let access_level = AccessLevel::parse(&record.access_level)?;

        let rate_limit_overrides = match record.rate_limit_overrides {
            Some(json) => serde_json::from_value(json)
                .map_err(|e| AuthError::Config(format!("Malformed rate limit overrides: {e}")))?,
            None => Vec::new(),
        };

        Ok(ApiScope {
            project_id: record.project_id,
            access_level,
            api_key: OrgEnrichedApiKey {
                id: record.id,
                org_id: record.org_id,
                project_id: record.project_id,
                plan,
                rate_limit_overrides,
            },
        })
    }
}
