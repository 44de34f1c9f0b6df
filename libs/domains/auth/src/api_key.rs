//! API key model: access levels, billing plans, and the authenticated scope.

use crate::error::AuthError;
use crate::rate_limit::RateLimitOverride;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// What a key is allowed to submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// Full ingestion access.
    All,
    /// Score-only keys, handed to end-user-facing integrations that must
    /// not be able to write traces.
    Scores,
}

impl AccessLevel {
    pub fn parse(s: &str) -> Result<Self, AuthError> {
        match s {
            "all" => Ok(Self::All),
            "scores" => Ok(Self::Scores),
            other => Err(AuthError::Config(format!("Unknown access level: {other}"))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Scores => "scores",
        }
    }
}

/// Billing plan attached to the key's organization.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, strum::Display, Serialize, Deserialize,
)]
pub enum Plan {
    #[strum(serialize = "default")]
    #[serde(rename = "default")]
    Default,
    #[strum(serialize = "cloud:hobby")]
    #[serde(rename = "cloud:hobby")]
    CloudHobby,
    #[strum(serialize = "cloud:pro")]
    #[serde(rename = "cloud:pro")]
    CloudPro,
    #[strum(serialize = "cloud:team")]
    #[serde(rename = "cloud:team")]
    CloudTeam,
    #[strum(serialize = "self-hosted:enterprise")]
    #[serde(rename = "self-hosted:enterprise")]
    SelfHostedEnterprise,
}

impl Plan {
    /// Parse the stored plan string. Unknown plans are a configuration
    /// error rather than an auth failure.
    pub fn parse(s: &str) -> Result<Self, AuthError> {
        match s {
            "default" => Ok(Self::Default),
            "cloud:hobby" => Ok(Self::CloudHobby),
            "cloud:pro" => Ok(Self::CloudPro),
            "cloud:team" => Ok(Self::CloudTeam),
            "self-hosted:enterprise" => Ok(Self::SelfHostedEnterprise),
            other => Err(AuthError::Config(format!("Unknown plan: {other}"))),
        }
    }
}

/// An API key enriched with its organization's plan and limit overrides.
#[derive(Debug, Clone)]
pub struct OrgEnrichedApiKey {
    pub id: Uuid,
    pub org_id: Uuid,
    pub project_id: Uuid,
    pub plan: Plan,
    pub rate_limit_overrides: Vec<RateLimitOverride>,
}

/// The authenticated principal attached to a request.
#[derive(Debug, Clone)]
pub struct ApiScope {
    pub project_id: Uuid,
    pub access_level: AccessLevel,
    pub api_key: OrgEnrichedApiKey,
}

/// Hash an API secret for storage/comparison (hex-encoded SHA-256).
pub fn hash_secret(secret: &str) -> String {
    let digest = Sha256::digest(secret.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_level_round_trips() {
        assert_eq!(AccessLevel::parse("all").unwrap(), AccessLevel::All);
        assert_eq!(AccessLevel::parse("scores").unwrap(), AccessLevel::Scores);
        assert!(AccessLevel::parse("admin").is_err());
    }

    #[test]
    fn plan_parses_known_values() {
        assert_eq!(Plan::parse("default").unwrap(), Plan::Default);
        assert_eq!(Plan::parse("cloud:hobby").unwrap(), Plan::CloudHobby);
        assert_eq!(Plan::parse("cloud:pro").unwrap(), Plan::CloudPro);
        assert_eq!(Plan::parse("cloud:team").unwrap(), Plan::CloudTeam);
        assert_eq!(
            Plan::parse("self-hosted:enterprise").unwrap(),
            Plan::SelfHostedEnterprise
        );
    }

    #[test]
    fn unknown_plan_is_config_error() {
        let err = Plan::parse("cloud:platinum").unwrap_err();
        assert!(matches!(err, AuthError::Config(_)));
        assert!(err.to_string().contains("cloud:platinum"));
    }

    #[test]
    fn plan_display_matches_wire_format() {
        assert_eq!(Plan::CloudHobby.to_string(), "cloud:hobby");
        assert_eq!(Plan::SelfHostedEnterprise.to_string(), "self-hosted:enterprise");
    }

    #[test]
    fn hash_secret_is_deterministic_and_hex() {
        let a = hash_secret("sk-secret-1");
        let b = hash_secret("sk-secret-1");
        let c = hash_secret("sk-secret-2");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
    }
}
