//! Redis-backed per-organization rate limiting.
//!
//! Budgets derive from the organization's billing plan, with optional
//! per-key overrides. Counting uses a fixed window implemented as an atomic
//! Lua script (`INCR` plus `PEXPIRE` on the first hit), so concurrent
//! callers on the same `(org, resource)` never double-admit.

use crate::api_key::{OrgEnrichedApiKey, Plan};
use crate::error::AuthError;
use redis::aio::ConnectionManager;
use redis::Script;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Closed set of rate-limited resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RateLimitResource {
    Ingestion,
    Prompts,
    PublicApi,
    PublicApiMetrics,
}

impl RateLimitResource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ingestion => "ingestion",
            Self::Prompts => "prompts",
            Self::PublicApi => "public-api",
            Self::PublicApiMetrics => "public-api-metrics",
        }
    }

    /// Redis key for one organization's window on this resource.
    fn key(&self, org_id: &uuid::Uuid) -> String {
        format!("rate-limit:{}:{}", self.as_str(), org_id)
    }
}

/// Budget for one resource. `None` on either field means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub points: Option<u32>,
    pub duration_seconds: Option<u64>,
}

impl RateLimitConfig {
    pub const fn limited(points: u32, duration_seconds: u64) -> Self {
        Self {
            points: Some(points),
            duration_seconds: Some(duration_seconds),
        }
    }

    pub const fn unlimited() -> Self {
        Self {
            points: None,
            duration_seconds: None,
        }
    }
}

/// Per-key override of a single resource's budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitOverride {
    pub resource: RateLimitResource,
    pub points: Option<u32>,
    pub duration_seconds: Option<u64>,
}

/// Plans sharing one limit configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlanGroup {
    Default,
    Team,
}

fn plan_group(plan: Plan) -> PlanGroup {
    match plan {
        Plan::Default | Plan::CloudHobby | Plan::CloudPro => PlanGroup::Default,
        Plan::CloudTeam | Plan::SelfHostedEnterprise => PlanGroup::Team,
    }
}

fn group_config(group: PlanGroup, resource: RateLimitResource) -> RateLimitConfig {
    match (group, resource) {
        (PlanGroup::Default, RateLimitResource::Ingestion) => RateLimitConfig::limited(100, 60),
        (PlanGroup::Default, RateLimitResource::PublicApi) => RateLimitConfig::limited(1_000, 60),
        (PlanGroup::Default, RateLimitResource::PublicApiMetrics) => {
            RateLimitConfig::limited(10, 60)
        }
        (PlanGroup::Team, RateLimitResource::Ingestion) => RateLimitConfig::limited(5_000, 60),
        (PlanGroup::Team, RateLimitResource::PublicApi) => RateLimitConfig::limited(20_000, 60),
        (PlanGroup::Team, RateLimitResource::PublicApiMetrics) => RateLimitConfig::limited(100, 60),
        (_, RateLimitResource::Prompts) => RateLimitConfig::unlimited(),
    }
}

/// Resolve the budget that applies to a key for a resource:
/// per-key override first, then the plan group's entry.
pub fn effective_config(
    api_key: &OrgEnrichedApiKey,
    resource: RateLimitResource,
) -> RateLimitConfig {
    if let Some(o) = api_key
        .rate_limit_overrides
        .iter()
        .find(|o| o.resource == resource)
    {
        return RateLimitConfig {
            points: o.points,
            duration_seconds: o.duration_seconds,
        };
    }

    group_config(plan_group(api_key.plan), resource)
}

/// Outcome of one admission attempt.
///
/// Depletion is reported through the same shape (`remaining_points == 0`,
/// `allowed() == false`); the middleware decides response policy.
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    pub resource: RateLimitResource,
    pub points: u32,
    pub remaining_points: u32,
    pub ms_before_next: u64,
    pub consumed_points: u64,
    pub is_first_in_duration: bool,
}

impl RateLimitResult {
    /// Whether this attempt was admitted.
    pub fn allowed(&self) -> bool {
        self.consumed_points <= u64::from(self.points)
    }
}

// INCR and set the window expiry atomically; returns (count, remaining ttl).
const CONSUME_SCRIPT: &str = r#"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
    redis.call('PEXPIRE', KEYS[1], ARGV[1])
end
local ttl = redis.call('PTTL', KEYS[1])
return {count, ttl}
"#;

/// Per-(org, resource) admission against Redis counters.
#[derive(Clone)]
pub struct RateLimitService {
    redis: Option<ConnectionManager>,
    enabled: bool,
    store_timeout: Duration,
}

impl RateLimitService {
    /// Active limiter for cloud deployments.
    pub fn new(redis: ConnectionManager, enabled: bool) -> Self {
        Self {
            redis: Some(redis),
            enabled,
            store_timeout: Duration::from_secs(2),
        }
    }

    /// Limiter that admits everything (self-hosted deployments, tests).
    pub fn disabled() -> Self {
        Self {
            redis: None,
            enabled: false,
            store_timeout: Duration::from_secs(2),
        }
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Consume one token for `(api_key.org_id, resource)`.
    ///
    /// Returns `None` when limiting does not apply (non-cloud deployment or
    /// an unlimited effective budget). Store errors and timeouts propagate
    /// so the caller can fail closed.
    pub async fn check(
        &self,
        api_key: &OrgEnrichedApiKey,
        resource: RateLimitResource,
    ) -> Result<Option<RateLimitResult>, AuthError> {
        if !self.enabled {
            return Ok(None);
        }

        let Some(redis) = &self.redis else {
            return Ok(None);
        };

        let config = effective_config(api_key, resource);
        let (Some(points), Some(duration_seconds)) = (config.points, config.duration_seconds)
        else {
            return Ok(None);
        };

        let key = resource.key(&api_key.org_id);
        let window_ms = duration_seconds * 1_000;

        let mut conn = redis.clone();
        let script = Script::new(CONSUME_SCRIPT);
        let mut invocation = script.key(&key);
        invocation.arg(window_ms);
        let invoke = invocation.invoke_async::<(i64, i64)>(&mut conn);

        let (count, ttl_ms) = tokio::time::timeout(self.store_timeout, invoke)
            .await
            .map_err(|_| AuthError::RateLimitStore("Rate limit store timed out".to_string()))?
            .map_err(|e| AuthError::RateLimitStore(e.to_string()))?;

        let consumed = count.max(0) as u64;
        let remaining = u64::from(points).saturating_sub(consumed) as u32;
        // PTTL returns -1/-2 on missing expiry; fall back to a full window.
        let ms_before_next = if ttl_ms > 0 {
            ttl_ms as u64
        } else {
            window_ms
        };

        let result = RateLimitResult {
            resource,
            points,
            remaining_points: remaining,
            ms_before_next,
            consumed_points: consumed,
            is_first_in_duration: consumed == 1,
        };

        debug!(
            org_id = %api_key.org_id,
            resource = resource.as_str(),
            consumed = consumed,
            remaining = remaining,
            allowed = result.allowed(),
            "Rate limit check"
        );

        Ok(Some(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn key_with(plan: Plan, overrides: Vec<RateLimitOverride>) -> OrgEnrichedApiKey {
        OrgEnrichedApiKey {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            plan,
            rate_limit_overrides: overrides,
        }
    }

    #[test]
    fn resource_wire_names() {
        assert_eq!(RateLimitResource::Ingestion.as_str(), "ingestion");
        assert_eq!(RateLimitResource::Prompts.as_str(), "prompts");
        assert_eq!(RateLimitResource::PublicApi.as_str(), "public-api");
        assert_eq!(
            RateLimitResource::PublicApiMetrics.as_str(),
            "public-api-metrics"
        );
    }

    #[test]
    fn redis_key_includes_resource_and_org() {
        let org_id = Uuid::new_v4();
        let key = RateLimitResource::Ingestion.key(&org_id);
        assert_eq!(key, format!("rate-limit:ingestion:{org_id}"));
    }

    #[test]
    fn hobby_and_pro_share_default_group() {
        for plan in [Plan::Default, Plan::CloudHobby, Plan::CloudPro] {
            let config = effective_config(&key_with(plan, vec![]), RateLimitResource::Ingestion);
            assert_eq!(config, RateLimitConfig::limited(100, 60));
        }
    }

    #[test]
    fn team_and_enterprise_share_team_group() {
        for plan in [Plan::CloudTeam, Plan::SelfHostedEnterprise] {
            let config = effective_config(&key_with(plan, vec![]), RateLimitResource::Ingestion);
            assert_eq!(config, RateLimitConfig::limited(5_000, 60));
        }
    }

    #[test]
    fn prompts_are_unlimited_for_all_groups() {
        for plan in [Plan::Default, Plan::CloudTeam] {
            let config = effective_config(&key_with(plan, vec![]), RateLimitResource::Prompts);
            assert_eq!(config, RateLimitConfig::unlimited());
        }
    }

    #[test]
    fn override_wins_over_plan_config() {
        let api_key = key_with(
            Plan::Default,
            vec![RateLimitOverride {
                resource: RateLimitResource::Ingestion,
                points: Some(42),
                duration_seconds: Some(10),
            }],
        );

        let config = effective_config(&api_key, RateLimitResource::Ingestion);
        assert_eq!(config, RateLimitConfig::limited(42, 10));

        // Other resources keep the plan config.
        let config = effective_config(&api_key, RateLimitResource::PublicApi);
        assert_eq!(config, RateLimitConfig::limited(1_000, 60));
    }

    #[test]
    fn null_override_disables_limiting() {
        let api_key = key_with(
            Plan::Default,
            vec![RateLimitOverride {
                resource: RateLimitResource::Ingestion,
                points: None,
                duration_seconds: None,
            }],
        );

        let config = effective_config(&api_key, RateLimitResource::Ingestion);
        assert_eq!(config, RateLimitConfig::unlimited());
    }

    #[tokio::test]
    async fn disabled_service_admits_everything() {
        let service = RateLimitService::disabled();
        let result = service
            .check(&key_with(Plan::Default, vec![]), RateLimitResource::Ingestion)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn result_allowed_logic() {
        let mut result = RateLimitResult {
            resource: RateLimitResource::Ingestion,
            points: 100,
            remaining_points: 0,
            ms_before_next: 30_000,
            consumed_points: 100,
            is_first_in_duration: false,
        };
        assert!(result.allowed());

        result.consumed_points = 101;
        assert!(!result.allowed());
    }

    #[test]
    fn resource_serde_kebab_case() {
        let json = serde_json::to_string(&RateLimitResource::PublicApiMetrics).unwrap();
        assert_eq!(json, r#""public-api-metrics""#);

        let parsed: RateLimitResource = serde_json::from_str(r#""ingestion""#).unwrap();
        assert_eq!(parsed, RateLimitResource::Ingestion);
    }
}
