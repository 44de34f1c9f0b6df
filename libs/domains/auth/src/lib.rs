//! Authentication and rate limiting for the public ingestion surface.
//!
//! API keys are project-scoped Basic-auth credentials enriched with the
//! owning organization's billing plan. The rate limiter admits requests per
//! `(organization, resource)` against plan-derived budgets, counting in
//! Redis so limits hold across replicas.

pub mod api_key;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod rate_limit;
pub mod verifier;

pub use api_key::{AccessLevel, ApiScope, OrgEnrichedApiKey, Plan};
pub use error::{AuthError, AuthResult};
pub use middleware::{auth_and_rate_limit, rate_limit_response, AuthState};
pub use rate_limit::{RateLimitConfig, RateLimitResource, RateLimitResult, RateLimitService};
pub use verifier::{ApiKeyVerifier, PgApiKeyVerifier};
