use axum::http::Request;
use std::sync::Arc;
use tower_governor::{
    GovernorError, GovernorLayer, governor::GovernorConfigBuilder, key_extractor::KeyExtractor,
};
use uuid::Uuid;

use crate::middleware::rate_limit::rate_limit_error_handler;
use crate::utils::jwt::Claims;

/// Key extractor that rate limits per authenticated profile instead of per IP
#[derive(Debug, Clone, Copy)]
pub struct ProfileIdExtractor;

impl KeyExtractor for ProfileIdExtractor {
    type Key = Uuid;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        // Claims are placed in request extensions by auth_middleware
        let claims = req
            .extensions()
            .get::<Claims>()
            .ok_or(GovernorError::UnableToExtractKey)?;

        Ok(claims.sub)
    }
}

pub type RoleGovernorLayer = GovernorLayer<
    ProfileIdExtractor,
    governor::middleware::NoOpMiddleware<governor::clock::QuantaInstant>,
    axum::body::Body,
>;

/// Per-profile limits:
/// - Driver: 300 requests per minute
/// - Passenger: 100 requests per minute
/// - Either: routes served to both roles; gets the driver quota so drivers
///   are never throttled below their own limit
pub enum RateLimitedRole {
    Driver,
    Passenger,
    Either,
}

impl RateLimitedRole {
    /// (token replenish interval in ms, burst size)
    fn quota(&self) -> (u64, u32) {
        match self {
            RateLimitedRole::Driver | RateLimitedRole::Either => (200, 300),
            RateLimitedRole::Passenger => (600, 100),
        }
    }
}

pub fn create_role_governor(role: RateLimitedRole) -> RoleGovernorLayer {
    let (per_ms, burst) = role.quota();

    let config = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(burst)
            .key_extractor(ProfileIdExtractor)
            .finish()
            .unwrap(),
    );

    GovernorLayer::new(config).error_handler(rate_limit_error_handler)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_routes_get_the_driver_quota() {
        assert_eq!(
            RateLimitedRole::Either.quota(),
            RateLimitedRole::Driver.quota()
        );
    }

    #[test]
    fn passenger_quota_is_the_strictest() {
        let (_, passenger_burst) = RateLimitedRole::Passenger.quota();
        let (_, driver_burst) = RateLimitedRole::Driver.quota();
        assert!(passenger_burst < driver_burst);
    }
}
