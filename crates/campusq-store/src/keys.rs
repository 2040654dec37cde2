//! Persisted key schema.
//!
//! All CampusQ state lives in one flat string namespace. Keys combine a
//! purpose prefix with service and user identifiers:
//!
//! | Key | Value |
//! |-----|-------|
//! | `currentToken_{service}` | integer string, token being served |
//! | `totalTokens_{service}` | integer string, highest issued token |
//! | `userToken_{service}_{user}` | integer string, this user's token |
//! | `appointments_{service}` | JSON array of `{time, studentId}` |
//! | `notification_permission` | `"granted"` or anything else |
//!
//! Nothing enforces the schema; a malformed key simply reads as absent
//! data. These helpers exist so every caller formats keys the same way.

/// Prefix of per-service "now serving" counters.
pub const CURRENT_TOKEN_PREFIX: &str = "currentToken_";
/// Prefix of per-service "highest issued" counters.
pub const TOTAL_TOKENS_PREFIX: &str = "totalTokens_";
/// Prefix of per-(service, user) token bindings.
pub const USER_TOKEN_PREFIX: &str = "userToken_";
/// Prefix of per-service booking lists.
pub const APPOINTMENTS_PREFIX: &str = "appointments_";
/// Key gating one-shot turn alerts. Alerts fire only when the stored
/// value is exactly `"granted"`.
pub const NOTIFICATION_PERMISSION_KEY: &str = "notification_permission";

/// Key of the "now serving" counter for `service`.
#[must_use]
pub fn current_token_key(service: &str) -> String {
    format!("{CURRENT_TOKEN_PREFIX}{service}")
}

/// Key of the "highest issued" counter for `service`.
#[must_use]
pub fn total_tokens_key(service: &str) -> String {
    format!("{TOTAL_TOKENS_PREFIX}{service}")
}

/// Key of `user`'s active token binding for `service`.
#[must_use]
pub fn user_token_key(service: &str, user: &str) -> String {
    format!("{USER_TOKEN_PREFIX}{service}_{user}")
}

/// Key of the booking list for `service`.
#[must_use]
pub fn appointments_key(service: &str) -> String {
    format!("{APPOINTMENTS_PREFIX}{service}")
}

/// Inverse of [`appointments_key`]: the service id a booking-list key
/// refers to, or `None` for keys outside the booking namespace.
#[must_use]
pub fn service_of_appointments_key(key: &str) -> Option<&str> {
    key.strip_prefix(APPOINTMENTS_PREFIX)
}
