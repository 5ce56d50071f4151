//! Farming API endpoints and request defaults

/// Default API origin; overridable through config or `LITAS_API_URL`.
pub const DEFAULT_BASE_URL: &str = "https://api.litas.io";

/// Token refresh (bearer = current access token, body carries the refresh token)
pub const REFRESH_PATH: &str = "/v1/auth/refresh";

/// Mining session activation
pub const ACTIVATE_PATH: &str = "/v1/users/farming/activate";

/// Farming state for the authenticated user
pub const FARM_INFO_PATH: &str = "/v1/users/farming";

/// Reward claim
pub const CLAIM_PATH: &str = "/v1/users/farming/claim";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User-Agent sent with every request.
pub const USER_AGENT: &str = concat!("litas-bot/", env!("CARGO_PKG_VERSION"));
