//! Common constants used throughout the anexia-webhook application

//==============================================================================
// Anexia API Constants
//==============================================================================

/// Default Anexia Engine base URL
pub const ANEXIA_API_BASE: &str = "https://engine.anexia-it.com";

/// Path of the CloudDNS zone collection
pub const CLOUDDNS_ZONE_PATH: &str = "/api/clouddns/v1/zone.json";

/// User agent string for Anexia API requests
pub const ANEXIA_USER_AGENT: &str = concat!("anexia-webhook/", env!("CARGO_PKG_VERSION"));

/// Page size used when listing zones
pub const ZONE_PAGE_LIMIT: usize = 100;

/// Upper bound on pages fetched for a single listing
pub const MAX_LIST_PAGES: usize = 1000;

//==============================================================================
// HTTP Status Codes
//==============================================================================

/// HTTP status code for unauthorized requests (401)
pub const HTTP_STATUS_UNAUTHORIZED: u16 = 401;

/// HTTP status code for forbidden requests (403)
pub const HTTP_STATUS_FORBIDDEN: u16 = 403;

/// HTTP status code for missing resources (404)
pub const HTTP_STATUS_NOT_FOUND: u16 = 404;

/// HTTP status code for rate limiting (429)
pub const HTTP_STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// Minimum HTTP status code for server errors (500)
pub const HTTP_STATUS_SERVER_ERROR_MIN: u16 = 500;

/// Maximum HTTP status code for server errors (599)
pub const HTTP_STATUS_SERVER_ERROR_MAX: u16 = 599;

//==============================================================================
// Webhook Constants
//==============================================================================

/// Media type negotiated with external-dns
pub const WEBHOOK_MEDIA_TYPE: &str = "application/external.dns.webhook+json;version=1";

/// Default bind host for the webhook server
pub const DEFAULT_SERVER_HOST: &str = "localhost";

/// Default port for the webhook server
pub const DEFAULT_SERVER_PORT: u16 = 8888;

/// Default port for the health and metrics server
pub const DEFAULT_HEALTH_PORT: u16 = 8080;

/// Consecutive provider failures after which the health endpoint reports unhealthy
pub const UNHEALTHY_ERROR_THRESHOLD: u64 = 5;

//==============================================================================
// Timeout Constants
//==============================================================================

/// Default HTTP request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Minimum HTTP request timeout in seconds
pub const MIN_TIMEOUT_SECS: u64 = 1;

/// Maximum HTTP request timeout in seconds
pub const MAX_TIMEOUT_SECS: u64 = 300;

//==============================================================================
// Validation Constants
//==============================================================================

/// Maximum DNS name length in characters
pub const MAX_DOMAIN_NAME_LENGTH: usize = 253;

/// Maximum DNS label length in characters
pub const MAX_LABEL_LENGTH: usize = 63;

//==============================================================================
// Environment Variable Names
//==============================================================================

/// Environment variable name for the Anexia API token
pub const ENV_API_TOKEN: &str = "ANEXIA_API_TOKEN";

/// Environment variable name for the Anexia API base URL override
pub const ENV_API_URL: &str = "ANEXIA_API_URL";

/// Environment variable name for the Anexia API request timeout (seconds)
pub const ENV_API_TIMEOUT: &str = "ANEXIA_API_TIMEOUT";

/// Environment variable name for dry-run mode
pub const ENV_DRY_RUN: &str = "DRY_RUN";

/// Environment variable name for the include domain list
pub const ENV_DOMAIN_FILTER: &str = "DOMAIN_FILTER";

/// Environment variable name for the exclude domain list
pub const ENV_EXCLUDE_DOMAINS: &str = "EXCLUDE_DOMAIN_FILTER";

/// Environment variable name for the include regex
pub const ENV_REGEX_DOMAIN_FILTER: &str = "REGEXP_DOMAIN_FILTER";

/// Environment variable name for the exclude regex
pub const ENV_REGEX_DOMAIN_EXCLUSION: &str = "REGEXP_DOMAIN_FILTER_EXCLUSION";

/// Environment variable name for the webhook bind host
pub const ENV_SERVER_HOST: &str = "SERVER_HOST";

/// Environment variable name for the webhook port
pub const ENV_SERVER_PORT: &str = "SERVER_PORT";

/// Environment variable name for the health check port
pub const ENV_HEALTH_PORT: &str = "HEALTH_PORT";

/// Environment variable name for the log level
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";

/// Environment variable name for the log format
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";
