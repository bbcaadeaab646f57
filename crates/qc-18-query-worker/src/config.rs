//! Query service configuration.
//!
//! Endpoint addresses are owned by the surrounding node configuration. The
//! defaults match the in-process query service addresses.

use std::env;
use std::fmt;

use crate::error::ConfigError;

/// Default endpoint the secure query workers connect to.
pub const DEFAULT_SECURE_ENDPOINT: &str = "inproc://secure_query_workers";

/// Default endpoint the public query workers connect to.
pub const DEFAULT_PUBLIC_ENDPOINT: &str = "inproc://public_query_workers";

/// Default per-direction queue bound before messages are dropped.
pub const DEFAULT_HIGH_WATER_MARK: usize = 1000;

/// Trust domain of a query channel.
///
/// Selects the endpoint only. Both channels expose the same handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Security {
    Secure,
    Public,
}

impl Security {
    /// Maps the `secure` flag used by node settings.
    pub fn from_flag(secure: bool) -> Self {
        if secure {
            Self::Secure
        } else {
            Self::Public
        }
    }

    pub fn is_secure(&self) -> bool {
        matches!(self, Self::Secure)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Secure => "secure",
            Self::Public => "public",
        }
    }
}

impl fmt::Display for Security {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings shared by the secure and public query workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryServiceSettings {
    /// Endpoint of the secure query service.
    pub secure_endpoint: String,

    /// Endpoint of the public query service.
    pub public_endpoint: String,

    /// Log every dispatched query at info level.
    pub verbose: bool,

    /// Replace route identities with a placeholder in logs.
    pub redact_routes: bool,

    /// Queue bound per direction for in-process endpoints.
    pub high_water_mark: usize,
}

impl Default for QueryServiceSettings {
    fn default() -> Self {
        Self {
            secure_endpoint: DEFAULT_SECURE_ENDPOINT.to_string(),
            public_endpoint: DEFAULT_PUBLIC_ENDPOINT.to_string(),
            verbose: false,
            redact_routes: false,
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
        }
    }
}

impl QueryServiceSettings {
    /// Create settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `QC_QUERY_SECURE_ENDPOINT`: secure endpoint (default: inproc://secure_query_workers)
    /// - `QC_QUERY_PUBLIC_ENDPOINT`: public endpoint (default: inproc://public_query_workers)
    /// - `QC_QUERY_VERBOSE`: log every query (default: false)
    /// - `QC_QUERY_REDACT_ROUTES`: redact routes in logs (default: false)
    /// - `QC_QUERY_HIGH_WATER_MARK`: queue bound (default: 1000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            secure_endpoint: env::var("QC_QUERY_SECURE_ENDPOINT")
                .unwrap_or(defaults.secure_endpoint),

            public_endpoint: env::var("QC_QUERY_PUBLIC_ENDPOINT")
                .unwrap_or(defaults.public_endpoint),

            verbose: env::var("QC_QUERY_VERBOSE")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.verbose),

            redact_routes: env::var("QC_QUERY_REDACT_ROUTES")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.redact_routes),

            high_water_mark: env::var("QC_QUERY_HIGH_WATER_MARK")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.high_water_mark),
        }
    }

    /// Endpoint a worker of the given trust domain connects to.
    pub fn endpoint(&self, security: Security) -> &str {
        match security {
            Security::Secure => &self.secure_endpoint,
            Security::Public => &self.public_endpoint,
        }
    }

    /// Validate settings before any worker starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secure_endpoint.trim().is_empty() {
            return Err(ConfigError::EmptyEndpoint(Security::Secure));
        }
        if self.public_endpoint.trim().is_empty() {
            return Err(ConfigError::EmptyEndpoint(Security::Public));
        }
        if self.secure_endpoint == self.public_endpoint {
            return Err(ConfigError::SharedEndpoint(self.secure_endpoint.clone()));
        }
        if self.high_water_mark == 0 {
            return Err(ConfigError::ZeroHighWaterMark);
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}
