//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the relay service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (host, port, TLS).
    pub listener: ListenerConfig,

    /// Backend-as-a-service platform the relay forwards to.
    pub baas: BaasConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Security hardening (headers, CORS, body limits).
    pub security: SecurityConfig,

    /// Subscription defaults.
    pub subscription: SubscriptionConfig,

    /// External workflow-automation API settings.
    pub workflow: WorkflowConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// TCP port.
    pub port: u16,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl ListenerConfig {
    /// `host:port` string suitable for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// BaaS platform connection settings.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BaasConfig {
    /// Base URL of the platform (e.g., "https://xyz.supabase.co").
    pub url: String,

    /// API key, sent both as `apikey` and as the bearer token.
    pub api_key: String,

    /// RPC function returning a user's variables.
    pub variables_rpc: String,

    /// Table holding variable rows.
    pub variables_table: String,

    /// Table holding subscription rows.
    pub subscriptions_table: String,
}

// Keeps the key out of `{:?}` output.
impl std::fmt::Debug for BaasConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaasConfig")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("variables_rpc", &self.variables_rpc)
            .field("variables_table", &self.variables_table)
            .field("subscriptions_table", &self.subscriptions_table)
            .finish()
    }
}

impl Default for BaasConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            variables_rpc: "get_user_variables".to_string(),
            variables_table: "global_variables".to_string(),
            subscriptions_table: "subscriptions".to_string(),
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Requests allowed per client within one window.
    pub max_requests: u32,

    /// Window length in seconds.
    pub window_secs: u64,

    /// Key clients by the first `X-Forwarded-For` hop instead of the peer address.
    pub trust_forwarded_for: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 100,
            window_secs: 60,
            trust_forwarded_for: false,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Inbound request timeout (total handler time) in seconds.
    pub request_secs: u64,

    /// Outbound call timeout against the BaaS in seconds.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            upstream_secs: 30,
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security headers.
    pub enable_headers: bool,
    /// Maximum body size in bytes.
    pub max_body_size: usize,
    /// Origins allowed by CORS.
    pub cors_origins: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            max_body_size: 100 * 1024, // 100KB
            cors_origins: vec![
                "https://neightn.app".to_string(),
                "https://www.neightn.app".to_string(),
                "https://n8n.eab-solutions.net".to_string(),
            ],
        }
    }
}

/// Subscription defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SubscriptionConfig {
    /// Plan recorded when the client does not name one.
    pub default_plan: String,

    /// Length of a newly created subscription in days.
    pub trial_days: u32,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            default_plan: "trial".to_string(),
            trial_days: 7,
        }
    }
}

/// External workflow-automation API settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Path appended to the caller-supplied base URL.
    pub api_path: String,

    /// Header carrying the caller-supplied API key.
    pub api_key_header: String,

    /// Timeout for the workflow creation call in seconds.
    pub timeout_secs: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            api_path: "/api/v1/workflows".to_string(),
            api_key_header: "X-N8N-API-KEY".to_string(),
            timeout_secs: 15,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
