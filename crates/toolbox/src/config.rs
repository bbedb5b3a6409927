//! Process configuration (flags with environment fallbacks).

use crate::error::{Result, ToolboxError};
use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use unrelated_blob_storage::endpoint::{DEFAULT_ENDPOINT_TEMPLATE, validate_endpoint_template};

/// Default upper bound for request bodies buffered by the audit interceptor (4 MiB).
pub const DEFAULT_MAX_INSPECT_BYTES: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// How strictly `list_blob_containers` reads the `Authorization` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AuthHeaderPolicy {
    /// Accept any header value; a `Bearer ` prefix is stripped when present.
    #[default]
    Lenient,
    /// Require the `Bearer` scheme and a non-empty token.
    Strict,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "unrelated-mcp-toolbox", version, about)]
pub struct ToolboxArgs {
    /// Address to listen on.
    #[arg(long, env = "UNRELATED_TOOLBOX_BIND", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, env = "UNRELATED_TOOLBOX_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "UNRELATED_TOOLBOX_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Azure storage account queried by `list_blob_containers`.
    #[arg(long, env = "accountName")]
    pub account_name: Option<String>,

    /// Blob service endpoint template; `{account}` is replaced with the account name.
    #[arg(long, env = "UNRELATED_TOOLBOX_STORAGE_ENDPOINT", default_value = DEFAULT_ENDPOINT_TEMPLATE)]
    pub storage_endpoint: String,

    #[arg(long, env = "UNRELATED_TOOLBOX_AUTH_HEADER_POLICY", value_enum, default_value_t = AuthHeaderPolicy::Lenient)]
    pub auth_header_policy: AuthHeaderPolicy,

    /// Write raw `Authorization` header values into audit records (redacted otherwise).
    #[arg(long, env = "UNRELATED_TOOLBOX_AUDIT_LOG_AUTHORIZATION", default_value_t = false)]
    pub audit_log_authorization: bool,

    /// Largest request body the audit interceptor buffers.
    #[arg(long, env = "UNRELATED_TOOLBOX_MAX_INSPECT_BYTES", default_value_t = DEFAULT_MAX_INSPECT_BYTES)]
    pub max_inspect_bytes: usize,

    /// Host name reported by `get_version` and `add_to_cart`. Falls back to `COMPUTERNAME`,
    /// then the OS host name.
    #[arg(long, env = "HOSTNAME")]
    pub host_name: Option<String>,
}

/// Settings for the storage-backed tool.
#[derive(Debug, Clone)]
pub struct StorageSettings {
    /// `None` when unset or blank.
    pub account_name: Option<String>,
    pub endpoint_template: String,
    pub auth_header_policy: AuthHeaderPolicy,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            account_name: None,
            endpoint_template: DEFAULT_ENDPOINT_TEMPLATE.to_string(),
            auth_header_policy: AuthHeaderPolicy::default(),
        }
    }
}

/// Settings for the request interceptor.
#[derive(Debug, Clone)]
pub struct AuditSettings {
    pub log_authorization: bool,
    pub max_inspect_bytes: usize,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            log_authorization: false,
            max_inspect_bytes: DEFAULT_MAX_INSPECT_BYTES,
        }
    }
}

/// Identity reported by tools that describe the running process.
#[derive(Debug, Clone)]
pub struct HostInfo {
    name: Option<String>,
    pub version: String,
}

impl HostInfo {
    #[must_use]
    pub fn new(name: Option<String>, version: impl Into<String>) -> Self {
        Self {
            name: non_blank(name),
            version: version.into(),
        }
    }

    /// Host name, or `"Unknown"` when it is unset.
    #[must_use]
    pub fn identity(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown")
    }
}

/// Validated configuration for one process.
#[derive(Debug, Clone)]
pub struct ToolboxConfig {
    pub bind: SocketAddr,
    pub storage: StorageSettings,
    pub audit: AuditSettings,
    pub host: HostInfo,
}

impl ToolboxArgs {
    /// Resolve flags into a [`ToolboxConfig`].
    ///
    /// A missing storage account is not an error here: only `list_blob_containers` needs it,
    /// and it reports the absence per call.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint template has no `{account}` placeholder or is not an
    /// `http(s)` URL, or if the inspect limit is zero.
    pub fn into_config(self) -> Result<ToolboxConfig> {
        validate_endpoint_template(&self.storage_endpoint).map_err(|e| {
            ToolboxError::Config(format!(
                "--storage-endpoint '{}': {e}",
                self.storage_endpoint
            ))
        })?;
        if self.max_inspect_bytes == 0 {
            return Err(ToolboxError::Config(
                "--max-inspect-bytes must be greater than 0".to_string(),
            ));
        }

        let host_name = resolve_host_name(
            self.host_name,
            std::env::var("COMPUTERNAME").ok(),
            os_host_name,
        );

        Ok(ToolboxConfig {
            bind: self.bind,
            storage: StorageSettings {
                account_name: non_blank(self.account_name),
                endpoint_template: self.storage_endpoint,
                auth_header_policy: self.auth_header_policy,
            },
            audit: AuditSettings {
                log_authorization: self.audit_log_authorization,
                max_inspect_bytes: self.max_inspect_bytes,
            },
            host: HostInfo::new(host_name, env!("CARGO_PKG_VERSION")),
        })
    }
}

/// First non-blank of: `--host-name`/`HOSTNAME`, `COMPUTERNAME`, the OS host name.
fn resolve_host_name(
    explicit: Option<String>,
    computer_name: Option<String>,
    os: impl FnOnce() -> Option<String>,
) -> Option<String> {
    non_blank(explicit)
        .or_else(|| non_blank(computer_name))
        .or_else(|| non_blank(os()))
}

fn os_host_name() -> Option<String> {
    gethostname::gethostname().into_string().ok()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> ToolboxArgs {
        let mut argv = vec!["unrelated-mcp-toolbox"];
        argv.extend_from_slice(args);
        ToolboxArgs::try_parse_from(argv).expect("parse args")
    }

    #[test]
    fn blank_account_name_is_treated_as_missing() {
        let cfg = parse(&["--account-name", "   ", "--host-name", "box-1"])
            .into_config()
            .expect("config");
        assert_eq!(cfg.storage.account_name, None);
        assert_eq!(cfg.host.identity(), "box-1");
    }

    #[test]
    fn host_identity_falls_back_to_unknown() {
        assert_eq!(HostInfo::new(None, "1").identity(), "Unknown");
        assert_eq!(HostInfo::new(Some(String::new()), "1").identity(), "Unknown");
    }

    #[test]
    fn endpoint_template_requires_placeholder() {
        let err = parse(&["--storage-endpoint", "https://fixed.example.com"])
            .into_config()
            .expect_err("missing placeholder");
        assert!(matches!(err, ToolboxError::Config(_)));
    }

    #[test]
    fn endpoint_template_scheme_is_checked_at_startup() {
        let err = parse(&["--storage-endpoint", "ftp://{account}.example.com"])
            .into_config()
            .expect_err("ftp scheme");
        assert!(matches!(err, ToolboxError::Config(ref m) if m.contains("ftp://")));

        parse(&["--storage-endpoint", "http://127.0.0.1:10000/{account}"])
            .into_config()
            .expect("emulator template");
    }

    #[test]
    fn host_name_falls_back_to_computer_name_then_os() {
        let os = || Some("os-box\n".to_string());

        assert_eq!(
            resolve_host_name(Some("flag-box".to_string()), Some("win-box".to_string()), os),
            Some("flag-box".to_string())
        );
        assert_eq!(
            resolve_host_name(None, Some("win-box".to_string()), os),
            Some("win-box".to_string())
        );
        assert_eq!(
            resolve_host_name(Some("  ".to_string()), None, os),
            Some("os-box".to_string())
        );
        assert_eq!(resolve_host_name(None, Some(String::new()), || None), None);
    }

    #[test]
    fn os_host_name_is_used_when_nothing_is_configured() {
        let from_os = non_blank(os_host_name());
        let resolved = resolve_host_name(None, None, os_host_name);
        assert_eq!(resolved, from_os);
    }

    #[test]
    fn policy_and_format_parse_from_flags() {
        let args = parse(&[
            "--auth-header-policy",
            "strict",
            "--log-format",
            "json",
            "--bind",
            "127.0.0.1:9000",
        ]);
        assert_eq!(args.auth_header_policy, AuthHeaderPolicy::Strict);
        assert_eq!(args.log_format, LogFormat::Json);
        assert_eq!(args.bind.port(), 9000);
    }
}
