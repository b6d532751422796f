//! Referrer trust validation.
//!
//! The developer bypass is an intentional, visible configuration toggle:
//! every short-circuit to `DevBypass` is driven by an explicit field of
//! [`SecurityConfig`] or [`ReferrerEnvironment`], never hidden logic.

use serde::{Deserialize, Serialize};
use url::Url;

/// Hostnames always treated as development environments.
const DEV_HOSTNAMES: [&str; 2] = ["localhost", "127.0.0.1"];

/// Hostname prefixes treated as development environments.
const DEV_HOSTNAME_PREFIXES: [&str; 3] = ["dev.", "test.", "staging."];

/// Origins trusted as referrers in production.
const DEFAULT_TRUSTED_ORIGINS: [&str; 3] = ["vottery.com", "www.vottery.com", "app.vottery.com"];

/// How the referrer decision was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferrerSource {
    /// No referrer at all; direct navigation is permitted
    Direct,
    /// Referrer host outside the trusted allow-list
    External,
    /// Referrer host on the trusted allow-list
    TrustedOrigin,
    /// A development toggle short-circuited validation
    DevBypass,
    /// The check itself failed; validity fell back to the build flag
    Error,
}

/// Cached outcome of the referrer check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferrerValidation {
    pub is_valid: bool,
    pub source: ReferrerSource,
}

impl ReferrerValidation {
    /// Fallback when reading ambient inputs fails: valid in development
    /// builds only, with the source recorded as an error.
    pub fn error_fallback(config: &SecurityConfig) -> Self {
        Self {
            is_valid: !config.production,
            source: ReferrerSource::Error,
        }
    }
}

/// Security configuration for a provider instance.
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Production configuration: enables envelope freshness, session TTL and
    /// device-binding checks, and disables the build-level referrer bypass.
    pub production: bool,
    /// Explicit force-bypass for local development: referrer validation
    /// always succeeds with source `DevBypass`.
    pub force_bypass: bool,
    /// Referrer hosts accepted in production.
    pub trusted_origins: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            production: false, // from_env() defaults to true
            force_bypass: false,
            trusted_origins: DEFAULT_TRUSTED_ORIGINS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl SecurityConfig {
    /// Load configuration from environment variables (native hosts; the
    /// Wasm layer constructs the config from its build profile instead).
    pub fn from_env() -> Self {
        let production = std::env::var("VOTTERY_ENV")
            .map(|v| v.to_lowercase() != "development")
            .unwrap_or(true);

        let force_bypass = std::env::var("VOTTERY_FORCE_BYPASS")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        let trusted_origins = std::env::var("VOTTERY_TRUSTED_ORIGINS")
            .ok()
            .map(|origins| {
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| {
                DEFAULT_TRUSTED_ORIGINS
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            });

        Self {
            production,
            force_bypass,
            trusted_origins,
        }
    }
}

/// Ambient inputs to the referrer check, read once at construction.
#[derive(Debug, Clone, Default)]
pub struct ReferrerEnvironment {
    /// `document.referrer`; empty string means direct navigation
    pub referrer: String,
    /// Current page hostname
    pub hostname: String,
    /// Query-parameter developer opt-in was present in the page URL
    pub query_bypass: bool,
    /// Persisted cross-session developer flag (`vottery_dev_mode`)
    pub persisted_dev_flag: bool,
}

/// Validate the referrer. Decision order, first match wins:
///
/// 1. force-bypass toggle
/// 2. non-production build
/// 3. development hostname allow-list
/// 4. query-parameter opt-in
/// 5. persisted developer flag
/// 6. trusted-origin allow-list
/// 7. empty referrer (direct navigation, permitted)
/// 8. anything else is external and invalid
pub fn check_referrer(config: &SecurityConfig, env: &ReferrerEnvironment) -> ReferrerValidation {
    let bypass = config.force_bypass
        || !config.production
        || is_dev_hostname(&env.hostname)
        || env.query_bypass
        || env.persisted_dev_flag;
    if bypass {
        return ReferrerValidation {
            is_valid: true,
            source: ReferrerSource::DevBypass,
        };
    }

    if env.referrer.is_empty() {
        return ReferrerValidation {
            is_valid: true,
            source: ReferrerSource::Direct,
        };
    }

    match referrer_host(&env.referrer) {
        Some(host) if config.trusted_origins.iter().any(|origin| *origin == host) => {
            ReferrerValidation {
                is_valid: true,
                source: ReferrerSource::TrustedOrigin,
            }
        }
        _ => ReferrerValidation {
            is_valid: false,
            source: ReferrerSource::External,
        },
    }
}

/// Whether a hostname belongs to the development allow-list.
pub fn is_dev_hostname(hostname: &str) -> bool {
    DEV_HOSTNAMES.contains(&hostname)
        || DEV_HOSTNAME_PREFIXES
            .iter()
            .any(|prefix| hostname.starts_with(prefix))
}

fn referrer_host(referrer: &str) -> Option<String> {
    Url::parse(referrer)
        .ok()?
        .host_str()
        .map(|host| host.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn production_config() -> SecurityConfig {
        SecurityConfig {
            production: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_force_bypass_wins_over_external_referrer() {
        let config = SecurityConfig {
            production: true,
            force_bypass: true,
            ..Default::default()
        };
        let env = ReferrerEnvironment {
            referrer: "https://evil.example.com/page".to_string(),
            hostname: "app.vottery.com".to_string(),
            ..Default::default()
        };
        let result = check_referrer(&config, &env);
        assert!(result.is_valid);
        assert_eq!(result.source, ReferrerSource::DevBypass);
    }

    #[test]
    fn test_development_build_bypasses() {
        let env = ReferrerEnvironment {
            referrer: "https://evil.example.com".to_string(),
            hostname: "app.vottery.com".to_string(),
            ..Default::default()
        };
        let result = check_referrer(&SecurityConfig::default(), &env);
        assert_eq!(result.source, ReferrerSource::DevBypass);
    }

    #[test]
    fn test_localhost_matches_dev_allow_list() {
        // Production config, empty referrer, no explicit bypasses: localhost
        // alone is enough
        let env = ReferrerEnvironment {
            hostname: "localhost".to_string(),
            ..Default::default()
        };
        let result = check_referrer(&production_config(), &env);
        assert!(result.is_valid);
        assert_eq!(result.source, ReferrerSource::DevBypass);
    }

    #[test]
    fn test_dev_hostname_prefixes() {
        for hostname in ["dev.vottery.com", "test.vottery.com", "staging.vottery.com"] {
            let env = ReferrerEnvironment {
                hostname: hostname.to_string(),
                referrer: "https://evil.example.com".to_string(),
                ..Default::default()
            };
            assert!(check_referrer(&production_config(), &env).is_valid);
        }
    }

    #[test]
    fn test_direct_navigation_permitted() {
        let env = ReferrerEnvironment {
            hostname: "app.vottery.com".to_string(),
            ..Default::default()
        };
        let result = check_referrer(&production_config(), &env);
        assert!(result.is_valid);
        assert_eq!(result.source, ReferrerSource::Direct);
    }

    #[test]
    fn test_trusted_origin_accepted() {
        let env = ReferrerEnvironment {
            referrer: "https://www.vottery.com/landing".to_string(),
            hostname: "app.vottery.com".to_string(),
            ..Default::default()
        };
        let result = check_referrer(&production_config(), &env);
        assert!(result.is_valid);
        assert_eq!(result.source, ReferrerSource::TrustedOrigin);
    }

    #[test]
    fn test_external_referrer_rejected() {
        let env = ReferrerEnvironment {
            referrer: "https://search.example.com/results".to_string(),
            hostname: "app.vottery.com".to_string(),
            ..Default::default()
        };
        let result = check_referrer(&production_config(), &env);
        assert!(!result.is_valid);
        assert_eq!(result.source, ReferrerSource::External);
    }

    #[test]
    fn test_unparseable_referrer_is_external() {
        let env = ReferrerEnvironment {
            referrer: "not a url".to_string(),
            hostname: "app.vottery.com".to_string(),
            ..Default::default()
        };
        let result = check_referrer(&production_config(), &env);
        assert_eq!(result.source, ReferrerSource::External);
    }

    #[test]
    fn test_query_and_persisted_opt_ins() {
        let base = ReferrerEnvironment {
            referrer: "https://evil.example.com".to_string(),
            hostname: "app.vottery.com".to_string(),
            ..Default::default()
        };

        let query = ReferrerEnvironment {
            query_bypass: true,
            ..base.clone()
        };
        assert_eq!(
            check_referrer(&production_config(), &query).source,
            ReferrerSource::DevBypass
        );

        let persisted = ReferrerEnvironment {
            persisted_dev_flag: true,
            ..base
        };
        assert_eq!(
            check_referrer(&production_config(), &persisted).source,
            ReferrerSource::DevBypass
        );
    }

    #[test]
    fn test_error_fallback_tracks_build_flag() {
        let dev = ReferrerValidation::error_fallback(&SecurityConfig::default());
        assert!(dev.is_valid);
        assert_eq!(dev.source, ReferrerSource::Error);

        let prod = ReferrerValidation::error_fallback(&production_config());
        assert!(!prod.is_valid);
    }
}
