//! Per-process configuration, read once from the environment (and, for a
//! couple of test-harness-friendly knobs, an optional CLI override) into a
//! plain value — no process-wide statics.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Selects which [`crate::registry::RegistryAdapter`] implementation a
/// [`crate::router::Router`] is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryKind {
    Http,
    Local,
}

impl RegistryKind {
    fn from_env_str(s: &str) -> Self {
        match s {
            "local" => RegistryKind::Local,
            _ => RegistryKind::Http,
        }
    }
}

/// Narrow CLI surface. The binary requires no flags at all for normal hook
/// invocation; these two overrides exist purely so integration tests can
/// point the router at a fixture tree without mutating the environment.
#[derive(Parser, Debug, Default)]
#[command(name = "skill-router")]
#[command(version)]
#[command(about = "Prompt-time skill router for Claude Code hooks")]
pub struct Cli {
    /// Overrides SKILL_ROUTER_CACHE_DIR.
    #[arg(long)]
    pub cache_dir: Option<String>,

    /// Overrides SKILL_ROUTER_REGISTRY_URL.
    #[arg(long)]
    pub registry_url: Option<String>,
}

/// Resolved configuration for one router invocation.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub registry_kind: RegistryKind,
    pub registry_url: String,
    pub cache_dir: PathBuf,
    pub index_ttl: Duration,
    pub body_ttl: Duration,
    pub fetch_timeout: Duration,
    pub threshold: f64,
    pub ambiguity_gap: f64,
    pub body_max_chars: usize,
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("skill-router")
}

impl RouterConfig {
    /// Build configuration from environment variables, with `cli` overrides
    /// (CLI flag > env var > computed default) applied last.
    pub fn from_env(cli: &Cli) -> Self {
        let registry_kind =
            RegistryKind::from_env_str(&env_string("SKILL_ROUTER_REGISTRY_KIND", "http"));

        let registry_url = cli
            .registry_url
            .clone()
            .unwrap_or_else(|| env_string("SKILL_ROUTER_REGISTRY_URL", ""));

        let cache_dir = cli
            .cache_dir
            .clone()
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                std::env::var("SKILL_ROUTER_CACHE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| default_cache_dir())
            });

        RouterConfig {
            registry_kind,
            registry_url,
            cache_dir,
            index_ttl: Duration::from_secs(env_u64("SKILL_ROUTER_INDEX_TTL_SECONDS", 86_400)),
            body_ttl: Duration::from_secs(env_u64("SKILL_ROUTER_BODY_TTL_SECONDS", 604_800)),
            fetch_timeout: Duration::from_millis(env_u64("SKILL_ROUTER_FETCH_TIMEOUT_MS", 2_000)),
            threshold: env_f64("SKILL_ROUTER_THRESHOLD", 18.0),
            ambiguity_gap: env_f64("SKILL_ROUTER_AMBIGUITY_GAP", 10.0),
            body_max_chars: env_u64("SKILL_ROUTER_BODY_MAX_CHARS", 8000) as usize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_env_or_cli() {
        let cli = Cli::default();
        // Don't touch process env here (tests may run concurrently); just
        // check the numeric defaults compute sanely when unset.
        assert_eq!(env_u64("SKILL_ROUTER_DOES_NOT_EXIST_XYZ", 86_400), 86_400);
        assert_eq!(env_f64("SKILL_ROUTER_DOES_NOT_EXIST_XYZ", 18.0), 18.0);
        let cfg = RouterConfig::from_env(&cli);
        assert!(cfg.threshold > 0.0);
    }

    #[test]
    fn cli_overrides_take_priority() {
        let cli = Cli {
            cache_dir: Some("/tmp/explicit-cache".to_string()),
            registry_url: Some("/tmp/explicit-registry".to_string()),
        };
        let cfg = RouterConfig::from_env(&cli);
        assert_eq!(cfg.cache_dir, PathBuf::from("/tmp/explicit-cache"));
        assert_eq!(cfg.registry_url, "/tmp/explicit-registry");
    }
}
