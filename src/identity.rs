//! Identity resolution for Verdict commands.
//!
//! Submissions and decisions are attributed to whoever is acting.
//! Rather than requiring `--as` on every invocation, identity is resolved through a chain:
//!
//! 1. `--as <identity>`: explicit per-command override
//! 2. `VERDICT_IDENTITY` env var: process or session level
//! 3. `default-identity` in `~/.verdict/config.toml`

use std::env;

use crate::config::Config;

/// Error message shown when identity cannot be resolved.
pub const IDENTITY_REQUIRED: &str = "identity required: pass --as <identity>, \
    set VERDICT_IDENTITY, or add `default-identity = \"...\"` to ~/.verdict/config.toml";

/// Resolve the acting identity, if any source yields one.
pub fn resolve_identity(explicit: Option<&str>, config: &Config) -> Option<String> {
    resolve_with(explicit, env::var("VERDICT_IDENTITY").ok(), config)
}

/// Resolve the acting identity, failing with [`IDENTITY_REQUIRED`] when none is set.
pub fn require_identity(explicit: Option<&str>, config: &Config) -> Result<String, String> {
    resolve_identity(explicit, config).ok_or_else(|| IDENTITY_REQUIRED.to_string())
}

fn resolve_with(
    explicit: Option<&str>,
    from_env: Option<String>,
    config: &Config,
) -> Option<String> {
    explicit
        .map(str::to_string)
        .or_else(|| from_env.filter(|id| !id.is_empty()))
        .or_else(|| config.default_identity.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(identity: Option<&str>) -> Config {
        Config {
            default_identity: identity.map(String::from),
            ..Config::default()
        }
    }

    #[test]
    fn explicit_wins() {
        let id = resolve_with(Some("alice"), Some("bob".into()), &config(Some("carol")));
        assert_eq!(id.as_deref(), Some("alice"));
    }

    #[test]
    fn env_beats_config() {
        let id = resolve_with(None, Some("bob".into()), &config(Some("carol")));
        assert_eq!(id.as_deref(), Some("bob"));
    }

    #[test]
    fn empty_env_falls_through_to_config() {
        let id = resolve_with(None, Some(String::new()), &config(Some("carol")));
        assert_eq!(id.as_deref(), Some("carol"));
    }

    #[test]
    fn nothing_configured_yields_none() {
        assert_eq!(resolve_with(None, None, &config(None)), None);
    }
}
