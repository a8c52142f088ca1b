//! Environment snapshot used for configuration overrides.
//!
//! Resolution reads variables through an [`Environment`] value rather than
//! the live process environment, so tests can describe the environment they
//! need without touching global state.

use std::collections::HashMap;

/// Prefix shared by every variable udpq reads.
pub const ENV_PREFIX: &str = "UDPQ_";

/// Bind address (server) or target address (client).
pub const ENV_ADDR: &str = "UDPQ_ADDR";

/// Bind port (server) or target port (client).
pub const ENV_PORT: &str = "UDPQ_PORT";

/// Server log file path.
pub const ENV_LOGFILE: &str = "UDPQ_LOGFILE";

/// Server per-request delay in whole seconds.
pub const ENV_WAIT: &str = "UDPQ_WAIT";

/// Client debug echo; any value enables it.
pub const ENV_DEBUG: &str = "UDPQ_DEBUG";

/// An immutable snapshot of the `UDPQ_*` environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Capture the `UDPQ_*` variables of the current process.
    ///
    /// Variables whose name or value is not valid UTF-8 are skipped.
    pub fn from_process() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .filter(|(k, _)| k.starts_with(ENV_PREFIX))
            .collect();
        Self { vars }
    }

    /// Build a snapshot from explicit key/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// An empty environment.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Look up a variable. An empty value still counts as set.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Whether the variable is present at all.
    pub fn is_set(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pairs_lookup() {
        let env = Environment::from_pairs([(ENV_PORT, "4000"), (ENV_DEBUG, "")]);
        assert_eq!(env.get(ENV_PORT), Some("4000"));
        assert!(env.is_set(ENV_DEBUG));
        assert_eq!(env.get(ENV_DEBUG), Some(""));
        assert!(!env.is_set(ENV_ADDR));
    }

    #[test]
    fn test_from_process_keeps_only_prefixed_vars() {
        let env = Environment::from_process();
        assert!(env.vars.keys().all(|k| k.starts_with(ENV_PREFIX)));
    }
}
