//! Proxy and user-agent rotation
//!
//! Identity selection is a deterministic function of a request index
//! modulo the configured pool sizes. The index source is configurable:
//! the count of urls already marked seen (the historical behavior, which
//! skews toward identity reuse when many duplicate pages are skipped) or
//! a plain monotonic request counter.

use crate::config::IdentityConfig;

/// User agent applied when no pool is configured
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; gleaner/0.3)";

/// The proxy/user-agent pair used for one fetch. Stateless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub proxy: Option<String>,
    pub user_agent: String,
}

/// Cycles through configured proxy and user-agent pools
#[derive(Debug, Clone)]
pub struct IdentityRotator {
    proxies: Vec<String>,
    user_agents: Vec<String>,
}

impl IdentityRotator {
    pub fn new(config: &IdentityConfig) -> Self {
        Self {
            proxies: config.proxies.clone(),
            user_agents: config.user_agents.clone(),
        }
    }

    /// Selects the identity for a request index
    ///
    /// An empty proxy pool yields no proxy; an empty user-agent pool
    /// yields the fixed default.
    pub fn select(&self, index: usize) -> Identity {
        let proxy = if self.proxies.is_empty() {
            None
        } else {
            Some(self.proxies[index % self.proxies.len()].clone())
        };

        let user_agent = if self.user_agents.is_empty() {
            DEFAULT_USER_AGENT.to_string()
        } else {
            self.user_agents[index % self.user_agents.len()].clone()
        };

        Identity { proxy, user_agent }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pools(proxies: &[&str], agents: &[&str]) -> IdentityRotator {
        IdentityRotator::new(&IdentityConfig {
            proxies: proxies.iter().map(|s| s.to_string()).collect(),
            user_agents: agents.iter().map(|s| s.to_string()).collect(),
        })
    }

    #[test]
    fn test_cycles_through_pools() {
        let rotator = pools(&["http://p1:80", "http://p2:80"], &["ua-a", "ua-b", "ua-c"]);

        assert_eq!(rotator.select(0).proxy.as_deref(), Some("http://p1:80"));
        assert_eq!(rotator.select(1).proxy.as_deref(), Some("http://p2:80"));
        assert_eq!(rotator.select(2).proxy.as_deref(), Some("http://p1:80"));

        assert_eq!(rotator.select(0).user_agent, "ua-a");
        assert_eq!(rotator.select(4).user_agent, "ua-b");
    }

    #[test]
    fn test_is_deterministic() {
        let rotator = pools(&["http://p1:80"], &["ua-a", "ua-b"]);
        assert_eq!(rotator.select(7), rotator.select(7));
    }

    #[test]
    fn test_empty_proxy_pool_yields_none() {
        let rotator = pools(&[], &["ua-a"]);
        assert_eq!(rotator.select(3).proxy, None);
    }

    #[test]
    fn test_empty_agent_pool_yields_default() {
        let rotator = pools(&[], &[]);
        assert_eq!(rotator.select(0).user_agent, DEFAULT_USER_AGENT);
        assert_eq!(rotator.select(99).user_agent, DEFAULT_USER_AGENT);
    }
}
