//! User-Agent supply for outbound requests

use std::sync::atomic::{AtomicUsize, Ordering};

/// Firefox desktop strings used when the config lists none.
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:128.0) Gecko/20100101 Firefox/128.0",
    "Mozilla/5.0 (X11; Linux x86_64; rv:127.0) Gecko/20100101 Firefox/127.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.5; rv:128.0) Gecko/20100101 Firefox/128.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:126.0) Gecko/20100101 Firefox/126.0",
];

/// Source of the `User-Agent` header value.
pub trait IdentityProvider: Send + Sync {
    fn user_agent(&self) -> String;
}

/// Always the same value.
#[derive(Debug, Clone)]
pub struct StaticIdentity(pub String);

impl IdentityProvider for StaticIdentity {
    fn user_agent(&self) -> String {
        self.0.clone()
    }
}

/// Round-robin over a fixed list.
#[derive(Debug)]
pub struct RotatingIdentity {
    agents: Vec<String>,
    cursor: AtomicUsize,
}

impl RotatingIdentity {
    /// Falls back to [`DEFAULT_USER_AGENTS`] when `agents` is empty.
    pub fn new(agents: Vec<String>) -> Self {
        let agents = if agents.is_empty() {
            DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect()
        } else {
            agents
        };
        Self {
            agents,
            cursor: AtomicUsize::new(0),
        }
    }
}

impl Default for RotatingIdentity {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl IdentityProvider for RotatingIdentity {
    fn user_agent(&self) -> String {
        let i = self.cursor.fetch_add(1, Ordering::Relaxed);
        self.agents[i % self.agents.len()].clone()
    }
}
