//! Shared HTTP client
//!
//! Configured during pre-main startup but only built on first use.

use parking_lot::Mutex;
use reqwest::redirect::Policy;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::Result;

pub struct HttpClientConfig {
    user_agent: String,
    timeout: Duration,
    configured: AtomicBool,
    client: Mutex<Option<reqwest::Client>>,
}

impl HttpClientConfig {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            timeout: Duration::from_secs(20),
            configured: AtomicBool::new(false),
            client: Mutex::new(None),
        }
    }

    /// Make the client available to networking code without building it
    pub fn configure(&self) {
        self.configured.store(true, Ordering::SeqCst);
        tracing::debug!(user_agent = %self.user_agent, "HTTP client configured");
    }

    pub fn is_configured(&self) -> bool {
        self.configured.load(Ordering::SeqCst)
    }

    pub fn is_client_built(&self) -> bool {
        self.client.lock().is_some()
    }

    /// The shared client, built on the first call
    pub fn client(&self) -> Result<reqwest::Client> {
        let mut client = self.client.lock();
        if let Some(client) = client.as_ref() {
            return Ok(client.clone());
        }

        let built = reqwest::Client::builder()
            .redirect(Policy::limited(5))
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str())
            .build()?;

        tracing::debug!("HTTP client built");
        *client = Some(built.clone());
        Ok(built)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_built_lazily() {
        let http = HttpClientConfig::new("Mozilla/5.0 (Lantern)");
        http.configure();

        assert!(http.is_configured());
        assert!(!http.is_client_built());

        http.client().unwrap();
        assert!(http.is_client_built());
        http.client().unwrap();
    }
}
