use std::time::Duration;

use reqwest::Client as HttpClient;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};

use crate::config::Settings;

const USER_AGENT: &str = concat!("intel-desk/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    /// Zero disables the retry middleware entirely.
    pub max_retries: u32,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_max_idle_per_host: 10,
            max_retries: 3,
        }
    }
}

impl HttpClientConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            timeout: Duration::from_secs(settings.http_timeout_secs),
            max_retries: settings.http_max_retries,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn build(self) -> Result<ClientWithMiddleware, reqwest::Error> {
        let client = HttpClient::builder()
            .user_agent(USER_AGENT)
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .pool_max_idle_per_host(self.pool_max_idle_per_host)
            .build()?;

        let mut builder = ClientBuilder::new(client);
        if self.max_retries > 0 {
            let policy = ExponentialBackoff::builder().build_with_max_retries(self.max_retries);
            builder = builder.with(RetryTransientMiddleware::new_with_policy(policy));
        }
        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_settings_copies_timeout_and_retries() {
        let settings = Settings {
            http_timeout_secs: 7,
            http_max_retries: 1,
            ..Settings::default()
        };
        let cfg = HttpClientConfig::from_settings(&settings);
        assert_eq!(cfg.timeout, Duration::from_secs(7));
        assert_eq!(cfg.max_retries, 1);
    }

    #[test]
    fn builds_with_and_without_retries() {
        assert!(HttpClientConfig::default().build().is_ok());
        assert!(HttpClientConfig::default().with_max_retries(0).build().is_ok());
    }
}
