use std::{env, fmt::Display, str::FromStr};

use anyhow::{anyhow, Result};

fn get_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_int<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse::<T>()
        .map_err(|e| anyhow!("{key} invalid int: {e}"))
}

fn get_env_int<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match get_env(key) {
        None => Ok(default),
        Some(v) => parse_int(key, &v),
    }
}

fn get_env_string(key: &str, default: &str) -> String {
    get_env(key).unwrap_or_else(|| default.to_string())
}

#[derive(Debug, Clone)]
pub struct Settings {
    // Server
    pub host: String,
    pub port: u16,
    pub cors_allow_origin: String,

    // Solana data provider
    pub moralis_api_key: Option<String>,
    pub moralis_base_url: String,
    pub solana_rpc_url: String,

    // Public market data
    pub coingecko_base_url: String,
    pub dexscreener_base_url: String,

    // Generative model
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub gemini_model: String,

    // Swap history paging
    pub swap_page_limit: usize,
    pub swap_max_pages: usize,
    pub swap_page_delay_ms: u64,
    pub pnl_window_hours: u64,

    // Outbound HTTP
    pub http_timeout_secs: u64,
    pub http_max_retries: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            cors_allow_origin: "*".to_string(),
            moralis_api_key: None,
            moralis_base_url: "https://solana-gateway.moralis.io".to_string(),
            solana_rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            coingecko_base_url: "https://api.coingecko.com".to_string(),
            dexscreener_base_url: "https://api.dexscreener.com".to_string(),
            gemini_api_key: None,
            gemini_base_url: "https://generativelanguage.googleapis.com".to_string(),
            gemini_model: "gemini-1.5-flash".to_string(),
            swap_page_limit: 100,
            swap_max_pages: 5,
            swap_page_delay_ms: 300,
            pnl_window_hours: 24,
            http_timeout_secs: 30,
            http_max_retries: 3,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let d = Self::default();

        let s = Self {
            host: get_env_string("HOST", &d.host),
            port: get_env_int("PORT", d.port)?,
            cors_allow_origin: get_env_string("CORS_ALLOW_ORIGIN", &d.cors_allow_origin),
            moralis_api_key: get_env("MORALIS_API_KEY"),
            moralis_base_url: get_env_string("MORALIS_BASE_URL", &d.moralis_base_url),
            solana_rpc_url: get_env_string("SOLANA_RPC_URL", &d.solana_rpc_url),
            coingecko_base_url: get_env_string("COINGECKO_BASE_URL", &d.coingecko_base_url),
            dexscreener_base_url: get_env_string("DEXSCREENER_BASE_URL", &d.dexscreener_base_url),
            gemini_api_key: get_env("GEMINI_API_KEY"),
            gemini_base_url: get_env_string("GEMINI_BASE_URL", &d.gemini_base_url),
            gemini_model: get_env_string("GEMINI_MODEL", &d.gemini_model),
            swap_page_limit: get_env_int("SWAP_PAGE_LIMIT", d.swap_page_limit)?,
            swap_max_pages: get_env_int("SWAP_MAX_PAGES", d.swap_max_pages)?,
            swap_page_delay_ms: get_env_int("SWAP_PAGE_DELAY_MS", d.swap_page_delay_ms)?,
            pnl_window_hours: get_env_int("PNL_WINDOW_HOURS", d.pnl_window_hours)?,
            http_timeout_secs: get_env_int("HTTP_TIMEOUT_SECS", d.http_timeout_secs)?,
            http_max_retries: get_env_int("HTTP_MAX_RETRIES", d.http_max_retries)?,
        };

        s.validate()?;
        Ok(s)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(anyhow!("HOST must not be empty"));
        }
        if self.port == 0 {
            return Err(anyhow!("PORT must be > 0"));
        }
        if !(1..=1000).contains(&self.swap_page_limit) {
            return Err(anyhow!(
                "SWAP_PAGE_LIMIT must be in 1..=1000 (got {})",
                self.swap_page_limit
            ));
        }
        if self.swap_max_pages < 1 {
            return Err(anyhow!(
                "SWAP_MAX_PAGES must be >= 1 (got {})",
                self.swap_max_pages
            ));
        }
        if self.pnl_window_hours < 1 {
            return Err(anyhow!(
                "PNL_WINDOW_HOURS must be >= 1 (got {})",
                self.pnl_window_hours
            ));
        }
        if self.http_timeout_secs < 1 {
            return Err(anyhow!(
                "HTTP_TIMEOUT_SECS must be >= 1 (got {})",
                self.http_timeout_secs
            ));
        }
        for (key, value) in [
            ("MORALIS_BASE_URL", &self.moralis_base_url),
            ("SOLANA_RPC_URL", &self.solana_rpc_url),
            ("COINGECKO_BASE_URL", &self.coingecko_base_url),
            ("DEXSCREENER_BASE_URL", &self.dexscreener_base_url),
            ("GEMINI_BASE_URL", &self.gemini_base_url),
        ] {
            url::Url::parse(value).map_err(|e| anyhow!("{key} invalid url {value}: {e}"))?;
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let s = Settings::default();
        assert!(s.validate().is_ok());
        assert_eq!(s.swap_page_delay_ms, 300);
        assert_eq!(s.bind_addr(), "127.0.0.1:3000");
    }

    #[test]
    fn rejects_zero_pages() {
        let s = Settings {
            swap_max_pages: 0,
            ..Settings::default()
        };
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("SWAP_MAX_PAGES"));
    }

    #[test]
    fn out_of_range_ints_are_rejected() {
        let err = parse_int::<u16>("PORT", "70000").unwrap_err();
        assert!(err.to_string().contains("PORT invalid int"));
        assert!(parse_int::<u32>("HTTP_MAX_RETRIES", "4294967296").is_err());
        assert!(parse_int::<u16>("PORT", "-1").is_err());
        assert_eq!(parse_int::<u16>("PORT", "8080").unwrap(), 8080);
    }

    #[test]
    fn rejects_bad_base_url() {
        let s = Settings {
            dexscreener_base_url: "not a url".to_string(),
            ..Settings::default()
        };
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("DEXSCREENER_BASE_URL"));
    }
}
