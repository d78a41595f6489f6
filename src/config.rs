use anyhow::{anyhow, Result};
use std::fmt;

use crate::desk::OverlapPolicy;
use crate::domain::Pool;
use crate::form::FormDefaults;
use crate::status::DEFAULT_EXPLORER_TX_URL;

#[derive(Clone)]
pub struct Config {
    // Trading API
    pub trade_url: String,
    pub api_key: String,

    // Form defaults
    pub default_slippage: f64,
    pub default_priority_fee: f64,
    pub default_pool: Pool,

    // Display
    pub explorer_tx_url: String,

    // Runtime
    pub allow_overlap: bool,
}

// Keeps the api key out of the boot log.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("trade_url", &self.trade_url)
            .field("api_key", &"<redacted>")
            .field("default_slippage", &self.default_slippage)
            .field("default_priority_fee", &self.default_priority_fee)
            .field("default_pool", &self.default_pool)
            .field("explorer_tx_url", &self.explorer_tx_url)
            .field("allow_overlap", &self.allow_overlap)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let trade_url = var("PUMPPORTAL_TRADE_URL")
            .unwrap_or_else(|| "https://pumpportal.fun/api/trade".to_string());
        reqwest::Url::parse(&trade_url)
            .map_err(|e| anyhow!("invalid PUMPPORTAL_TRADE_URL {trade_url:?}: {e}"))?;

        let api_key = var("PUMPPORTAL_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| anyhow!("PUMPPORTAL_API_KEY is required"))?;

        let default_slippage = env_f64(&var, "DESK_DEFAULT_SLIPPAGE", 50.0)?;
        let default_priority_fee = env_f64(&var, "DESK_DEFAULT_PRIORITY_FEE", 0.01)?;
        for (key, v) in [
            ("DESK_DEFAULT_SLIPPAGE", default_slippage),
            ("DESK_DEFAULT_PRIORITY_FEE", default_priority_fee),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(anyhow!("{key} must be a non-negative number"));
            }
        }

        let default_pool = match var("DESK_DEFAULT_POOL") {
            Some(p) => p.parse()?,
            None => Pool::Pump,
        };

        let explorer_tx_url =
            var("DESK_EXPLORER_TX_URL").unwrap_or_else(|| DEFAULT_EXPLORER_TX_URL.to_string());

        let allow_overlap = env_bool(&var, "DESK_ALLOW_OVERLAP", false);

        Ok(Self {
            trade_url,
            api_key,
            default_slippage,
            default_priority_fee,
            default_pool,
            explorer_tx_url,
            allow_overlap,
        })
    }

    pub fn form_defaults(&self) -> FormDefaults {
        FormDefaults {
            slippage: self.default_slippage.to_string(),
            priority_fee: self.default_priority_fee.to_string(),
            pool: self.default_pool,
        }
    }

    pub fn overlap_policy(&self) -> OverlapPolicy {
        if self.allow_overlap {
            OverlapPolicy::Supersede
        } else {
            OverlapPolicy::Reject
        }
    }
}

fn env_f64(var: &impl Fn(&str) -> Option<String>, key: &str, default: f64) -> Result<f64> {
    match var(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow!("{key} must be a number, got {raw:?}")),
    }
}

fn env_bool(var: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    match var(key).map(|s| s.trim().to_lowercase()) {
        None => default,
        Some(v) if v.is_empty() => default,
        Some(v) if v == "1" || v == "true" || v == "yes" || v == "y" || v == "on" => true,
        Some(v) if v == "0" || v == "false" || v == "no" || v == "n" || v == "off" => false,
        Some(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn defaults_with_only_api_key() {
        let cfg = load(&[("PUMPPORTAL_API_KEY", "k")]).unwrap();
        assert_eq!(cfg.trade_url, "https://pumpportal.fun/api/trade");
        assert_eq!(cfg.explorer_tx_url, "https://solscan.io/tx");
        assert_eq!(cfg.overlap_policy(), OverlapPolicy::Reject);

        let defaults = cfg.form_defaults();
        assert_eq!(defaults, FormDefaults::default());
    }

    #[test]
    fn api_key_is_required() {
        assert!(load(&[]).is_err());
        assert!(load(&[("PUMPPORTAL_API_KEY", "  ")]).is_err());
    }

    #[test]
    fn overrides_are_validated() {
        let cfg = load(&[
            ("PUMPPORTAL_API_KEY", "k"),
            ("DESK_DEFAULT_SLIPPAGE", "10"),
            ("DESK_DEFAULT_POOL", "raydium"),
            ("DESK_ALLOW_OVERLAP", "yes"),
        ])
        .unwrap();
        assert_eq!(cfg.form_defaults().slippage, "10");
        assert_eq!(cfg.default_pool, Pool::Raydium);
        assert_eq!(cfg.overlap_policy(), OverlapPolicy::Supersede);

        assert!(load(&[("PUMPPORTAL_API_KEY", "k"), ("DESK_DEFAULT_SLIPPAGE", "-1")]).is_err());
        assert!(load(&[("PUMPPORTAL_API_KEY", "k"), ("DESK_DEFAULT_POOL", "orca")]).is_err());
        assert!(load(&[("PUMPPORTAL_API_KEY", "k"), ("PUMPPORTAL_TRADE_URL", "not a url")]).is_err());
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let cfg = load(&[("PUMPPORTAL_API_KEY", "super-secret")]).unwrap();
        assert!(!format!("{cfg:?}").contains("super-secret"));
    }
}
