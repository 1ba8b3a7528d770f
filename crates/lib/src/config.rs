//! Configuration types and loading.
//!
//! Config is loaded from an optional JSON file (e.g. `~/.ig-relay/config.json`) and then
//! overlaid with the environment (`IG_USER_ID`, `PAGE_ACCESS_TOKEN`, ...). Environment wins.
//! Once the gateway starts the config is shared read-only behind an `Arc`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_GRAPH_API_BASE: &str = "https://graph.facebook.com";
const DEFAULT_GRAPH_API_VERSION: &str = "v19.0";

/// Top-level relay config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Instagram account, tokens and Graph API endpoint.
    #[serde(default)]
    pub instagram: InstagramConfig,
}

/// Gateway bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for HTTP (default 3000). Overridden by PORT env.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "0.0.0.0"; the platform must reach the webhook).
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    3000
}

fn default_gateway_bind() -> String {
    "0.0.0.0".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

/// Instagram messaging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstagramConfig {
    /// The relay's own Instagram account id. Events from this sender are ignored. IG_USER_ID env.
    pub ig_user_id: Option<String>,
    /// Facebook page linked to the Instagram account. Only checked for presence. PAGE_ID env.
    pub page_id: Option<String>,
    /// Page access token used for the Send API. PAGE_ACCESS_TOKEN env.
    pub page_access_token: Option<String>,
    /// Token the platform echoes during the subscription handshake. VERIFY_TOKEN env.
    pub verify_token: Option<String>,
    /// App secret for `x-hub-signature-256`. When unset, signatures are not checked. META_APP_SECRET env.
    pub app_secret: Option<String>,
    /// Graph API base URL. GRAPH_API_BASE env (for tests or proxies).
    #[serde(default = "default_graph_api_base")]
    pub graph_api_base: String,
    #[serde(default = "default_graph_api_version")]
    pub graph_api_version: String,
}

fn default_graph_api_base() -> String {
    DEFAULT_GRAPH_API_BASE.to_string()
}

fn default_graph_api_version() -> String {
    DEFAULT_GRAPH_API_VERSION.to_string()
}

impl Default for InstagramConfig {
    fn default() -> Self {
        Self {
            ig_user_id: None,
            page_id: None,
            page_access_token: None,
            verify_token: None,
            app_secret: None,
            graph_api_base: default_graph_api_base(),
            graph_api_version: default_graph_api_version(),
        }
    }
}

/// Trimmed, non-empty value or None.
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl RelayConfig {
    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay values from `lookup` (env var name -> value). Blank values are treated as unset.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let ig = &mut self.instagram;
        let overlay = |slot: &mut Option<String>, key: &str| {
            if let Some(v) = non_empty(lookup(key)) {
                *slot = Some(v);
            }
        };
        overlay(&mut ig.ig_user_id, "IG_USER_ID");
        overlay(&mut ig.page_id, "PAGE_ID");
        overlay(&mut ig.page_access_token, "PAGE_ACCESS_TOKEN");
        overlay(&mut ig.verify_token, "VERIFY_TOKEN");
        overlay(&mut ig.app_secret, "META_APP_SECRET");
        if let Some(base) = non_empty(lookup("GRAPH_API_BASE")) {
            ig.graph_api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(port) = non_empty(lookup("PORT")) {
            self.gateway.port = port
                .parse()
                .with_context(|| format!("invalid PORT value: {}", port))?;
        }
        self.normalize();
        Ok(())
    }

    /// Blank strings from the config file count as unset.
    fn normalize(&mut self) {
        let ig = &mut self.instagram;
        for slot in [
            &mut ig.ig_user_id,
            &mut ig.page_id,
            &mut ig.page_access_token,
            &mut ig.verify_token,
            &mut ig.app_secret,
        ] {
            *slot = non_empty(slot.take());
        }
    }

    /// Non-fatal startup diagnostics. The relay keeps running with any of these.
    pub fn startup_warnings(&self) -> Vec<String> {
        let ig = &self.instagram;
        let mut out = Vec::new();
        if ig.verify_token.is_none() {
            out.push("VERIFY_TOKEN is missing; webhook verification will fail".to_string());
        }
        if ig.page_access_token.is_none() {
            out.push("PAGE_ACCESS_TOKEN is missing; replies will not be sent".to_string());
        }
        if ig.page_id.is_none() {
            out.push("PAGE_ID is missing; ensure the page is linked to Instagram".to_string());
        }
        if ig.app_secret.is_none() {
            out.push("META_APP_SECRET is not set; webhook signatures are not checked".to_string());
        }
        out
    }

    /// True when every value the relay needs to verify and reply is present.
    pub fn is_complete(&self) -> bool {
        let ig = &self.instagram;
        ig.verify_token.is_some() && ig.page_access_token.is_some() && ig.page_id.is_some()
    }
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("IG_RELAY_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".ig-relay").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path (or the default), then overlay the environment.
/// Missing file => default config.
pub fn load_config(path: Option<PathBuf>) -> Result<RelayConfig> {
    let path = path.unwrap_or_else(default_config_path);
    let mut config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        RelayConfig::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    config.apply_env()?;
    Ok(config)
}
