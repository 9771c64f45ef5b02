use std::env;

use cpg_common::{parse_boolean_flag, Money, Secret, XAF_CURRENCY_CODE};
use donation_engine::{db_types::Role, DonationPolicy};
use gateway_tools::GatewayConfig;
use log::*;

const DEFAULT_CPG_HOST: &str = "127.0.0.1";
const DEFAULT_CPG_PORT: u16 = 8360;
const DEFAULT_HMAC_HEADER: &str = "X-Gateway-Signature";
const DEFAULT_MINIMUM_DONATION: i64 = 100;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    /// Keys accepted on the `/api` scope and the roles each one carries.
    pub api_keys: Vec<ApiKeyEntry>,
    /// Donation acceptance rules applied before any charge is created.
    pub minimum_donation: Money,
    pub supported_currencies: Vec<String>,
    /// Webhook signature checking.
    pub webhook_config: WebhookConfig,
    /// Upstream payment gateway client configuration.
    pub gateway_config: GatewayConfig,
}

#[derive(Clone, Debug, Default)]
pub struct WebhookConfig {
    pub hmac_secret: Secret<String>,
    pub hmac_checks: bool,
    /// The request header carrying the base64-encoded HMAC-SHA256 of the raw body.
    pub hmac_header: String,
}

/// One entry of the `CPG_API_KEYS` variable: `key:actor_id:role|role`.
#[derive(Clone, Debug)]
pub struct ApiKeyEntry {
    pub key: Secret<String>,
    pub actor_id: String,
    pub roles: Vec<Role>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_CPG_HOST.to_string(),
            port: DEFAULT_CPG_PORT,
            database_url: String::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            api_keys: Vec::new(),
            minimum_donation: Money::from(DEFAULT_MINIMUM_DONATION),
            supported_currencies: vec![XAF_CURRENCY_CODE.to_string()],
            webhook_config: WebhookConfig::default(),
            gateway_config: GatewayConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("CPG_HOST").ok().unwrap_or_else(|| DEFAULT_CPG_HOST.into());
        let port = env::var("CPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for CPG_PORT. {e} Using the default, {DEFAULT_CPG_PORT}, instead."
                    );
                    DEFAULT_CPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_CPG_PORT);
        let database_url = env::var("CPG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ CPG_DATABASE_URL is not set. Please set it to the URL for the CPG database.");
            String::default()
        });
        let use_x_forwarded_for = parse_boolean_flag(env::var("CPG_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("CPG_USE_FORWARDED").ok(), false);
        let api_keys = parse_api_keys(env::var("CPG_API_KEYS").ok().as_deref());
        let minimum_donation = env::var("CPG_MINIMUM_DONATION")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Money::from)
            .unwrap_or_else(|| {
                info!("🪛️ CPG_MINIMUM_DONATION is not set. Using the default of {DEFAULT_MINIMUM_DONATION}.");
                Money::from(DEFAULT_MINIMUM_DONATION)
            });
        let supported_currencies = env::var("CPG_SUPPORTED_CURRENCIES")
            .map(|s| s.split(',').map(|c| c.trim().to_uppercase()).filter(|c| !c.is_empty()).collect::<Vec<_>>())
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| vec![XAF_CURRENCY_CODE.to_string()]);
        let webhook_config = WebhookConfig::from_env_or_defaults();
        let gateway_config = GatewayConfig::new_from_env_or_default();
        Self {
            host,
            port,
            database_url,
            use_x_forwarded_for,
            use_forwarded,
            api_keys,
            minimum_donation,
            supported_currencies,
            webhook_config,
            gateway_config,
        }
    }

    pub fn donation_policy(&self) -> DonationPolicy {
        DonationPolicy {
            minimum_amount: self.minimum_donation,
            supported_currencies: self.supported_currencies.clone(),
        }
    }
}

impl WebhookConfig {
    pub fn from_env_or_defaults() -> Self {
        let hmac_secret = env::var("CPG_WEBHOOK_SECRET").ok().unwrap_or_else(|| {
            error!(
                "🪛️ CPG_WEBHOOK_SECRET is not set. Please set it to the HMAC signing key the gateway uses for \
                 webhooks."
            );
            String::default()
        });
        let hmac_secret = Secret::new(hmac_secret);
        let hmac_checks = parse_boolean_flag(env::var("CPG_WEBHOOK_HMAC_CHECKS").ok(), true);
        if !hmac_checks {
            warn!("🚨️ Webhook HMAC checks are DISABLED. Anyone can submit charge outcomes to this server.");
        }
        let hmac_header = env::var("CPG_WEBHOOK_HMAC_HEADER").ok().unwrap_or_else(|| {
            info!("🪛️ CPG_WEBHOOK_HMAC_HEADER not set, using '{DEFAULT_HMAC_HEADER}' as default");
            DEFAULT_HMAC_HEADER.into()
        });
        Self { hmac_secret, hmac_checks, hmac_header }
    }
}

/// Parses the `CPG_API_KEYS` variable. Format: comma-separated entries of `key:actor_id:role|role`.
/// Malformed entries are dropped with a warning rather than aborting startup.
fn parse_api_keys(raw: Option<&str>) -> Vec<ApiKeyEntry> {
    let Some(raw) = raw else {
        warn!("🪛️ CPG_API_KEYS is not set. The /api scope will reject every request.");
        return Vec::new();
    };
    let entries = raw
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .filter_map(|entry| {
            let mut parts = entry.trim().splitn(3, ':');
            let key = parts.next()?.to_string();
            let actor_id = parts.next()?.to_string();
            let roles_part = parts.next()?;
            if key.is_empty() || actor_id.is_empty() {
                warn!("🪛️ Ignoring CPG_API_KEYS entry with an empty key or actor id");
                return None;
            }
            let roles = roles_part
                .split('|')
                .filter_map(|r| {
                    r.trim()
                        .parse::<Role>()
                        .map_err(|e| warn!("🪛️ Ignoring invalid role in CPG_API_KEYS entry for {actor_id}: {e}"))
                        .ok()
                })
                .collect::<Vec<_>>();
            if roles.is_empty() {
                warn!("🪛️ Ignoring CPG_API_KEYS entry for {actor_id}: no valid roles");
                return None;
            }
            Some(ApiKeyEntry { key: Secret::new(key), actor_id, roles })
        })
        .collect::<Vec<_>>();
    if entries.is_empty() {
        warn!("🚨️ CPG_API_KEYS was set, but no valid entries were found. The /api scope will reject every request.");
    } else {
        let actors = entries.iter().map(|e| e.actor_id.as_str()).collect::<Vec<_>>().join(", ");
        info!("🪛️ API keys configured for: {actors}");
    }
    entries
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that handlers need at request time. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded }
    }
}
