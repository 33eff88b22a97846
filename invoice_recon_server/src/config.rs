use std::env;

use ivr_common::{helpers::parse_boolean_flag, Secret};
use log::*;
use orderdesk_tools::OrderDeskConfig;

const DEFAULT_IVR_HOST: &str = "127.0.0.1";
const DEFAULT_IVR_PORT: u16 = 8480;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Shared secret used to verify the signature on inbound approval callbacks.
    pub callback_secret: Secret<String>,
    /// If true, callback signature checks are skipped. Only ever set this in local development.
    pub disable_callback_checks: bool,
    /// If true, the server uses the canned OrderDesk client instead of the live HTTP client. The choice is
    /// made here, at startup; it is never inferred from request data.
    pub use_canned_orderdesk: bool,
    pub orderdesk_config: OrderDeskConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_IVR_HOST.to_string(),
            port: DEFAULT_IVR_PORT,
            database_url: String::default(),
            callback_secret: Secret::default(),
            disable_callback_checks: false,
            use_canned_orderdesk: false,
            orderdesk_config: OrderDeskConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("IVR_HOST").ok().unwrap_or_else(|| DEFAULT_IVR_HOST.into());
        let port = env::var("IVR_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for IVR_PORT. {e} Using the default, {DEFAULT_IVR_PORT}, instead."
                    );
                    DEFAULT_IVR_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_IVR_PORT);
        let database_url = env::var("IVR_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ IVR_DATABASE_URL is not set. Please set it to the URL for the invoice database.");
            String::default()
        });
        let callback_secret = env::var("IVR_CALLBACK_SECRET").ok().unwrap_or_else(|| {
            error!(
                "🪛️ IVR_CALLBACK_SECRET is not set. Please set it to the signing secret shared with the \
                 notification channel. Until then, no callbacks will be accepted."
            );
            String::default()
        });
        let callback_secret = Secret::new(callback_secret);
        let disable_callback_checks = parse_boolean_flag(env::var("IVR_DISABLE_CALLBACK_CHECKS").ok(), false);
        if disable_callback_checks {
            warn!("🚨️ Callback signature checks are DISABLED. Anyone can approve or reject invoices.");
        }
        let use_canned_orderdesk = parse_boolean_flag(env::var("IVR_USE_CANNED_ORDERDESK").ok(), false);
        if use_canned_orderdesk {
            info!("🪛️ Using the canned OrderDesk client. No order-management calls will leave this machine.");
        }
        let orderdesk_config = OrderDeskConfig::new_from_env_or_default();
        Self {
            host,
            port,
            database_url,
            callback_secret,
            disable_callback_checks,
            use_canned_orderdesk,
            orderdesk_config,
        }
    }
}
