//! Panelwarden configuration.

use crate::PanelwardenError;
use reqwest::Url;
use std::fmt;
use std::time::Duration;

/// Environment variable holding the WHMCS.com account email.
pub const ENV_WHMCS_USERNAME: &str = "PANELWARDEN_WHMCS_USERNAME";
/// Environment variable holding the WHMCS.com account password.
pub const ENV_WHMCS_PASSWORD: &str = "PANELWARDEN_WHMCS_PASSWORD";
/// Environment variable overriding the bot display name used in card footers.
pub const ENV_BOT_NAME: &str = "PANELWARDEN_BOT_NAME";
/// Environment variable overriding the session TTL, in seconds.
pub const ENV_SESSION_TTL_SECS: &str = "PANELWARDEN_SESSION_TTL_SECS";
/// Environment variable overriding the per-request timeout, in seconds.
pub const ENV_TIMEOUT_SECS: &str = "PANELWARDEN_TIMEOUT_SECS";

/// WHMCS sessions are reused for this long before a fresh login.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);
/// Every vendor round-trip is bounded by this timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Vendor URLs.
///
/// These are fixed by the vendors; they are only configurable so tests and
/// staging setups can point elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// WHMCS client area, fetched anonymously for the transient cookie.
    pub whmcs_client_area: String,
    /// WHMCS login form target.
    pub whmcs_login: String,
    /// WHMCS domain verification form target.
    pub whmcs_verify: String,
    /// Blesta license verification page (GET for the form, POST to submit).
    pub blesta_verify: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            whmcs_client_area: "https://www.whmcs.com/members/clientarea.php".to_string(),
            whmcs_login: "https://www.whmcs.com/members/dologin.php".to_string(),
            whmcs_verify: "https://www.whmcs.com/members/verifydomain.php".to_string(),
            blesta_verify: "https://account.blesta.com/client/plugin/license_verify/".to_string(),
        }
    }
}

impl Endpoints {
    fn iter(&self) -> [(&'static str, &str); 4] {
        [
            ("whmcs_client_area", self.whmcs_client_area.as_str()),
            ("whmcs_login", self.whmcs_login.as_str()),
            ("whmcs_verify", self.whmcs_verify.as_str()),
            ("blesta_verify", self.blesta_verify.as_str()),
        ]
    }
}

/// Thumbnail images shown on result cards, one per status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardImages {
    /// Shown when the license verified.
    pub valid: String,
    /// Shown when the vendor reported the domain as unlicensed.
    pub invalid: String,
    /// Shown when the check could not be completed.
    pub error: String,
}

impl Default for CardImages {
    fn default() -> Self {
        Self {
            valid: "https://files.rowe.sh/license-bot/images/valid.png".to_string(),
            invalid: "https://files.rowe.sh/license-bot/images/invalid.png".to_string(),
            error: "https://files.rowe.sh/license-bot/images/error.png".to_string(),
        }
    }
}

/// Configuration for license verification and the chat responder.
#[derive(Clone)]
pub struct PanelwardenConfig {
    /// WHMCS.com account email used to obtain a session.
    pub whmcs_username: String,

    /// WHMCS.com account password.
    /// SECURITY: never log this value.
    pub whmcs_password: String,

    /// Name shown in card footers ("Verified by <bot_name> at ...").
    pub bot_name: String,

    /// How long a WHMCS session token is reused before logging in again.
    pub session_ttl: Duration,

    /// Timeout applied to every vendor HTTP request.
    pub request_timeout: Duration,

    /// Vendor URLs.
    pub endpoints: Endpoints,

    /// Card thumbnails.
    pub images: CardImages,
}

impl fmt::Debug for PanelwardenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelwardenConfig")
            .field("whmcs_username", &self.whmcs_username)
            .field("whmcs_password", &"<redacted>")
            .field("bot_name", &self.bot_name)
            .field("session_ttl", &self.session_ttl)
            .field("request_timeout", &self.request_timeout)
            .field("endpoints", &self.endpoints)
            .field("images", &self.images)
            .finish()
    }
}

impl PanelwardenConfig {
    /// Create a configuration with default settings for the given WHMCS credentials.
    pub fn new(whmcs_username: impl Into<String>, whmcs_password: impl Into<String>) -> Self {
        Self {
            whmcs_username: whmcs_username.into(),
            whmcs_password: whmcs_password.into(),
            bot_name: "Panelwarden".to_string(),
            session_ttl: DEFAULT_SESSION_TTL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            endpoints: Endpoints::default(),
            images: CardImages::default(),
        }
    }

    /// Build a configuration from `PANELWARDEN_*` environment variables.
    ///
    /// Credentials are required; everything else falls back to defaults.
    pub fn from_env() -> Result<Self, PanelwardenError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, PanelwardenError> {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| PanelwardenError::ConfigError(format!("{} is not set", key)))
        };
        let seconds = |key: &str| -> Result<Option<Duration>, PanelwardenError> {
            lookup(key)
                .map(|raw| {
                    raw.trim().parse::<u64>().map(Duration::from_secs).map_err(|e| {
                        PanelwardenError::ConfigError(format!("{} must be whole seconds: {}", key, e))
                    })
                })
                .transpose()
        };

        let mut config = Self::new(required(ENV_WHMCS_USERNAME)?, required(ENV_WHMCS_PASSWORD)?);
        if let Some(bot_name) = lookup(ENV_BOT_NAME) {
            config.bot_name = bot_name;
        }
        if let Some(ttl) = seconds(ENV_SESSION_TTL_SECS)? {
            config.session_ttl = ttl;
        }
        if let Some(timeout) = seconds(ENV_TIMEOUT_SECS)? {
            config.request_timeout = timeout;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), PanelwardenError> {
        if self.whmcs_username.is_empty() {
            return Err(PanelwardenError::ConfigError(
                "whmcs_username cannot be empty".to_string(),
            ));
        }
        if self.whmcs_password.is_empty() {
            return Err(PanelwardenError::ConfigError(
                "whmcs_password cannot be empty".to_string(),
            ));
        }
        if self.session_ttl.is_zero() {
            return Err(PanelwardenError::ConfigError(
                "session_ttl must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(PanelwardenError::ConfigError(
                "request_timeout must be greater than zero".to_string(),
            ));
        }
        for (name, url) in self.endpoints.iter() {
            Url::parse(url).map_err(|e| {
                PanelwardenError::ConfigError(format!("endpoint {} is not a valid URL: {}", name, e))
            })?;
        }
        Ok(())
    }
}
