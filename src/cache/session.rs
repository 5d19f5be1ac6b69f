//! WHMCS session cache.
//!
//! WHMCS puts its domain verification form behind reCAPTCHA for anonymous
//! visitors. A logged-in session cookie skips that, so we log in once and
//! reuse the cookie until it is older than the configured TTL. Staleness is
//! judged by wall clock only; the token is never probed.

use crate::client::http::{Transport, VendorRequest};
use crate::clock::Clock;
use crate::config::{Endpoints, PanelwardenConfig};
use crate::protocol::models::WHMCS_SESSION_COOKIE;
use crate::PanelwardenError;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

/// A session token and when it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedSession {
    /// Opaque session cookie value.
    pub token: String,
    /// When the token was obtained.
    pub refreshed_at: DateTime<Utc>,
}

impl CachedSession {
    /// Whether the session is older than `ttl` at `now`.
    ///
    /// A deadline past the end of representable time never expires.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        self.refreshed_at
            .checked_add_signed(ttl)
            .map_or(false, |deadline| now > deadline)
    }
}

/// Lazily refreshed, single-token WHMCS session cache.
pub struct SessionCache {
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    username: String,
    password: String,
    client_area_url: String,
    login_url: String,
    ttl: chrono::Duration,
    state: Mutex<Option<CachedSession>>,
}

impl SessionCache {
    /// Create an empty cache. No network traffic happens until the first
    /// [`SessionCache::get_session`].
    pub fn new(
        config: &PanelwardenConfig,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, PanelwardenError> {
        let ttl = chrono::Duration::from_std(config.session_ttl)
            .map_err(|e| PanelwardenError::ConfigError(format!("session_ttl out of range: {}", e)))?;
        let Endpoints {
            whmcs_client_area,
            whmcs_login,
            ..
        } = &config.endpoints;

        Ok(Self {
            transport,
            clock,
            username: config.whmcs_username.clone(),
            password: config.whmcs_password.clone(),
            client_area_url: whmcs_client_area.clone(),
            login_url: whmcs_login.clone(),
            ttl,
            state: Mutex::new(None),
        })
    }

    /// Return a usable session token, logging in again if the cached one is
    /// missing or stale.
    ///
    /// The lock is held across the refresh so concurrent callers never log in
    /// twice for the same expiry. On failure the previous entry is kept and
    /// the next call retries.
    pub fn get_session(&self) -> Result<String, PanelwardenError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(session) = state.as_ref() {
            if !session.is_expired(self.clock.now_utc(), self.ttl) {
                debug!("Reusing cached WHMCS session");
                return Ok(session.token.clone());
            }
        }

        let token = self.refresh()?;
        *state = Some(CachedSession {
            token: token.clone(),
            refreshed_at: self.clock.now_utc(),
        });
        info!("Obtained new WHMCS session");
        Ok(token)
    }

    /// When the cached token was obtained, if one is cached.
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|s| s.refreshed_at)
    }

    /// Drop the cached token; the next call logs in again.
    pub fn invalidate(&self) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn refresh(&self) -> Result<String, PanelwardenError> {
        // The client area hands out a transient cookie the login form expects.
        let landing = self.transport.send(&VendorRequest::get(&self.client_area_url))?;
        let transient = landing
            .cookie(WHMCS_SESSION_COOKIE)
            .ok_or(PanelwardenError::MissingCookie {
                name: WHMCS_SESSION_COOKIE,
            })?;

        let login = VendorRequest::post_form(
            &self.login_url,
            &[
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
            ],
        )
        .with_cookie(WHMCS_SESSION_COOKIE, transient);
        let response = self.transport.send(&login)?;

        response
            .cookie(WHMCS_SESSION_COOKIE)
            .map(str::to_string)
            .ok_or(PanelwardenError::MissingCookie {
                name: WHMCS_SESSION_COOKIE,
            })
    }
}
