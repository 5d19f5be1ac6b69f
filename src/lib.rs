//! # Panelwarden
//!
//! **Billing-panel license verification for chat bots.**
//!
//! Hosting companies run billing panels such as WHMCS and Blesta. Both
//! vendors publish a lookup that says whether a domain holds a genuine
//! license. Panelwarden drives those lookups and turns the answer into a
//! chat reply, so communities can spot hosts running nulled panels.
//!
//! ## Vendors
//!
//! - **WHMCS**: the verification form is behind reCAPTCHA for anonymous
//!   visitors, so Panelwarden logs in with a WHMCS.com account and reuses
//!   the session cookie for 30 minutes.
//! - **Blesta**: anonymous; the form page supplies a CSRF token and a
//!   session id that must accompany the lookup.
//!
//! Either way the vendor's plain-text reply is classified by marker phrase
//! into [`CheckResult::Valid`], [`CheckResult::Invalid`] or
//! [`CheckResult::Error`].
//!
//! ## Quickstart
//!
//! ```no_run
//! use panelwarden::{DomainChecker, LicenseVerifier, PanelwardenConfig, Vendor};
//!
//! fn main() -> Result<(), panelwarden::PanelwardenError> {
//!     let config = PanelwardenConfig::new("ops@example.net", "account-password");
//!     let verifier = LicenseVerifier::new(&config)?;
//!
//!     let blesta = verifier.check("host.net", Vendor::Blesta);
//!     let (result, label) = verifier.check_both("host.net");
//!     println!("Blesta: {:?}; best: {:?} ({})", blesta, result, label);
//!     Ok(())
//! }
//! ```
//!
//! ## Chat glue
//!
//! [`command`] parses `!license`, `!licence`, `!whmcs` and `!blesta`
//! messages, [`report`] builds result cards, and [`Responder`] ties them to
//! a [`DomainChecker`]. Connecting to a chat platform is left to the host
//! application; the bundled binary reads messages from stdin.

#![deny(missing_docs)]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;

// Protocol layer
pub mod protocol;

// Client layer
pub mod client;

// Cache layer
pub mod cache;

// Verifier (main public API)
pub mod verifier;

// Chat glue
pub mod command;
pub mod report;
pub mod responder;

// Re-exports for public API
pub use cache::session::SessionCache;
pub use client::http::{ReqwestTransport, Transport, VendorRequest, VendorResponse};
pub use clock::{Clock, MockClock, SystemClock};
pub use command::{normalize_domain, Command, InboundMessage};
pub use config::PanelwardenConfig;
pub use errors::PanelwardenError;
pub use protocol::models::{CheckResult, Vendor};
pub use report::Card;
pub use responder::{Reply, Responder};
pub use verifier::{DomainChecker, LicenseVerifier, Verification};

