//! Vendor identities, result classification, and the wire constants each
//! vendor's verification form depends on.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Body text of an authorized domain.
pub const AUTHORIZED_MARKER: &str = "This domain is authorized to be using";

/// Body text of an unauthorized domain.
pub const NOT_AUTHORIZED_MARKER: &str = "This domain is not authorized to be using";

/// WHMCS session cookie, both the transient pre-login value and the session.
pub const WHMCS_SESSION_COOKIE: &str = "WHMCSXbAkzYLZLCZ4";

/// Blesta session id cookie.
pub const BLESTA_SESSION_COOKIE: &str = "blesta_sid";

/// Hidden `<input>` carrying Blesta's CSRF token.
pub const BLESTA_CSRF_FIELD: &str = "_csrf_token";

/// Label used when both vendors were tried.
pub const COMBINED_LABEL: &str = "WHMCS / Blesta";

/// Billing-panel publisher offering a public license lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    /// WHMCS: credential login, session cookie.
    Whmcs,
    /// Blesta: anonymous, CSRF token plus session id.
    Blesta,
}

impl Vendor {
    /// Human-facing license label.
    pub fn label(self) -> &'static str {
        match self {
            Vendor::Whmcs => "WHMCS",
            Vendor::Blesta => "Blesta",
        }
    }

    /// Marker phrases as `(authorized, not_authorized)`.
    ///
    /// Both vendors currently word their responses identically.
    pub fn markers(self) -> (&'static str, &'static str) {
        match self {
            Vendor::Whmcs | Vendor::Blesta => (AUTHORIZED_MARKER, NOT_AUTHORIZED_MARKER),
        }
    }

    /// Classify a raw verification response body.
    ///
    /// Plain, case-sensitive substring matching against the vendor's literal
    /// wording. The authorized marker wins if both are somehow present.
    pub fn classify(self, body: &str) -> CheckResult {
        let (authorized, not_authorized) = self.markers();
        if body.contains(authorized) {
            CheckResult::Valid
        } else if body.contains(not_authorized) {
            CheckResult::Invalid
        } else {
            CheckResult::Error
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of a license check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckResult {
    /// The vendor reports the domain as licensed.
    Valid,
    /// The vendor reports the domain as not licensed.
    Invalid,
    /// The check could not be completed or the response was not recognised.
    Error,
}

impl CheckResult {
    /// Status text shown to users.
    pub fn status_text(self) -> &'static str {
        match self {
            CheckResult::Valid => "Verified",
            CheckResult::Invalid => "Invalid",
            CheckResult::Error => "Error",
        }
    }

    /// Whether this is [`CheckResult::Valid`].
    pub fn is_valid(self) -> bool {
        matches!(self, CheckResult::Valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_authorized() {
        let body = "<p>This domain is authorized to be using WHMCS.</p>";
        assert_eq!(Vendor::Whmcs.classify(body), CheckResult::Valid);
        assert_eq!(Vendor::Blesta.classify(body), CheckResult::Valid);
    }

    #[test]
    fn test_classify_not_authorized() {
        let body = "Sorry! This domain is not authorized to be using Blesta";
        assert_eq!(Vendor::Blesta.classify(body), CheckResult::Invalid);
    }

    #[test]
    fn test_classify_unrecognised() {
        assert_eq!(Vendor::Blesta.classify(""), CheckResult::Error);
        assert_eq!(
            Vendor::Whmcs.classify("<html>Please complete the captcha</html>"),
            CheckResult::Error
        );
    }

    #[test]
    fn test_classify_is_case_sensitive() {
        let body = "THIS DOMAIN IS AUTHORIZED TO BE USING WHMCS";
        assert_eq!(Vendor::Whmcs.classify(body), CheckResult::Error);
    }

    #[test]
    fn test_markers_do_not_overlap() {
        assert!(!NOT_AUTHORIZED_MARKER.contains(AUTHORIZED_MARKER));
    }

    #[test]
    fn test_labels() {
        assert_eq!(Vendor::Whmcs.to_string(), "WHMCS");
        assert_eq!(Vendor::Blesta.label(), "Blesta");
        assert_eq!(COMBINED_LABEL, "WHMCS / Blesta");
    }

    #[test]
    fn test_status_text() {
        assert_eq!(CheckResult::Valid.status_text(), "Verified");
        assert_eq!(CheckResult::Invalid.status_text(), "Invalid");
        assert_eq!(CheckResult::Error.status_text(), "Error");
        assert!(CheckResult::Valid.is_valid());
        assert!(!CheckResult::Error.is_valid());
    }
}
