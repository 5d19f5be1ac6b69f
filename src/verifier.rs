//! License Verifier - the main public API for Panelwarden.
//!
//! The `LicenseVerifier` runs each vendor's request sequence:
//! - WHMCS: cached logged-in session cookie, then the verification form
//! - Blesta: fetch the form page for its CSRF token and session id, then submit
//!
//! and classifies the vendor's reply into a [`CheckResult`].

use crate::cache::session::SessionCache;
use crate::client::http::{ReqwestTransport, Transport, VendorRequest};
use crate::clock::{Clock, SystemClock};
use crate::config::{Endpoints, PanelwardenConfig};
use crate::protocol::markup::find_input_value;
use crate::protocol::models::{
    CheckResult, Vendor, BLESTA_CSRF_FIELD, BLESTA_SESSION_COOKIE, COMBINED_LABEL,
    WHMCS_SESSION_COOKIE,
};
use crate::PanelwardenError;
use std::sync::Arc;
use tracing::{debug, warn};

/// Detailed outcome of one vendor check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    /// Vendor that was queried.
    pub vendor: Vendor,

    /// Classified result. `Error` here means the body matched no marker.
    pub result: CheckResult,

    /// HTTP status of the verification response.
    pub status: u16,

    /// Raw verification response body, for diagnostics.
    pub body: String,
}

/// Something that can check a domain against a vendor.
///
/// [`LicenseVerifier`] is the real implementation; the trait is the seam the
/// chat responder and the combined check are written against.
pub trait DomainChecker {
    /// Check `domain` against one vendor. Never fails: every problem
    /// becomes [`CheckResult::Error`].
    fn check(&self, domain: &str, vendor: Vendor) -> CheckResult;

    /// Check WHMCS first, then Blesta.
    ///
    /// Returns the first `Valid` vendor with its label. If neither is valid,
    /// returns the WHMCS result under the combined label.
    fn check_both(&self, domain: &str) -> (CheckResult, &'static str) {
        let whmcs = self.check(domain, Vendor::Whmcs);
        if whmcs.is_valid() {
            return (whmcs, Vendor::Whmcs.label());
        }

        let blesta = self.check(domain, Vendor::Blesta);
        if blesta.is_valid() {
            return (blesta, Vendor::Blesta.label());
        }

        (whmcs, COMBINED_LABEL)
    }
}

/// Verifies billing-panel licenses against the vendors' public lookups.
///
/// Create one instance per process and reuse it; it owns the WHMCS session
/// cache.
pub struct LicenseVerifier {
    transport: Arc<dyn Transport>,
    session: SessionCache,
    endpoints: Endpoints,
}

impl LicenseVerifier {
    /// Create a verifier with the reqwest transport and the system clock.
    ///
    /// # Errors
    /// Returns an error if configuration validation or HTTP client creation fails.
    pub fn new(config: &PanelwardenConfig) -> Result<Self, PanelwardenError> {
        config.validate()?;
        let transport = Arc::new(ReqwestTransport::new(config)?);
        Self::with_parts(config, transport, Arc::new(SystemClock))
    }

    /// Create a verifier with an injected transport and clock.
    pub fn with_parts(
        config: &PanelwardenConfig,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, PanelwardenError> {
        let session = SessionCache::new(config, Arc::clone(&transport), clock)?;
        Ok(Self {
            transport,
            session,
            endpoints: config.endpoints.clone(),
        })
    }

    /// The WHMCS session cache.
    pub fn session(&self) -> &SessionCache {
        &self.session
    }

    /// Run one vendor check and return the detailed outcome.
    ///
    /// # Errors
    /// - `Transport` - a vendor request failed or timed out
    /// - `MissingCookie` - the vendor did not set an expected cookie
    /// - `MissingFormField` - the Blesta page had no CSRF token field
    pub fn verify(&self, domain: &str, vendor: Vendor) -> Result<Verification, PanelwardenError> {
        let request = self.prepare(domain, vendor)?;
        let response = self.transport.send(&request)?;
        let result = vendor.classify(&response.body);

        debug!(%vendor, domain, status = response.status, ?result, "Classified vendor response");

        Ok(Verification {
            vendor,
            result,
            status: response.status,
            body: response.body,
        })
    }

    fn prepare(&self, domain: &str, vendor: Vendor) -> Result<VendorRequest, PanelwardenError> {
        match vendor {
            Vendor::Whmcs => {
                let token = self.session.get_session()?;
                Ok(
                    VendorRequest::post_form(&self.endpoints.whmcs_verify, &[("domain", domain)])
                        .with_cookie(WHMCS_SESSION_COOKIE, &token),
                )
            }
            Vendor::Blesta => {
                let page = self
                    .transport
                    .send(&VendorRequest::get(&self.endpoints.blesta_verify))?;
                let csrf_token = find_input_value(&page.body, BLESTA_CSRF_FIELD).ok_or(
                    PanelwardenError::MissingFormField {
                        name: BLESTA_CSRF_FIELD,
                    },
                )?;
                let sid = page
                    .cookie(BLESTA_SESSION_COOKIE)
                    .ok_or(PanelwardenError::MissingCookie {
                        name: BLESTA_SESSION_COOKIE,
                    })?;

                Ok(VendorRequest::post_form(
                    &self.endpoints.blesta_verify,
                    &[("search", domain), (BLESTA_CSRF_FIELD, csrf_token.as_str())],
                )
                .with_cookie(BLESTA_SESSION_COOKIE, sid))
            }
        }
    }
}

impl DomainChecker for LicenseVerifier {
    fn check(&self, domain: &str, vendor: Vendor) -> CheckResult {
        match self.verify(domain, vendor) {
            Ok(verification) => {
                if verification.result == CheckResult::Error {
                    warn!(
                        %vendor,
                        domain,
                        status = verification.status,
                        "Vendor response matched no marker phrase"
                    );
                }
                verification.result
            }
            Err(err) => {
                warn!(%vendor, domain, error = %err, "License check failed");
                CheckResult::Error
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::http::{Method, VendorResponse};
    use crate::clock::MockClock;
    use std::sync::Mutex;

    const BLESTA_FORM: &str =
        r#"<form><input type="hidden" name="_csrf_token" value="csrf-123"><input name="search"></form>"#;

    /// Routes requests by URL and method to canned responses.
    struct RoutedTransport {
        routes: Vec<(Method, String, Result<VendorResponse, String>)>,
        requests: Mutex<Vec<VendorRequest>>,
    }

    impl RoutedTransport {
        fn new() -> Self {
            Self {
                routes: Vec::new(),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn route(mut self, method: Method, url: &str, response: Result<VendorResponse, String>) -> Self {
            self.routes.push((method, url.to_string(), response));
            self
        }

        fn requests(&self) -> Vec<VendorRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Transport for RoutedTransport {
        fn send(&self, request: &VendorRequest) -> Result<VendorResponse, PanelwardenError> {
            self.requests.lock().unwrap().push(request.clone());
            let (_, _, response) = self
                .routes
                .iter()
                .find(|(method, url, _)| *method == request.method && *url == request.url)
                .expect("unrouted request");
            response.clone().map_err(PanelwardenError::Transport)
        }
    }

    fn ok(body: &str, cookies: &[(&str, &str)]) -> Result<VendorResponse, String> {
        Ok(VendorResponse {
            status: 200,
            cookies: cookies
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: body.to_string(),
        })
    }

    fn blesta_routes(page: Result<VendorResponse, String>, verdict: Result<VendorResponse, String>) -> RoutedTransport {
        let url = &Endpoints::default().blesta_verify;
        RoutedTransport::new()
            .route(Method::Get, url, page)
            .route(Method::Post, url, verdict)
    }

    fn whmcs_routes(verdict: Result<VendorResponse, String>) -> RoutedTransport {
        let endpoints = Endpoints::default();
        RoutedTransport::new()
            .route(
                Method::Get,
                &endpoints.whmcs_client_area,
                ok("", &[(WHMCS_SESSION_COOKIE, "transient")]),
            )
            .route(
                Method::Post,
                &endpoints.whmcs_login,
                ok("", &[(WHMCS_SESSION_COOKIE, "session")]),
            )
            .route(Method::Post, &endpoints.whmcs_verify, verdict)
    }

    fn verifier(transport: Arc<RoutedTransport>) -> LicenseVerifier {
        let config = PanelwardenConfig::new("ops@example.net", "hunter2");
        let clock = Arc::new(MockClock::from_rfc3339("2023-08-05T12:00:00Z").unwrap());
        LicenseVerifier::with_parts(&config, transport, clock).unwrap()
    }

    #[test]
    fn test_verifier_creation() {
        let config = PanelwardenConfig::new("ops@example.net", "hunter2");
        assert!(LicenseVerifier::new(&config).is_ok());
    }

    #[test]
    fn test_verifier_rejects_invalid_config() {
        let config = PanelwardenConfig::new("", "");
        assert!(matches!(
            LicenseVerifier::new(&config),
            Err(PanelwardenError::ConfigError(_))
        ));
    }

    #[test]
    fn test_blesta_request_sequence() {
        let transport = Arc::new(blesta_routes(
            ok(BLESTA_FORM, &[(BLESTA_SESSION_COOKIE, "sid-9")]),
            ok("This domain is authorized to be using Blesta", &[]),
        ));
        let verifier = verifier(transport.clone());

        assert_eq!(verifier.check("host.net", Vendor::Blesta), CheckResult::Valid);

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, Method::Get);
        let submit = &requests[1];
        assert_eq!(submit.method, Method::Post);
        assert_eq!(submit.form_value("search"), Some("host.net"));
        assert_eq!(submit.form_value("_csrf_token"), Some("csrf-123"));
        assert_eq!(submit.cookie(BLESTA_SESSION_COOKIE), Some("sid-9"));
    }

    #[test]
    fn test_blesta_invalid() {
        let transport = Arc::new(blesta_routes(
            ok(BLESTA_FORM, &[(BLESTA_SESSION_COOKIE, "sid")]),
            ok("This domain is not authorized to be using Blesta", &[]),
        ));
        assert_eq!(verifier(transport).check("host.net", Vendor::Blesta), CheckResult::Invalid);
    }

    #[test]
    fn test_blesta_unrecognised_body_keeps_raw_text() {
        let transport = Arc::new(blesta_routes(
            ok(BLESTA_FORM, &[(BLESTA_SESSION_COOKIE, "sid")]),
            ok("Too many requests", &[]),
        ));
        let verifier = verifier(transport);

        let verification = verifier.verify("host.net", Vendor::Blesta).unwrap();
        assert_eq!(verification.result, CheckResult::Error);
        assert_eq!(verification.body, "Too many requests");
        assert_eq!(verifier.check("host.net", Vendor::Blesta), CheckResult::Error);
    }

    #[test]
    fn test_blesta_page_transport_failure() {
        let transport = Arc::new(blesta_routes(
            Err("connection refused".to_string()),
            ok("unreachable", &[]),
        ));
        let verifier = verifier(transport.clone());

        assert_eq!(verifier.check("host.net", Vendor::Blesta), CheckResult::Error);
        // Never reached the verification POST.
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn test_blesta_missing_csrf_field() {
        let transport = Arc::new(blesta_routes(
            ok("<form></form>", &[(BLESTA_SESSION_COOKIE, "sid")]),
            ok("unreachable", &[]),
        ));
        let verifier = verifier(transport);

        assert!(matches!(
            verifier.verify("host.net", Vendor::Blesta),
            Err(PanelwardenError::MissingFormField { name: "_csrf_token" })
        ));
        assert_eq!(verifier.check("host.net", Vendor::Blesta), CheckResult::Error);
    }

    #[test]
    fn test_blesta_missing_sid_cookie() {
        let transport = Arc::new(blesta_routes(ok(BLESTA_FORM, &[]), ok("unreachable", &[])));
        assert!(matches!(
            verifier(transport).verify("host.net", Vendor::Blesta),
            Err(PanelwardenError::MissingCookie { name: "blesta_sid" })
        ));
    }

    #[test]
    fn test_whmcs_request_sequence() {
        let transport = Arc::new(whmcs_routes(ok(
            "This domain is authorized to be using WHMCS",
            &[],
        )));
        let verifier = verifier(transport.clone());

        assert_eq!(verifier.check("host.net", Vendor::Whmcs), CheckResult::Valid);

        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        let submit = &requests[2];
        assert!(submit.url.ends_with("verifydomain.php"));
        assert_eq!(submit.form_value("domain"), Some("host.net"));
        assert_eq!(submit.cookie(WHMCS_SESSION_COOKIE), Some("session"));
        assert!(verifier.session().refreshed_at().is_some());
    }

    #[test]
    fn test_whmcs_session_reused_across_checks() {
        let transport = Arc::new(whmcs_routes(ok(
            "This domain is not authorized to be using WHMCS",
            &[],
        )));
        let verifier = verifier(transport.clone());

        assert_eq!(verifier.check("a.net", Vendor::Whmcs), CheckResult::Invalid);
        assert_eq!(verifier.check("b.net", Vendor::Whmcs), CheckResult::Invalid);

        // Login once (2 exchanges) plus two verification posts.
        assert_eq!(transport.requests().len(), 4);
    }

    #[test]
    fn test_whmcs_session_failure_is_error() {
        let endpoints = Endpoints::default();
        let transport = Arc::new(RoutedTransport::new().route(
            Method::Get,
            &endpoints.whmcs_client_area,
            Err("timed out".to_string()),
        ));
        let verifier = verifier(transport.clone());

        assert_eq!(verifier.check("host.net", Vendor::Whmcs), CheckResult::Error);
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn test_verification_post_timeout_is_error() {
        let transport = Arc::new(whmcs_routes(Err("operation timed out".to_string())));
        assert_eq!(verifier(transport).check("host.net", Vendor::Whmcs), CheckResult::Error);
    }

    struct StubChecker {
        whmcs: CheckResult,
        blesta: CheckResult,
        calls: Mutex<Vec<Vendor>>,
    }

    impl StubChecker {
        fn new(whmcs: CheckResult, blesta: CheckResult) -> Self {
            Self {
                whmcs,
                blesta,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl DomainChecker for StubChecker {
        fn check(&self, _domain: &str, vendor: Vendor) -> CheckResult {
            self.calls.lock().unwrap().push(vendor);
            match vendor {
                Vendor::Whmcs => self.whmcs,
                Vendor::Blesta => self.blesta,
            }
        }
    }

    #[test]
    fn test_check_both_short_circuits_on_whmcs() {
        let stub = StubChecker::new(CheckResult::Valid, CheckResult::Valid);
        assert_eq!(stub.check_both("host.net"), (CheckResult::Valid, "WHMCS"));
        assert_eq!(*stub.calls.lock().unwrap(), vec![Vendor::Whmcs]);
    }

    #[test]
    fn test_check_both_falls_back_to_blesta() {
        let stub = StubChecker::new(CheckResult::Invalid, CheckResult::Valid);
        assert_eq!(stub.check_both("host.net"), (CheckResult::Valid, "Blesta"));
    }

    #[test]
    fn test_check_both_reports_whmcs_result_when_neither_valid() {
        let stub = StubChecker::new(CheckResult::Invalid, CheckResult::Invalid);
        assert_eq!(stub.check_both("host.net"), (CheckResult::Invalid, "WHMCS / Blesta"));

        let stub = StubChecker::new(CheckResult::Error, CheckResult::Invalid);
        assert_eq!(stub.check_both("host.net"), (CheckResult::Error, "WHMCS / Blesta"));

        let stub = StubChecker::new(CheckResult::Invalid, CheckResult::Error);
        assert_eq!(stub.check_both("host.net"), (CheckResult::Invalid, "WHMCS / Blesta"));
    }
}
