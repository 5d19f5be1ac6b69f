//! Basic smoke test to verify the public API is exported.

#[test]
fn crate_compiles() {
    // If this test runs, the crate skeleton is valid.
    let _ = std::any::type_name::<panelwarden::PanelwardenConfig>();
    let _ = std::any::type_name::<panelwarden::PanelwardenError>();
    let _ = std::any::type_name::<panelwarden::LicenseVerifier>();
    let _ = std::any::type_name::<panelwarden::Responder<panelwarden::LicenseVerifier>>();
}
