//! Vendor protocol details: identities, marker phrases, form scraping.

pub mod markup;
pub mod models;
