//! Record analysis between parsing and rendering.
//!
//! - [`window`] - Reporting window membership and adjacent-month completeness
//! - [`enrich`] - Left join of detail records against an enrichment CSV
//! - [`aggregate`] - Entity × period count matrices with zero-fill
//! - [`names`] - Persisted raw-identifier → display-name mapping

pub mod aggregate;
pub mod enrich;
pub mod names;
pub mod window;
