//! # agentdex-renderer
//!
//! Tera-based renderer that turns a merged [`Catalog`](agentdex_core::Catalog)
//! into the published Markdown document.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use agentdex_core::Catalog;
//! use agentdex_renderer::Renderer;
//!
//! fn preview(catalog: &Catalog) {
//!     if let Ok(renderer) = Renderer::new("Awesome Claude Agents") {
//!         if let Ok(doc) = renderer.render(catalog, None) {
//!             println!("{}", doc.text);
//!         }
//!     }
//! }
//! ```

pub mod context;
pub mod document;
pub mod engine;
pub mod error;

pub use context::{escape_cell, CatalogContext};
pub use document::{
    freshness_line, is_freshness_line, parse_freshness, RenderedDocument, FRESHNESS_PREFIX,
};
pub use engine::{Renderer, TemplateEngine, CATALOG_TEMPLATE};
pub use error::RenderError;
