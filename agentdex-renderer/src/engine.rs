//! Tera rendering engine — [`TemplateEngine`] and the catalog [`Renderer`].
//!
//! The catalog template and its partials are embedded in the binary. A user
//! template directory may shadow any of them by relative name:
//! `catalog.md.tera` replaces the whole document layout, while
//! `_partials/sources.tera` and `_partials/agents.tera` replace one table.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tera::Tera;

use agentdex_core::types::Catalog;

use crate::context::CatalogContext;
use crate::document::RenderedDocument;
use crate::error::RenderError;

/// Entry template name.
pub const CATALOG_TEMPLATE: &str = "catalog.md.tera";

// ---------------------------------------------------------------------------
// Embedded templates — baked into the binary at compile time via include_str!
// ---------------------------------------------------------------------------

const TPLS: &[(&str, &str)] = &[
    ("_partials/sources.tera", include_str!("templates/_partials/sources.tera")),
    ("_partials/agents.tera", include_str!("templates/_partials/agents.tera")),
    (CATALOG_TEMPLATE, include_str!("templates/catalog.md.tera")),
];

// ---------------------------------------------------------------------------
// Template loading helpers
// ---------------------------------------------------------------------------

fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RenderError {
    RenderError::Io { path: path.into(), source }
}

fn normalize_template_name(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").to_lowercase()
}

fn collect_template_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), RenderError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        let meta = entry.metadata().map_err(|e| io_err(&path, e))?;
        if meta.is_dir() {
            collect_template_files(&path, out)?;
        } else if meta.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

fn load_user_templates(dir: &Path) -> Result<Vec<(String, String)>, RenderError> {
    if !dir.exists() {
        return Err(RenderError::TemplateDirMissing(dir.to_path_buf()));
    }
    let mut files = Vec::new();
    collect_template_files(dir, &mut files)?;
    files.sort();
    let mut templates = Vec::new();
    for path in files {
        if path.extension().and_then(|s| s.to_str()) != Some("tera") {
            continue;
        }
        let rel = path.strip_prefix(dir).unwrap_or(path.as_path());
        let name = normalize_template_name(rel);
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        templates.push((name, contents));
    }
    Ok(templates)
}

fn build_tera(user_template_dir: Option<&Path>) -> Result<Tera, RenderError> {
    let mut templates: HashMap<String, String> = HashMap::new();
    for (name, content) in TPLS {
        templates.insert(
            normalize_template_name(Path::new(name)),
            (*content).to_string(),
        );
    }
    if let Some(dir) = user_template_dir {
        for (name, content) in load_user_templates(dir)? {
            templates.insert(name, content);
        }
    }

    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);
    let items: Vec<(String, String)> = templates.into_iter().collect();
    tera.add_raw_templates(items)?;
    Ok(tera)
}

// ---------------------------------------------------------------------------
// TemplateEngine
// ---------------------------------------------------------------------------

/// Tera-based engine with optional user overrides.
///
/// Template names are normalised to lowercase relative paths.
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    pub fn new(user_template_dir: Option<&Path>) -> Result<Self, RenderError> {
        let tera = build_tera(user_template_dir)?;
        Ok(TemplateEngine { tera })
    }

    pub fn render(&self, ctx: &CatalogContext) -> Result<String, RenderError> {
        let tera_ctx = ctx.to_tera_context()?;
        Ok(self.tera.render(CATALOG_TEMPLATE, &tera_ctx)?)
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Renders a [`Catalog`] into Markdown. Create once and reuse.
pub struct Renderer {
    engine: TemplateEngine,
    title: String,
}

impl Renderer {
    /// Renderer over the embedded templates only.
    pub fn new(title: impl Into<String>) -> Result<Self, RenderError> {
        Self::with_template_dir(title, None)
    }

    /// Renderer whose templates may be overridden from `template_dir`.
    pub fn with_template_dir(
        title: impl Into<String>,
        template_dir: Option<&Path>,
    ) -> Result<Self, RenderError> {
        Ok(Renderer {
            engine: TemplateEngine::new(template_dir)?,
            title: title.into(),
        })
    }

    /// Render `catalog`. `at` pins the freshness timestamp; `None` means now.
    ///
    /// Identical catalogs rendered with the same `at` produce identical text.
    pub fn render(
        &self,
        catalog: &Catalog,
        at: Option<DateTime<Utc>>,
    ) -> Result<RenderedDocument, RenderError> {
        let generated_at = at.unwrap_or_else(Utc::now);
        let ctx = CatalogContext::from_catalog(catalog, &self.title, generated_at);
        let text = self.engine.render(&ctx)?;
        Ok(RenderedDocument { text, generated_at })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
