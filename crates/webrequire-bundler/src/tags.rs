//! Script tag generation from a mapping artifact.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::assets::BOOTSTRAP_SNIPPET;
use crate::mapping::MappingArtifact;
use crate::{Error, Result};

/// Turns a pack URL into markup.
///
/// Returning `None` is a usage error and fails tag generation with
/// [`Error::InvalidTagGeneratorResult`].
pub trait TagFormatter: Send + Sync {
    fn format(&self, url: &str) -> Option<String>;
}

impl<F> TagFormatter for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn format(&self, url: &str) -> Option<String> {
        self(url)
    }
}

/// `<script src="..." async></script>`
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTag;

impl TagFormatter for DefaultTag {
    fn format(&self, url: &str) -> Option<String> {
        Some(format!("<script src=\"{}\" async></script>", escape_attribute(url)))
    }
}

/// A user template in which `{src}` is replaced by the pack URL.
#[derive(Debug, Clone)]
pub struct TemplateTag {
    template: String,
}

impl TemplateTag {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }
}

impl TagFormatter for TemplateTag {
    fn format(&self, url: &str) -> Option<String> {
        self.template
            .contains("{src}")
            .then(|| self.template.replace("{src}", &escape_attribute(url)))
    }
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Produces the script tags a page needs for a set of entry files.
///
/// # Example
///
/// ```
/// use webrequire_bundler::{MappingArtifact, TagGenerator};
///
/// let mut mapping = MappingArtifact::new();
/// mapping.insert("app.js", vec!["0.js".into(), "1.js".into()]);
///
/// let tags = TagGenerator::new()
///     .prefix("/static/")
///     .generate(&mapping, &["app.js"])
///     .unwrap();
/// assert_eq!(
///     tags,
///     "<script src=\"/static/0.js\" async></script>\n<script src=\"/static/1.js\" async></script>"
/// );
/// ```
pub struct TagGenerator {
    formatter: Arc<dyn TagFormatter>,
    prefix: String,
    suffix: String,
    inline_snippet: bool,
    cache_enabled: bool,
    cache: Mutex<FxHashMap<String, String>>,
}

impl std::fmt::Debug for TagGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagGenerator")
            .field("prefix", &self.prefix)
            .field("suffix", &self.suffix)
            .field("inline_snippet", &self.inline_snippet)
            .field("cache_enabled", &self.cache_enabled)
            .finish_non_exhaustive()
    }
}

impl Default for TagGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TagGenerator {
    pub fn new() -> Self {
        Self {
            formatter: Arc::new(DefaultTag),
            prefix: String::new(),
            suffix: String::new(),
            inline_snippet: false,
            cache_enabled: true,
            cache: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn formatter(mut self, formatter: impl TagFormatter + 'static) -> Self {
        self.formatter = Arc::new(formatter);
        self.cache.get_mut().clear();
        self
    }

    /// URL prefix, e.g. `/static` or `https://cdn.example.com/app`.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self.cache.get_mut().clear();
        self
    }

    /// Appended to every URL, e.g. `?v=42`.
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self.cache.get_mut().clear();
        self
    }

    /// Start the output with the inline bootstrap snippet.
    pub fn inline_snippet(mut self, enabled: bool) -> Self {
        self.inline_snippet = enabled;
        self
    }

    pub fn cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// URL of a pack.
    pub fn url(&self, pack: &str) -> String {
        if self.prefix.is_empty() {
            format!("{}{}", pack, self.suffix)
        } else {
            format!("{}/{}{}", self.prefix.trim_end_matches('/'), pack, self.suffix)
        }
    }

    /// One tag per pack needed by `entries`, joined by newlines.
    pub fn generate<S: AsRef<str>>(&self, mapping: &MappingArtifact, entries: &[S]) -> Result<String> {
        let packs = mapping.related_packs(entries)?;

        let mut tags = Vec::with_capacity(packs.len() + 1);
        if self.inline_snippet {
            tags.push(BOOTSTRAP_SNIPPET.to_string());
        }
        for pack in &packs {
            tags.push(self.tag(pack)?);
        }

        Ok(tags.join("\n"))
    }

    fn tag(&self, pack: &str) -> Result<String> {
        if self.cache_enabled {
            if let Some(tag) = self.cache.lock().get(pack) {
                return Ok(tag.clone());
            }
        }

        let tag = self
            .formatter
            .format(&self.url(pack))
            .ok_or_else(|| Error::InvalidTagGeneratorResult(pack.to_string()))?;

        if self.cache_enabled {
            self.cache.lock().insert(pack.to_string(), tag.clone());
        }
        Ok(tag)
    }
}
