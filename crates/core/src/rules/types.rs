//! Types for rule sources, descriptors and generated links.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Category assigned to rules that do not declare one.
pub const DEFAULT_CATEGORY: &str = "Other";

/// An external search source, loaded from the rule file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSource {
    #[serde(default)]
    pub name: String,
    /// Site base URL, or the location of a JSON descriptor.
    pub url: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl RuleSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            category: default_category(),
            icon: None,
            desc: None,
        }
    }
}

/// Where a template was found in a descriptor body.
///
/// Variants are listed in lookup priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateShape {
    /// Top-level `searchUrlTemplate`.
    SearchUrlTemplate(String),
    /// Top-level `template`.
    Template(String),
    /// Nested `search.template`.
    NestedTemplate(String),
    /// Nested `search.url`.
    NestedUrl(String),
    /// No recognized template string.
    Unrecognized,
}

impl TemplateShape {
    /// The template string, if one was recognized.
    pub fn template(&self) -> Option<&str> {
        match self {
            TemplateShape::SearchUrlTemplate(t)
            | TemplateShape::Template(t)
            | TemplateShape::NestedTemplate(t)
            | TemplateShape::NestedUrl(t) => Some(t),
            TemplateShape::Unrecognized => None,
        }
    }
}

/// Parsed body of a rule's own JSON descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDescriptor {
    pub shape: TemplateShape,
    pub home: Option<String>,
    pub base: Option<String>,
    /// Hint that the source usually needs a proxy.
    pub need_proxy: bool,
}

impl TemplateDescriptor {
    /// Read a descriptor from an arbitrary JSON body.
    pub fn from_json(body: &Value) -> Self {
        let string_field = |key: &str| body.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            shape: super::extract_template(body),
            home: string_field("home"),
            base: string_field("base"),
            need_proxy: body.get("needProxy").and_then(Value::as_bool) == Some(true),
        }
    }

    /// Homepage target: `home`, then `base`, then the given fallback.
    pub fn homepage<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.home
            .as_deref()
            .or(self.base.as_deref())
            .unwrap_or(fallback)
    }
}

/// Presentation hint for a generated link. Never affects resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    Primary,
    Secondary,
    Warn,
}

impl LinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkKind::Primary => "primary",
            LinkKind::Secondary => "secondary",
            LinkKind::Warn => "warn",
        }
    }
}

/// A candidate link for one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchLink {
    pub label: String,
    pub href: String,
    pub kind: LinkKind,
    /// Set on a descriptor's homepage link when it declares `needProxy`.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub warn: bool,
}

impl SearchLink {
    pub fn new(label: impl Into<String>, href: impl Into<String>, kind: LinkKind) -> Self {
        Self {
            label: label.into(),
            href: href.into(),
            kind,
            warn: false,
        }
    }

    pub fn with_warn(mut self, warn: bool) -> Self {
        self.warn = warn;
        self
    }
}
