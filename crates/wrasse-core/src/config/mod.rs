//! Caller-facing configuration and the resolver that turns it into the
//! per-call effective form.
//!
//! `SanitizerConfig` is a plain value type with camelCase serde names, so a
//! config can be written as JSON exactly the way the upstream library takes
//! its option object. Resolution clones the caller's config, folds profiles
//! and add-lists into the allow sets, lowercases identifiers outside XHTML,
//! applies the implied additions (`table`→`tbody`, whole-document shell
//! tags), and compiles user regexes; a pattern that fails to compile
//! disables that specific check rather than failing the call.

use crate::generated;
use crate::hooks::AllowSet;
use crate::namespace::{HTML_NAMESPACE, MATHML_NAMESPACE, SVG_NAMESPACE};
use regex::Regex;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParserMediaType {
    #[default]
    #[serde(rename = "text/html")]
    TextHtml,
    #[serde(rename = "application/xhtml+xml")]
    ApplicationXhtmlXml,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Profiles {
    pub html: bool,
    pub svg: bool,
    pub svg_filters: bool,
    #[serde(rename = "mathMl")]
    pub math_ml: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CustomElementHandling {
    /// Regex a custom element tag name must match to be kept.
    pub tag_name_check: Option<String>,
    /// Regex an attribute name on a custom element must match to be kept.
    pub attribute_name_check: Option<String>,
    /// Permit `is="..."` customized built-ins when the value matches
    /// `tag_name_check`.
    pub allow_customized_built_in_elements: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SanitizerConfig {
    /// Replaces the default allow list when present.
    pub allowed_tags: Option<Vec<String>>,
    /// Replaces the default attribute allow list when present.
    pub allowed_attributes: Option<Vec<String>>,
    /// Replaces the default namespace allow list when present.
    #[serde(rename = "allowedNamespaceURIs")]
    pub allowed_namespace_uris: Option<Vec<String>>,
    /// Replaces the default forbid-contents list when present.
    pub forbid_contents: Option<Vec<String>>,
    pub add_tags: Vec<String>,
    pub add_attributes: Vec<String>,
    pub forbid_tags: Vec<String>,
    pub forbid_attributes: Vec<String>,
    /// Added on top of the default data-URI tag list.
    #[serde(rename = "dataURITags")]
    pub data_uri_tags: Vec<String>,
    /// Added on top of the default URI-safe attribute list.
    pub uri_safe_attributes: Vec<String>,

    pub allow_data_attributes: bool,
    pub allow_aria_attributes: bool,
    pub allow_unknown_protocols: bool,
    pub allow_self_close_in_attributes: bool,
    #[serde(rename = "safeForXML")]
    pub safe_for_xml: bool,
    pub safe_for_templates: bool,
    pub whole_document: bool,
    pub force_body: bool,
    pub keep_content: bool,
    #[serde(rename = "sanitizeDOM")]
    pub sanitize_dom: bool,
    pub sanitize_named_props: bool,

    pub parser_media_type: ParserMediaType,
    #[serde(rename = "namespaceURI")]
    pub namespace_uri: String,

    pub use_profiles: Option<Profiles>,
    #[serde(rename = "allowedURIRegExp")]
    pub allowed_uri_regexp: Option<String>,
    pub custom_element_handling: CustomElementHandling,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        SanitizerConfig {
            allowed_tags: None,
            allowed_attributes: None,
            allowed_namespace_uris: None,
            forbid_contents: None,
            add_tags: Vec::new(),
            add_attributes: Vec::new(),
            forbid_tags: Vec::new(),
            forbid_attributes: Vec::new(),
            data_uri_tags: Vec::new(),
            uri_safe_attributes: Vec::new(),
            allow_data_attributes: true,
            allow_aria_attributes: true,
            allow_unknown_protocols: false,
            allow_self_close_in_attributes: true,
            safe_for_xml: true,
            safe_for_templates: false,
            whole_document: false,
            force_body: false,
            keep_content: true,
            sanitize_dom: true,
            sanitize_named_props: false,
            parser_media_type: ParserMediaType::TextHtml,
            namespace_uri: HTML_NAMESPACE.to_string(),
            use_profiles: None,
            allowed_uri_regexp: None,
            custom_element_handling: CustomElementHandling::default(),
        }
    }
}

impl SanitizerConfig {
    /// Builds a config from a JSON value with the camelCase field names the
    /// upstream option object uses.
    pub fn from_json(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}

/// How the allowed-URI check behaves for this call.
pub(crate) enum UriPolicy {
    /// The built-in allow list (fast ASCII scheme path + fallback regex).
    Default,
    Custom(Regex),
    /// A user pattern failed to compile: the check never matches.
    Disabled,
}

/// The per-call effective configuration: owned sets keyed the way lookups
/// happen (lowercased outside XHTML), compiled regexes, and the two allow
/// sets hook events expose as live capabilities.
pub(crate) struct ResolvedConfig {
    pub allowed_tags: AllowSet,
    pub allowed_attributes: AllowSet,
    pub forbid_tags: FxHashSet<String>,
    pub forbid_attributes: FxHashSet<String>,
    pub forbid_contents: FxHashSet<String>,
    pub uri_safe_attributes: FxHashSet<String>,
    pub data_uri_tags: FxHashSet<String>,
    pub allowed_namespaces: FxHashSet<String>,

    pub allow_data_attributes: bool,
    pub allow_aria_attributes: bool,
    pub allow_unknown_protocols: bool,
    pub allow_self_close_in_attributes: bool,
    pub safe_for_xml: bool,
    pub safe_for_templates: bool,
    pub whole_document: bool,
    pub force_body: bool,
    pub keep_content: bool,
    pub sanitize_dom: bool,
    pub sanitize_named_props: bool,

    pub parser_media_type: ParserMediaType,
    pub namespace_uri: String,

    pub allowed_uri: UriPolicy,
    pub tag_name_check: Option<Regex>,
    pub attribute_name_check: Option<Regex>,
    pub allow_customized_built_in_elements: bool,
}

impl ResolvedConfig {
    pub fn is_xhtml(&self) -> bool {
        self.parser_media_type == ParserMediaType::ApplicationXhtmlXml
    }
}

pub(crate) fn resolve(cfg: &SanitizerConfig) -> ResolvedConfig {
    let xhtml = cfg.parser_media_type == ParserMediaType::ApplicationXhtmlXml;
    // User-supplied case survives only under XHTML; HTML-mode lookups are
    // keyed by lowercase, including the camelCase SVG defaults.
    let transform = |s: &str| {
        if xhtml {
            s.to_string()
        } else {
            s.to_ascii_lowercase()
        }
    };

    let transform_all = |list: &[String]| -> FxHashSet<String> {
        list.iter().map(|s| transform(s)).collect()
    };
    let transform_static = |list: &[&str]| -> FxHashSet<String> {
        list.iter().map(|s| transform(s)).collect()
    };

    let mut allowed_tags: FxHashSet<String>;
    let mut allowed_attributes: FxHashSet<String>;

    if let Some(profiles) = &cfg.use_profiles {
        allowed_tags = transform_static(generated::defaults::TEXT_TAGS);
        allowed_attributes = FxHashSet::default();
        if profiles.html {
            allowed_tags.extend(transform_static(generated::defaults::HTML_TAGS));
            allowed_attributes.extend(transform_static(generated::defaults::HTML_ATTRS));
        }
        if profiles.svg {
            allowed_tags.extend(transform_static(generated::defaults::SVG_TAGS));
            allowed_attributes.extend(transform_static(generated::defaults::SVG_ATTRS));
            allowed_attributes.extend(transform_static(generated::defaults::XML_ATTRS));
        }
        if profiles.svg_filters {
            allowed_tags.extend(transform_static(generated::defaults::SVG_FILTER_TAGS));
            allowed_attributes.extend(transform_static(generated::defaults::SVG_ATTRS));
            allowed_attributes.extend(transform_static(generated::defaults::XML_ATTRS));
        }
        if profiles.math_ml {
            allowed_tags.extend(transform_static(generated::defaults::MATHML_TAGS));
            allowed_attributes.extend(transform_static(generated::defaults::MATHML_ATTRS));
            allowed_attributes.extend(transform_static(generated::defaults::XML_ATTRS));
        }
    } else {
        allowed_tags = match &cfg.allowed_tags {
            Some(tags) => transform_all(tags),
            None => generated::default_allowed_tags()
                .iter()
                .map(|s| transform(s))
                .collect(),
        };
        allowed_attributes = match &cfg.allowed_attributes {
            Some(attrs) => transform_all(attrs),
            None => generated::default_allowed_attributes()
                .iter()
                .map(|s| transform(s))
                .collect(),
        };
    }

    allowed_tags.extend(cfg.add_tags.iter().map(|s| transform(s)));
    allowed_attributes.extend(cfg.add_attributes.iter().map(|s| transform(s)));

    let mut forbid_tags = transform_all(&cfg.forbid_tags);
    let forbid_attributes = transform_all(&cfg.forbid_attributes);

    let forbid_contents = match &cfg.forbid_contents {
        Some(list) => transform_all(list),
        None => generated::default_forbid_contents()
            .iter()
            .map(|s| transform(s))
            .collect(),
    };

    let mut uri_safe_attributes: FxHashSet<String> = generated::default_uri_safe_attributes()
        .iter()
        .map(|s| transform(s))
        .collect();
    uri_safe_attributes.extend(cfg.uri_safe_attributes.iter().map(|s| transform(s)));

    let mut data_uri_tags: FxHashSet<String> = generated::default_data_uri_tags()
        .iter()
        .map(|s| transform(s))
        .collect();
    data_uri_tags.extend(cfg.data_uri_tags.iter().map(|s| transform(s)));

    if cfg.whole_document {
        for tag in ["html", "head", "body"] {
            allowed_tags.insert(tag.to_string());
        }
    }

    // Unwrapping splices text out of removed elements, so keeping content
    // implies keeping text nodes.
    if cfg.keep_content {
        allowed_tags.insert("#text".to_string());
    }

    // Mirrors the DOM quirk where a stray <tbody> materializes around table
    // rows: allowing <table> must allow (and un-forbid) <tbody>.
    if allowed_tags.contains("table") {
        allowed_tags.insert("tbody".to_string());
        forbid_tags.remove("tbody");
    }

    let allowed_namespaces: FxHashSet<String> = match &cfg.allowed_namespace_uris {
        Some(list) => list.iter().cloned().collect(),
        None => [HTML_NAMESPACE, SVG_NAMESPACE, MATHML_NAMESPACE]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    };

    let allowed_uri = match &cfg.allowed_uri_regexp {
        None => UriPolicy::Default,
        Some(pattern) => match Regex::new(pattern) {
            Ok(re) => UriPolicy::Custom(re),
            Err(_) => UriPolicy::Disabled,
        },
    };
    // A check whose pattern fails to compile never matches, same as absent.
    let compile_check = |pattern: &Option<String>| -> Option<Regex> {
        pattern.as_deref().and_then(|p| Regex::new(p).ok())
    };

    ResolvedConfig {
        allowed_tags: AllowSet::from_set(allowed_tags),
        allowed_attributes: AllowSet::from_set(allowed_attributes),
        forbid_tags,
        forbid_attributes,
        forbid_contents,
        uri_safe_attributes,
        data_uri_tags,
        allowed_namespaces,
        allow_data_attributes: cfg.allow_data_attributes,
        allow_aria_attributes: cfg.allow_aria_attributes,
        allow_unknown_protocols: cfg.allow_unknown_protocols,
        allow_self_close_in_attributes: cfg.allow_self_close_in_attributes,
        safe_for_xml: cfg.safe_for_xml,
        safe_for_templates: cfg.safe_for_templates,
        whole_document: cfg.whole_document,
        force_body: cfg.force_body,
        keep_content: cfg.keep_content,
        sanitize_dom: cfg.sanitize_dom,
        sanitize_named_props: cfg.sanitize_named_props,
        parser_media_type: cfg.parser_media_type,
        namespace_uri: cfg.namespace_uri.clone(),
        allowed_uri,
        tag_name_check: compile_check(&cfg.custom_element_handling.tag_name_check),
        attribute_name_check: compile_check(&cfg.custom_element_handling.attribute_name_check),
        allow_customized_built_in_elements: cfg
            .custom_element_handling
            .allow_customized_built_in_elements,
    }
}
