//! Per-element namespace tracking.
//!
//! HTML mode derives each element's namespace from its parent's namespace and
//! tag via the foreign-content transition rules; XHTML mode inherits through
//! `xmlns`/`xmlns:prefix` declarations. The sanitizer keys the results by
//! element identity in a per-call side table and validates every kept element
//! against the namespace legality rules before it survives.

use crate::config::ResolvedConfig;
use crate::dom::{Handle, NodeData, attr_name};
use crate::generated;
use rustc_hash::FxHashMap;

pub const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
pub const MATHML_NAMESPACE: &str = "http://www.w3.org/1998/Math/MathML";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Namespace {
    Html,
    Svg,
    MathMl,
    Custom(String),
}

impl Namespace {
    pub fn uri(&self) -> &str {
        match self {
            Namespace::Html => HTML_NAMESPACE,
            Namespace::Svg => SVG_NAMESPACE,
            Namespace::MathMl => MATHML_NAMESPACE,
            Namespace::Custom(uri) => uri,
        }
    }

    pub fn from_uri(uri: &str) -> Namespace {
        match uri {
            HTML_NAMESPACE => Namespace::Html,
            SVG_NAMESPACE => Namespace::Svg,
            MATHML_NAMESPACE => Namespace::MathMl,
            other => Namespace::Custom(other.to_string()),
        }
    }
}

/// HTML-mode namespace transition for a child tag under a parent.
///
/// Custom roots behave like HTML: an HTML parser does not honor `xmlns` on
/// foreign elements, so descendants of a custom-namespace root re-enter the
/// HTML rules.
pub(crate) fn html_transition(parent_ns: &Namespace, parent_tag: &str, tag: &str) -> Namespace {
    match parent_ns {
        Namespace::Html | Namespace::Custom(_) => match tag {
            "svg" => Namespace::Svg,
            "math" => Namespace::MathMl,
            _ => Namespace::Html,
        },
        Namespace::Svg => {
            if tag == "math" && generated::html_integration_points().contains(parent_tag) {
                Namespace::MathMl
            } else {
                Namespace::Svg
            }
        }
        Namespace::MathMl => {
            if generated::mathml_text_integration_points().contains(parent_tag) {
                match tag {
                    "svg" => Namespace::Svg,
                    "math" => Namespace::MathMl,
                    _ => {
                        if parent_tag == "mi" && generated::all_mathml_tags_lower().contains(tag) {
                            Namespace::MathMl
                        } else {
                            Namespace::Html
                        }
                    }
                }
            } else if parent_tag == "annotation-xml" && tag == "svg" {
                Namespace::Svg
            } else {
                Namespace::MathMl
            }
        }
    }
}

/// Namespace legality for a kept element. The namespace URI must be allowed
/// by the configuration, and the parent/child pair must obey the
/// foreign-content rules: an SVG subtree roots only at a literal `svg` from
/// HTML, MathML only at `math`, and HTML inside foreign content only under an
/// integration point.
pub(crate) fn check_valid_namespace(
    cfg: &ResolvedConfig,
    element_ns: &Namespace,
    parent_ns: &Namespace,
    parent_tag: &str,
    tag: &str,
) -> bool {
    if !cfg.allowed_namespaces.contains(element_ns.uri()) {
        return false;
    }

    match element_ns {
        Namespace::Svg => match parent_ns {
            Namespace::Html => tag == "svg",
            Namespace::MathMl => {
                tag == "svg"
                    && (parent_tag == "annotation-xml"
                        || generated::mathml_text_integration_points().contains(parent_tag))
            }
            _ => generated::all_svg_tags_lower().contains(tag),
        },
        Namespace::MathMl => match parent_ns {
            Namespace::Html => tag == "math",
            Namespace::Svg => {
                tag == "math" && generated::html_integration_points().contains(parent_tag)
            }
            _ => generated::all_mathml_tags_lower().contains(tag),
        },
        Namespace::Html => {
            if matches!(parent_ns, Namespace::Svg)
                && !generated::html_integration_points().contains(parent_tag)
            {
                return false;
            }
            if matches!(parent_ns, Namespace::MathMl)
                && !generated::mathml_text_integration_points().contains(parent_tag)
            {
                return false;
            }
            !generated::all_mathml_tags_lower().contains(tag)
                && (generated::common_svg_and_html_elements().contains(tag)
                    || !generated::all_svg_tags_lower().contains(tag))
        }
        Namespace::Custom(uri) => {
            // Only reachable when the caller allow-listed the URI; anything
            // beyond the three standard namespaces is an XHTML-only affair.
            cfg.is_xhtml() && cfg.allowed_namespaces.contains(uri.as_str())
        }
    }
}

/// XML-mode namespace scope: the in-scope default namespace and prefix map.
#[derive(Debug, Clone, Default)]
pub(crate) struct XmlNsScope {
    pub default_ns: Option<String>,
    pub prefixes: FxHashMap<String, String>,
}

impl XmlNsScope {
    /// Child scope for an element: applies its `xmlns` / `xmlns:prefix`
    /// declarations on top of the inherited scope.
    pub fn descend(&self, element: &Handle) -> XmlNsScope {
        let mut scope = self.clone();
        if let NodeData::Element { attrs, .. } = &element.data {
            for attr in attrs.borrow().iter() {
                let name = attr_name(&attr.name);
                if name == "xmlns" {
                    scope.default_ns = Some(attr.value.to_string());
                } else if let Some(prefix) = name.strip_prefix("xmlns:") {
                    scope
                        .prefixes
                        .insert(prefix.to_string(), attr.value.to_string());
                }
            }
        }
        scope
    }

    /// Namespace of an element under this scope (after `descend`).
    pub fn namespace_of(&self, element: &Handle) -> Namespace {
        let Some(name) = element.element_name() else {
            return Namespace::Html;
        };
        if let Some(prefix) = &name.prefix {
            if let Some(uri) = self.prefixes.get(prefix.as_ref()) {
                return Namespace::from_uri(uri);
            }
        } else if !name.ns.is_empty() {
            // xml5ever resolves declarations it saw while parsing; prefer its
            // answer when present so re-parented subtrees stay accurate.
            return Namespace::from_uri(name.ns.as_ref());
        }
        match &self.default_ns {
            Some(uri) => Namespace::from_uri(uri),
            None => Namespace::Html,
        }
    }
}
