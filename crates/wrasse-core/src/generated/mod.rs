use rustc_hash::FxHashSet;
use std::sync::OnceLock;

pub mod defaults;

fn set_of(parts: &[&[&'static str]]) -> FxHashSet<&'static str> {
    parts.iter().flat_map(|s| s.iter().copied()).collect()
}

/// Default allowed tags: HTML + SVG + SVG filter primitives + MathML + `#text`.
pub fn default_allowed_tags() -> &'static FxHashSet<&'static str> {
    static SET: OnceLock<FxHashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| {
        set_of(&[
            defaults::HTML_TAGS,
            defaults::SVG_TAGS,
            defaults::SVG_FILTER_TAGS,
            defaults::MATHML_TAGS,
            defaults::TEXT_TAGS,
        ])
    })
}

/// Default allowed attributes: HTML + SVG + MathML + XML.
pub fn default_allowed_attributes() -> &'static FxHashSet<&'static str> {
    static SET: OnceLock<FxHashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| {
        set_of(&[
            defaults::HTML_ATTRS,
            defaults::SVG_ATTRS,
            defaults::MATHML_ATTRS,
            defaults::XML_ATTRS,
        ])
    })
}

pub fn default_uri_safe_attributes() -> &'static FxHashSet<&'static str> {
    static SET: OnceLock<FxHashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| set_of(&[defaults::URI_SAFE_ATTRIBUTES]))
}

pub fn default_data_uri_tags() -> &'static FxHashSet<&'static str> {
    static SET: OnceLock<FxHashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| set_of(&[defaults::DATA_URI_TAGS]))
}

pub fn default_forbid_contents() -> &'static FxHashSet<&'static str> {
    static SET: OnceLock<FxHashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| set_of(&[defaults::FORBID_CONTENTS]))
}

/// The full SVG element universe (allowed + filters + deliberately
/// disallowed), lowercased. Used by the namespace validity rules, which
/// compare against lowercased tag names in every parser mode.
pub fn all_svg_tags_lower() -> &'static FxHashSet<String> {
    static SET: OnceLock<FxHashSet<String>> = OnceLock::new();
    SET.get_or_init(|| {
        defaults::SVG_TAGS
            .iter()
            .chain(defaults::SVG_FILTER_TAGS)
            .chain(defaults::SVG_DISALLOWED_TAGS)
            .map(|t| t.to_ascii_lowercase())
            .collect()
    })
}

/// The full MathML element universe (allowed + disallowed), lowercased.
pub fn all_mathml_tags_lower() -> &'static FxHashSet<String> {
    static SET: OnceLock<FxHashSet<String>> = OnceLock::new();
    SET.get_or_init(|| {
        defaults::MATHML_TAGS
            .iter()
            .chain(defaults::MATHML_DISALLOWED_TAGS)
            .map(|t| t.to_ascii_lowercase())
            .collect()
    })
}

pub fn clobber_prone_props() -> &'static FxHashSet<&'static str> {
    static SET: OnceLock<FxHashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| set_of(&[defaults::CLOBBER_PRONE_PROPS]))
}

pub fn html_integration_points() -> &'static FxHashSet<&'static str> {
    static SET: OnceLock<FxHashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| set_of(&[defaults::HTML_INTEGRATION_POINTS]))
}

pub fn mathml_text_integration_points() -> &'static FxHashSet<&'static str> {
    static SET: OnceLock<FxHashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| set_of(&[defaults::MATHML_TEXT_INTEGRATION_POINTS]))
}

pub fn common_svg_and_html_elements() -> &'static FxHashSet<&'static str> {
    static SET: OnceLock<FxHashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| set_of(&[defaults::COMMON_SVG_AND_HTML_ELEMENTS]))
}

pub fn void_elements() -> &'static FxHashSet<&'static str> {
    static SET: OnceLock<FxHashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| set_of(&[defaults::VOID_ELEMENTS]))
}

pub fn raw_text_containers() -> &'static FxHashSet<&'static str> {
    static SET: OnceLock<FxHashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| set_of(&[defaults::RAW_TEXT_CONTAINERS]))
}

/// Canonical SVG camelCase for tag names, keyed by the lowercased form.
pub fn svg_tag_case(lower: &str) -> Option<&'static str> {
    static MAP: OnceLock<rustc_hash::FxHashMap<&'static str, &'static str>> = OnceLock::new();
    MAP.get_or_init(|| defaults::SVG_TAG_CASE.iter().copied().collect())
        .get(lower)
        .copied()
}

/// Canonical SVG camelCase for attribute names, keyed by the lowercased form.
pub fn svg_attr_case(lower: &str) -> Option<&'static str> {
    static MAP: OnceLock<rustc_hash::FxHashMap<&'static str, &'static str>> = OnceLock::new();
    MAP.get_or_init(|| defaults::SVG_ATTR_CASE.iter().copied().collect())
        .get(lower)
        .copied()
}
