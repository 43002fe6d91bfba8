//! Per-attribute keep/drop decisions for a kept element.

use super::{Removed, Sanitizer, strip_template_expressions};
use crate::config::UriPolicy;
use crate::dom::{Handle, attr_name};
use crate::generated;
use crate::hooks::{HookEvent, HookPhase};
use regex::Regex;
use std::sync::OnceLock;

macro_rules! cached_regex {
    ($fn_name:ident, $pat:literal) => {
        fn $fn_name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pat).expect("builtin regex must compile"))
        }
    };
}

cached_regex!(re_data_attr, r"^data-[\-\w.\u{00B7}-\u{FFFF}]+$");
cached_regex!(re_aria_attr, r"^aria-[\-\w]+$");
cached_regex!(re_is_script_or_data, r"(?i)^(?:\w+script|data):");
cached_regex!(
    re_allowed_uri,
    r"(?i)^(?:(?:(?:f|ht)tps?|mailto|tel|callto|sms|cid|xmpp|matrix):|[^a-z]|[a-z+.\-]+(?:[^a-z+.\-:]|$))"
);
// Attribute values able to close a surrounding comment/CDATA or raw-text
// container on a second parse.
cached_regex!(
    re_unsafe_xml_value,
    r"(?i)((--!?|\])>)|</(style|title|textarea)"
);

/// The whitespace class stripped around and inside attribute values before
/// URI checks.
fn is_attr_whitespace(c: char) -> bool {
    matches!(c,
        '\u{0000}'..='\u{0020}'
            | '\u{00A0}'
            | '\u{1680}'
            | '\u{180E}'
            | '\u{2000}'..='\u{2029}'
            | '\u{205F}'
            | '\u{3000}')
}

fn trim_attr_value(value: &str) -> &str {
    value.trim_matches(is_attr_whitespace)
}

fn strip_attr_whitespace(value: &str) -> String {
    value.chars().filter(|c| !is_attr_whitespace(*c)).collect()
}

pub(crate) fn sanitize_attributes(s: &mut Sanitizer<'_>, el: &Handle, tag: &str) {
    let snapshot = el.attributes();
    let has_upon_hook = s.hooks.has(HookPhase::UponSanitizeAttribute);
    let mut dropped_is = false;

    for attr in snapshot {
        let original_name = attr_name(&attr.name);
        let name = s.transform_name(&original_name);
        // `value` keeps its whitespace; everything else is trimmed.
        let mut value = if name == "value" {
            attr.value.to_string()
        } else {
            trim_attr_value(&attr.value).to_string()
        };

        let drop_attr = |s: &mut Sanitizer<'_>, dropped_is: &mut bool| {
            el.remove_attribute(&original_name);
            s.record(Removed::Attribute {
                name: name.clone(),
                from_node_name: tag.to_string(),
            });
            if name == "is" {
                *dropped_is = true;
            }
        };

        if has_upon_hook {
            let mut event =
                HookEvent::for_attribute(&name, &value, s.cfg.allowed_attributes.clone());
            s.hooks
                .fire(HookPhase::UponSanitizeAttribute, el, Some(&mut event));
            if let Some(hook_value) = event.attr_value {
                value = hook_value;
            }
            if event.force_keep_attr == Some(true) {
                write_back(el, &original_name, &attr.value, &value);
                continue;
            }
            if !event.keep_attr {
                drop_attr(s, &mut dropped_is);
                continue;
            }
        }

        if s.cfg.sanitize_named_props && (name == "id" || name == "name") {
            value = format!("user-content-{value}");
        }

        // SVG animation can alias one attribute onto another; an animated
        // `href` is a script vector.
        if name == "attributename" && value.to_ascii_lowercase().contains("href") {
            drop_attr(s, &mut dropped_is);
            continue;
        }

        if !s.cfg.allow_self_close_in_attributes && value.contains("/>") {
            drop_attr(s, &mut dropped_is);
            continue;
        }

        if s.cfg.safe_for_xml && re_unsafe_xml_value().is_match(&value) {
            drop_attr(s, &mut dropped_is);
            continue;
        }

        if s.cfg.safe_for_templates {
            value = strip_template_expressions(&value);
        }

        if !is_valid_attribute(s, tag, &name, &value) {
            drop_attr(s, &mut dropped_is);
            continue;
        }

        write_back(el, &original_name, &attr.value, &value);
    }

    if dropped_is {
        el.set_attribute("is", "");
    }
}

fn write_back(el: &Handle, name: &str, original_value: &str, value: &str) {
    if original_value != value {
        el.set_attribute(name, value);
    }
}

/// The ordered validity chain: clobber guard, data-/aria- allowances, the
/// allow list (with the custom-element escape hatches), URI-safe names, then
/// URI vetting.
fn is_valid_attribute(s: &Sanitizer<'_>, tag: &str, name: &str, value: &str) -> bool {
    let cfg = s.cfg;

    if cfg.sanitize_dom
        && (name == "id" || name == "name")
        && generated::clobber_prone_props().contains(value)
    {
        return false;
    }

    if cfg.allow_data_attributes
        && !cfg.safe_for_templates
        && !cfg.forbid_attributes.contains(name)
        && re_data_attr().is_match(name)
    {
        return true;
    }

    if cfg.allow_aria_attributes && re_aria_attr().is_match(name) {
        return true;
    }

    if !cfg.allowed_attributes.contains(name) || cfg.forbid_attributes.contains(name) {
        let custom_attr = Sanitizer::is_basic_custom_element(tag)
            && cfg
                .attribute_name_check
                .as_ref()
                .is_some_and(|re| re.is_match(name));
        let customized_built_in = name == "is"
            && cfg.allow_customized_built_in_elements
            && cfg
                .tag_name_check
                .as_ref()
                .is_some_and(|re| re.is_match(value));
        if !custom_attr && !customized_built_in {
            return false;
        }
    }

    if cfg.uri_safe_attributes.contains(name) {
        return true;
    }

    if value.is_empty() {
        return true;
    }

    let stripped = strip_attr_whitespace(value);

    if matches!(name, "src" | "xlink:href" | "href")
        && tag != "script"
        && stripped.starts_with("data:")
        && cfg.data_uri_tags.contains(tag)
    {
        return true;
    }

    if allowed_uri(cfg, &stripped) {
        return true;
    }

    if cfg.allow_unknown_protocols && !re_is_script_or_data().is_match(&stripped) {
        return true;
    }

    false
}

fn allowed_uri(cfg: &crate::config::ResolvedConfig, stripped: &str) -> bool {
    match &cfg.allowed_uri {
        UriPolicy::Custom(re) => re.is_match(stripped),
        UriPolicy::Disabled => false,
        UriPolicy::Default => {
            if stripped.is_ascii() {
                default_uri_allowed_ascii(stripped)
            } else {
                re_allowed_uri().is_match(stripped)
            }
        }
    }
}

/// Fast path equivalent of the default allowed-URI pattern for ASCII input:
/// a recognized scheme before the first `:`, or no scheme at all.
fn default_uri_allowed_ascii(value: &str) -> bool {
    let bytes = value.as_bytes();
    let Some(&first) = bytes.first() else {
        return true;
    };
    if !first.is_ascii_alphabetic() {
        return true;
    }
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'a'..=b'z' | b'A'..=b'Z' | b'+' | b'.' | b'-' => i += 1,
            _ => break,
        }
    }
    if i >= bytes.len() || bytes[i] != b':' {
        // No scheme delimiter: relative URL or plain text.
        return true;
    }
    let scheme = value[..i].to_ascii_lowercase();
    matches!(
        scheme.as_str(),
        "ftp" | "ftps" | "http" | "https" | "mailto" | "tel" | "callto" | "sms" | "cid" | "xmpp"
            | "matrix"
    )
}
