//! String-phase preparation applied before the input reaches a parser.
//!
//! The HTML parser drops leading whitespace before `<body>` content and
//! hoists head-only elements (`<style>`, `<title>`, …) out of the fragment.
//! `force_body` counters the hoisting with a sentinel element that is removed
//! from the parsed body afterwards; without it, leading whitespace is
//! captured here and re-inserted as the body's first text node.
//!
//! XHTML and custom-namespace inputs are wrapped so the XML parser sees a
//! single well-formed document element.

use crate::namespace::HTML_NAMESPACE;
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

cached_regex!(re_leading_whitespace, r"^[\r\n\t ]+");

/// The sentinel `force_body` prepends; always removed after parsing.
pub(crate) const FORCE_BODY_SENTINEL: &str = "<remove></remove>";
pub(crate) const FORCE_BODY_SENTINEL_TAG: &str = "remove";

pub(crate) struct PreparedInput {
    pub markup: String,
    /// Captured leading ASCII whitespace to restore as a leading text node.
    pub leading_whitespace: Option<String>,
}

pub(crate) fn prepare_html(input: &str, force_body: bool) -> PreparedInput {
    if force_body {
        return PreparedInput {
            markup: format!("{FORCE_BODY_SENTINEL}{input}"),
            leading_whitespace: None,
        };
    }
    let leading_whitespace = re_leading_whitespace()
        .find(input)
        .map(|m| m.as_str().to_string());
    PreparedInput {
        markup: input.to_string(),
        leading_whitespace,
    }
}

/// Wraps an XHTML-mode input for the XML parser. The HTML namespace gets the
/// document shell the sanitizer expects a body in; any other namespace is
/// parsed inside a `<template>` envelope that becomes the sanitization root.
pub(crate) fn wrap_xml(input: &str, namespace_uri: &str) -> String {
    if namespace_uri == HTML_NAMESPACE {
        format!("<html xmlns=\"{namespace_uri}\"><head></head><body>{input}</body></html>")
    } else {
        format!("<template xmlns=\"{namespace_uri}\">{input}</template>")
    }
}
