use super::serial;
use crate::{SanitizerConfig, sanitize};

#[test]
fn safe_uri_schemes_survive() {
    let _guard = serial();
    let cases = [
        r#"<a href="https://example.com/">x</a>"#,
        r#"<a href="http://example.com/">x</a>"#,
        r#"<a href="mailto:a@b.c">x</a>"#,
        r#"<a href="tel:+15551234">x</a>"#,
        r#"<a href="/relative/path">x</a>"#,
        r##"<a href="#fragment">x</a>"##,
        r#"<a href="xmpp:user@host">x</a>"#,
    ];
    for case in cases {
        assert_eq!(sanitize(case, None), case, "dropped safe URI: {case}");
    }
}

#[test]
fn script_uris_are_dropped_case_insensitively() {
    let _guard = serial();
    for case in [
        r#"<a href="javascript:alert(1)">x</a>"#,
        r#"<a href="JaVaScRiPt:alert(1)">x</a>"#,
        r#"<a href="vbscript:msgbox(1)">x</a>"#,
    ] {
        assert_eq!(sanitize(case, None), "<a>x</a>", "kept unsafe URI: {case}");
    }
}

#[test]
fn entity_encoded_script_uris_are_dropped() {
    let _guard = serial();
    // The parser decodes entities in attribute values before the filter runs.
    assert_eq!(
        sanitize(r#"<a href="&#106;avascript:alert(1)">x</a>"#, None),
        "<a>x</a>"
    );
    assert_eq!(
        sanitize(r#"<a href="java&Tab;script:alert(1)">x</a>"#, None),
        "<a>x</a>"
    );
}

#[test]
fn whitespace_smuggled_schemes_are_dropped() {
    let _guard = serial();
    assert_eq!(
        sanitize("<a href=\"jav\u{00A0}ascript:alert(1)\">x</a>", None),
        "<a>x</a>"
    );
}

#[test]
fn data_uris_are_allowed_only_on_data_uri_tags() {
    let _guard = serial();
    assert_eq!(
        sanitize(r#"<img src="data:image/png;base64,AAAA">"#, None),
        r#"<img src="data:image/png;base64,AAAA">"#
    );
    assert_eq!(
        sanitize(r#"<a href="data:text/html,boom">x</a>"#, None),
        "<a>x</a>"
    );
}

#[test]
fn unknown_protocols_require_opt_in() {
    let _guard = serial();
    assert_eq!(sanitize(r#"<a href="steam://run/1">x</a>"#, None), "<a>x</a>");

    let cfg = SanitizerConfig {
        allow_unknown_protocols: true,
        ..SanitizerConfig::default()
    };
    assert_eq!(
        sanitize(r#"<a href="steam://run/1">x</a>"#, Some(&cfg)),
        r#"<a href="steam://run/1">x</a>"#
    );
    // Still never script or data.
    assert_eq!(
        sanitize(r#"<a href="javascript:alert(1)">x</a>"#, Some(&cfg)),
        "<a>x</a>"
    );
}

#[test]
fn uri_safe_attributes_skip_uri_vetting() {
    let _guard = serial();
    assert_eq!(
        sanitize(r#"<div title="javascript:alert(1)">x</div>"#, None),
        r#"<div title="javascript:alert(1)">x</div>"#
    );
}

#[test]
fn data_and_aria_attributes_follow_their_flags() {
    let _guard = serial();
    let out = sanitize(r#"<b data-x="1" aria-label="x" foo="bar">ok</b>"#, None);
    assert!(out.contains(r#"data-x="1""#));
    assert!(out.contains(r#"aria-label="x""#));
    assert!(!out.contains("foo="));

    let cfg = SanitizerConfig {
        allow_data_attributes: false,
        allow_aria_attributes: false,
        ..SanitizerConfig::default()
    };
    assert_eq!(
        sanitize(r#"<b data-x="1" aria-label="x">ok</b>"#, Some(&cfg)),
        "<b>ok</b>"
    );
}

#[test]
fn forbid_attributes_removes_even_allowed_names() {
    let _guard = serial();
    let cfg = SanitizerConfig {
        forbid_attributes: vec!["href".to_string()],
        ..SanitizerConfig::default()
    };
    assert_eq!(sanitize(r#"<a href="/x">y</a>"#, Some(&cfg)), "<a>y</a>");
}

#[test]
fn add_attributes_extends_the_allow_list() {
    let _guard = serial();
    let cfg = SanitizerConfig {
        add_attributes: vec!["onclick".to_string()],
        ..SanitizerConfig::default()
    };
    assert_eq!(
        sanitize(r#"<b onclick="alert(1)">ok</b>"#, Some(&cfg)),
        r#"<b onclick="alert(1)">ok</b>"#
    );
}

#[test]
fn clobber_prone_ids_and_names_are_rejected() {
    let _guard = serial();
    assert_eq!(sanitize(r#"<img id="cookie">"#, None), "<img>");
    assert_eq!(sanitize(r#"<input name="submit">"#, None), "<input>");
    assert_eq!(
        sanitize(r#"<img id="harmless">"#, None),
        r#"<img id="harmless">"#
    );

    let cfg = SanitizerConfig {
        sanitize_dom: false,
        ..SanitizerConfig::default()
    };
    assert_eq!(
        sanitize(r#"<img id="cookie">"#, Some(&cfg)),
        r#"<img id="cookie">"#
    );
}

#[test]
fn sanitize_named_props_prefixes_ids_and_names() {
    let _guard = serial();
    let cfg = SanitizerConfig {
        sanitize_named_props: true,
        ..SanitizerConfig::default()
    };
    assert_eq!(
        sanitize(r#"<b id="x">y</b>"#, Some(&cfg)),
        r#"<b id="user-content-x">y</b>"#
    );
}

#[test]
fn value_attribute_keeps_its_whitespace() {
    let _guard = serial();
    assert_eq!(
        sanitize(r#"<input value=" padded ">"#, None),
        r#"<input value=" padded ">"#
    );
}

#[test]
fn values_that_break_out_of_raw_text_are_dropped() {
    let _guard = serial();
    let out = sanitize(r#"<b title="</style><img src=x>">x</b>"#, None);
    assert_eq!(out, "<b>x</b>");
    let out = sanitize(r#"<b title="]>payload">x</b>"#, None);
    assert_eq!(out, "<b>x</b>");
}

#[test]
fn self_closing_values_can_be_rejected() {
    let _guard = serial();
    let cfg = SanitizerConfig {
        allow_self_close_in_attributes: false,
        ..SanitizerConfig::default()
    };
    assert_eq!(sanitize(r#"<b title="a/>b">x</b>"#, Some(&cfg)), "<b>x</b>");
}

#[test]
fn template_expressions_are_stripped_from_values() {
    let _guard = serial();
    let cfg = SanitizerConfig {
        safe_for_templates: true,
        ..SanitizerConfig::default()
    };
    let out = sanitize(r#"<a title="{{steal}}">y</a>"#, Some(&cfg));
    assert!(!out.contains("{{"), "unexpected: {out}");
}

#[test]
fn dropped_is_attribute_is_pinned_empty() {
    let _guard = serial();
    let out = sanitize(r#"<button is="my-button">x</button>"#, None);
    assert_eq!(out, r#"<button is="">x</button>"#);
}

#[test]
fn attribute_order_is_parse_order() {
    let _guard = serial();
    assert_eq!(
        sanitize(r#"<img width="1" src="x" height="2">"#, None),
        r#"<img width="1" src="x" height="2">"#
    );
}
