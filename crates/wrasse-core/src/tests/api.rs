use super::serial;
use crate::{
    Error, Removed, SanitizerConfig, clear_config, removed, sanitize, sanitize_and_get_removed,
    sanitize_in_place, sanitize_to_document, sanitize_to_document_tree, sanitize_to_dom,
    sanitize_to_fragment, set_config,
};
use crate::dom::{self, sink};
use std::rc::Rc;

#[test]
fn strips_event_handler_attributes() {
    let _guard = serial();
    assert_eq!(
        sanitize("<img src=x onerror=alert(1)>", None),
        r#"<img src="x">"#
    );
}

#[test]
fn strips_javascript_urls() {
    let _guard = serial();
    assert_eq!(
        sanitize(r#"<a href="javascript:alert(1)">x</a>"#, None),
        "<a>x</a>"
    );
}

#[test]
fn drops_script_but_keeps_surrounding_text() {
    let _guard = serial();
    assert_eq!(sanitize("<script>alert(1)</script>hello", None), "hello");
}

#[test]
fn unwraps_unknown_elements() {
    let _guard = serial();
    assert_eq!(sanitize("<foobar>abc</foobar>", None), "abc");
}

#[test]
fn empty_input_returns_empty() {
    let _guard = serial();
    assert_eq!(sanitize("", None), "");
    assert_eq!(sanitize_to_dom("", None), "");
    assert_eq!(sanitize_to_fragment("", None).html, "");
}

#[test]
fn string_list_input_is_joined_with_commas() {
    let _guard = serial();
    let parts = vec!["<b>a</b>".to_string(), "<i>b</i>".to_string()];
    assert_eq!(sanitize(parts, None), "<b>a</b>,<i>b</i>");
}

#[test]
fn leading_whitespace_is_preserved() {
    let _guard = serial();
    assert_eq!(sanitize("  \n<b>x</b>", None), "  \n<b>x</b>");
}

#[test]
fn force_body_keeps_head_only_elements_in_the_fragment() {
    let _guard = serial();
    let cfg = SanitizerConfig {
        force_body: true,
        ..SanitizerConfig::default()
    };
    let out = sanitize("<style>.a{color:red}</style>x", Some(&cfg));
    assert_eq!(out, "<style>.a{color:red}</style>x");
    assert!(!out.contains("remove"));
}

#[test]
fn whole_document_parsing_hoists_head_elements_out_of_body() {
    let _guard = serial();
    let cfg = SanitizerConfig {
        whole_document: true,
        ..SanitizerConfig::default()
    };
    assert_eq!(
        sanitize("<style>.a{}</style>x", Some(&cfg)),
        "<html><head><style>.a{}</style></head><body>x</body></html>"
    );
}

#[test]
fn sanitization_is_idempotent_under_defaults() {
    let _guard = serial();
    let inputs = [
        "<img src=x onerror=alert(1)>",
        r#"<a href="javascript:alert(1)">x</a>"#,
        "<foobar>abc</foobar>",
        "<b><i>nested</i> text</b>",
        "<svg><path d=\"M0 0\"></path></svg>",
        "plain text & entities <",
    ];
    for input in inputs {
        let once = sanitize(input, None);
        let twice = sanitize(once.as_str(), None);
        assert_eq!(once, twice, "not idempotent for {input:?}");
    }
}

#[test]
fn removed_log_counts_match_removals() {
    let _guard = serial();
    let out = sanitize_and_get_removed("<script>alert(1)</script><div>x</div>", None);
    assert_eq!(out.sanitized, "<div>x</div>");
    assert_eq!(out.removed.len(), 1);
    assert_eq!(
        out.removed[0],
        Removed::Element {
            node_name: "script".to_string()
        }
    );

    let out = sanitize_and_get_removed(r#"<a href="javascript:alert(1)">x</a>"#, None);
    assert_eq!(out.removed.len(), 1);
    assert_eq!(
        out.removed[0],
        Removed::Attribute {
            name: "href".to_string(),
            from_node_name: "a".to_string()
        }
    );

    let out = sanitize_and_get_removed("<!--boom-->", None);
    assert_eq!(out.sanitized, "");
    assert_eq!(out.removed.len(), 1);
    assert_eq!(
        out.removed[0],
        Removed::Element {
            node_name: "#comment".to_string()
        }
    );
}

#[test]
fn removed_log_is_readable_after_the_call() {
    let _guard = serial();
    sanitize("<script>x</script>ok", None);
    let log = removed();
    assert_eq!(log.len(), 1);

    // And reset by the next call.
    sanitize("fine", None);
    assert!(removed().is_empty());
}

#[test]
fn fragment_output_exposes_leading_text() {
    let _guard = serial();
    let out = sanitize_to_fragment("hello<b>x</b>", None);
    assert_eq!(out.html, "hello<b>x</b>");
    assert_eq!(out.first_child_node_value.as_deref(), Some("hello"));

    let out = sanitize_to_fragment("<b>x</b>", None);
    assert_eq!(out.first_child_node_value, None);
}

#[test]
fn to_dom_returns_outer_serialization_of_the_root() {
    let _guard = serial();
    assert_eq!(
        sanitize_to_dom("<b>x</b>", None),
        "<body><b>x</b></body>"
    );
}

#[test]
fn to_document_returns_full_document_strings() {
    let _guard = serial();
    let out = sanitize_to_document("<b>x</b>", None);
    assert_eq!(out.html, "<html><head></head><body><b>x</b></body></html>");
    assert_eq!(out.head_html.as_deref(), Some("<head></head>"));
    assert_eq!(out.body_html.as_deref(), Some("<body><b>x</b></body>"));
}

#[test]
fn to_document_tree_returns_a_mutable_tree() {
    let _guard = serial();
    let doc = sanitize_to_document_tree("<div id=\"a\">x</div>", None);
    let html = dom::find_element(&doc, "html").expect("html");
    let body = dom::find_element(&html, "body").expect("body");
    let div = body.first_child().expect("div");
    assert_eq!(div.tag_lower().as_deref(), Some("div"));
    assert_eq!(div.get_attribute("id").as_deref(), Some("a"));

    div.set_attribute("id", "b");
    assert_eq!(div.get_attribute("id").as_deref(), Some("b"));
}

#[test]
fn whole_document_serializes_the_document_element() {
    let _guard = serial();
    let cfg = SanitizerConfig {
        whole_document: true,
        ..SanitizerConfig::default()
    };
    assert_eq!(
        sanitize("<b>x</b>", Some(&cfg)),
        "<html><head></head><body><b>x</b></body></html>"
    );
}

#[test]
fn doctype_is_emitted_only_when_allowed() {
    let _guard = serial();
    let cfg = SanitizerConfig {
        whole_document: true,
        ..SanitizerConfig::default()
    };
    let out = sanitize("<!DOCTYPE html><p>x</p>", Some(&cfg));
    assert!(out.starts_with("<html>"), "unexpected: {out}");

    let cfg = SanitizerConfig {
        whole_document: true,
        add_tags: vec!["!doctype".to_string()],
        ..SanitizerConfig::default()
    };
    let out = sanitize("<!DOCTYPE html><p>x</p>", Some(&cfg));
    assert!(out.starts_with("<!DOCTYPE html><html>"), "unexpected: {out}");
}

#[test]
fn node_input_sanitizes_a_clone_and_leaves_the_original_alone() {
    let _guard = serial();
    let doc = sink::parse_html_document(r#"<div onclick="alert(1)"><b>x</b></div>"#);
    let html = dom::find_element(&doc, "html").unwrap();
    let body = dom::find_element(&html, "body").unwrap();
    let div = body.first_child().unwrap();

    let out = sanitize(&div, None);
    assert_eq!(out, "<div><b>x</b></div>");
    // The caller's tree is untouched.
    assert_eq!(div.get_attribute("onclick").as_deref(), Some("alert(1)"));
}

#[test]
fn in_place_sanitizes_and_returns_the_same_element() {
    let _guard = serial();
    let doc = sink::parse_html_document(r#"<div onclick="alert(1)"><span>x</span></div>"#);
    let html = dom::find_element(&doc, "html").unwrap();
    let body = dom::find_element(&html, "body").unwrap();
    let div = body.first_child().unwrap();

    let returned = sanitize_in_place(&div, None).expect("kept root");
    assert!(Rc::ptr_eq(&returned, &div));
    assert_eq!(div.get_attribute("onclick"), None);
    assert_eq!(div.children().len(), 1);
}

#[test]
fn in_place_rejects_a_forbidden_root_without_mutating_it() {
    let _guard = serial();
    let doc = sink::parse_html_document("<script>alert(1)</script>");
    let html = dom::find_element(&doc, "html").unwrap();
    let head = dom::find_element(&html, "head").unwrap();
    let script = head.first_child().expect("script");
    assert_eq!(script.tag_lower().as_deref(), Some("script"));

    let err = sanitize_in_place(&script, None).unwrap_err();
    match err {
        Error::ForbiddenRootNode { tag_name } => assert_eq!(tag_name, "script"),
    }
    // Untouched: the payload is still there.
    assert_eq!(script.text_content(), "alert(1)");
}

#[test]
fn persistent_config_overrides_per_call_config() {
    let _guard = serial();
    set_config(SanitizerConfig {
        forbid_tags: vec!["b".to_string()],
        ..SanitizerConfig::default()
    });
    // The per-call argument is ignored while a persistent config is set.
    let permissive = SanitizerConfig::default();
    assert_eq!(sanitize("<b>x</b>", Some(&permissive)), "x");

    clear_config();
    assert_eq!(sanitize("<b>x</b>", Some(&permissive)), "<b>x</b>");
}

#[test]
fn unbalanced_markup_is_closed_by_the_parser() {
    let _guard = serial();
    assert_eq!(sanitize("<b>unclosed", None), "<b>unclosed</b>");
    assert_eq!(sanitize("stray</b>close", None), "strayclose");
}
