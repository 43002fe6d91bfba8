use super::serial;
use crate::{SanitizerConfig, sanitize};

#[test]
fn void_elements_have_no_close_tag() {
    let _guard = serial();
    assert_eq!(sanitize("<br>", None), "<br>");
    assert_eq!(sanitize("<hr><wbr>", None), "<hr><wbr>");
    assert_eq!(
        sanitize(r#"<img src="x"><b>y</b>"#, None),
        r#"<img src="x"><b>y</b>"#
    );
}

#[test]
fn svg_names_serialize_in_canonical_camel_case() {
    let _guard = serial();
    assert_eq!(
        sanitize(r#"<svg viewBox="0 0 5 5"></svg>"#, None),
        r#"<svg viewBox="0 0 5 5"></svg>"#
    );
    // Lowercased input is re-cased from the canonical table.
    assert_eq!(
        sanitize(r#"<svg vieWbOx="0 0 5 5"></svg>"#, None),
        r#"<svg viewBox="0 0 5 5"></svg>"#
    );
    let out = sanitize(
        "<svg><lineargradient id=\"g\"></lineargradient></svg>",
        None,
    );
    assert_eq!(out, r#"<svg><linearGradient id="g"></linearGradient></svg>"#);
}

#[test]
fn attribute_values_are_escaped() {
    let _guard = serial();
    assert_eq!(
        sanitize(r#"<b title='a"b<c'>x</b>"#, None),
        r#"<b title="a&quot;b&lt;c">x</b>"#
    );
}

#[test]
fn text_is_escaped_with_the_three_char_set() {
    let _guard = serial();
    assert_eq!(sanitize("a &lt; b &amp;&amp; c", None), "a &lt; b &amp;&amp; c");
    assert_eq!(sanitize("1 < 2", None), "1 &lt; 2");
    assert_eq!(sanitize(r#"say "hi""#, None), r#"say "hi""#);
}

#[test]
fn raw_text_containers_serialize_unescaped() {
    let _guard = serial();
    assert_eq!(
        sanitize("<style>a > b { color: red }</style>", None),
        "<style>a > b { color: red }</style>"
    );
}

#[test]
fn isindex_serialization_swaps_name_and_label() {
    let _guard = serial();
    let cfg = SanitizerConfig {
        add_tags: vec!["isindex".to_string()],
        ..SanitizerConfig::default()
    };
    assert_eq!(
        sanitize(r#"<isindex name="a" label="b">x</isindex>"#, Some(&cfg)),
        r#"<isindex label="a" name="b">x</isindex>"#
    );
}

#[test]
fn templates_serialize_their_contents() {
    let _guard = serial();
    assert_eq!(
        sanitize("<template><b>x</b></template>", None),
        "<template><b>x</b></template>"
    );
}
