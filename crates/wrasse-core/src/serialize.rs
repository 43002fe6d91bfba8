//! Markup output.
//!
//! The engine owns its serializer because the output carries guarantees the
//! sanitizer is responsible for: minimal deterministic escaping, HTML void
//! handling, canonical SVG camelCase re-casing, the `<isindex>` attribute
//! swap, and XML namespace re-derivation. Attribute order is parse order.

use crate::dom::{Handle, NodeData, attr_name};
use crate::generated;
use html5ever::ns;
use html5ever::namespace_url;
use rustc_hash::FxHashMap;

/// Escapes text content: `&`, `<`, `>`.
fn escape_text_into(out: &mut String, text: &str) {
    let bytes = text.as_bytes();
    let mut start = 0usize;
    for (i, &b) in bytes.iter().enumerate() {
        let esc = match b {
            b'&' => "&amp;",
            b'<' => "&lt;",
            b'>' => "&gt;",
            _ => continue,
        };
        if start < i {
            out.push_str(&text[start..i]);
        }
        out.push_str(esc);
        start = i + 1;
    }
    if start < text.len() {
        out.push_str(&text[start..]);
    }
}

/// Escapes attribute values: `&`, `<`, `>`, `"`.
fn escape_attr_into(out: &mut String, text: &str) {
    let bytes = text.as_bytes();
    let mut start = 0usize;
    for (i, &b) in bytes.iter().enumerate() {
        let esc = match b {
            b'&' => "&amp;",
            b'<' => "&lt;",
            b'>' => "&gt;",
            b'"' => "&quot;",
            _ => continue,
        };
        if start < i {
            out.push_str(&text[start..i]);
        }
        out.push_str(esc);
        start = i + 1;
    }
    if start < text.len() {
        out.push_str(&text[start..]);
    }
}

/// Serializes the children of `node` (its inner HTML/XML).
pub(crate) fn inner_markup(node: &Handle, xml: bool) -> String {
    let mut out = String::new();
    let scope = xml.then(|| XmlScope {
        default_ns: element_ns(node),
        prefixes: FxHashMap::default(),
    });
    for child in node.children() {
        write_node(&mut out, &child, xml, scope.as_ref());
    }
    out
}

/// Serializes `node` itself (its outer HTML/XML).
pub(crate) fn outer_markup(node: &Handle, xml: bool) -> String {
    let mut out = String::new();
    write_node(&mut out, node, xml, xml.then(XmlScope::default).as_ref());
    out
}

/// Serializes a whole document: optional DOCTYPE line, then every child of
/// the document node.
pub(crate) fn document_markup(doc: &Handle, xml: bool, emit_doctype: bool) -> String {
    let mut out = String::new();
    for child in doc.children() {
        match &child.data {
            NodeData::Doctype { .. } => {
                if emit_doctype {
                    write_node(&mut out, &child, xml, None);
                }
            }
            _ => write_node(&mut out, &child, xml, xml.then(XmlScope::default).as_ref()),
        }
    }
    out
}

#[derive(Debug, Clone, Default)]
struct XmlScope {
    default_ns: Option<String>,
    prefixes: FxHashMap<String, String>,
}

fn element_ns(node: &Handle) -> Option<String> {
    node.element_name().map(|n| n.ns.as_ref().to_string())
}

fn write_node(out: &mut String, node: &Handle, xml: bool, scope: Option<&XmlScope>) {
    match &node.data {
        NodeData::Document => {
            for child in node.children() {
                write_node(out, &child, xml, scope);
            }
        }
        NodeData::Doctype {
            name,
            public_id,
            system_id,
        } => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            if !public_id.is_empty() {
                out.push_str(" PUBLIC \"");
                out.push_str(public_id);
                out.push('"');
                if !system_id.is_empty() {
                    out.push_str(" \"");
                    out.push_str(system_id);
                    out.push('"');
                }
            } else if !system_id.is_empty() {
                out.push_str(" SYSTEM \"");
                out.push_str(system_id);
                out.push('"');
            }
            out.push('>');
        }
        NodeData::Text { contents } => escape_text_into(out, &contents.borrow()),
        NodeData::Data { contents } => {
            // Raw character data of script/style-like containers. XML output
            // has no raw-text elements, so it escapes.
            if xml {
                escape_text_into(out, &contents.borrow());
            } else {
                out.push_str(&contents.borrow());
            }
        }
        NodeData::Comment { contents } => {
            out.push_str("<!--");
            out.push_str(contents);
            out.push_str("-->");
        }
        NodeData::ProcessingInstruction { target, contents } => {
            out.push_str("<?");
            out.push_str(target);
            if !contents.is_empty() {
                out.push(' ');
                out.push_str(contents);
            }
            out.push('>');
        }
        NodeData::Element { .. } => {
            if xml {
                write_element_xml(out, node, scope.cloned().unwrap_or_default());
            } else {
                write_element_html(out, node);
            }
        }
    }
}

fn write_element_html(out: &mut String, node: &Handle) {
    let name = node.element_name().expect("element");
    let lower = name.local.as_ref().to_ascii_lowercase();
    let is_svg = name.ns == ns!(svg);
    let tag = if is_svg {
        generated::svg_tag_case(&lower).unwrap_or(lower.as_str())
    } else {
        lower.as_str()
    };
    let is_isindex = lower == "isindex";

    out.push('<');
    out.push_str(tag);
    for attr in node.attributes() {
        let mut attr_lower = attr_name(&attr.name).to_ascii_lowercase();
        // Legacy <isindex> serialization swaps its name/label attributes.
        if is_isindex {
            if attr_lower == "name" {
                attr_lower = "label".to_string();
            } else if attr_lower == "label" {
                attr_lower = "name".to_string();
            }
        }
        let attr_out = if is_svg {
            generated::svg_attr_case(&attr_lower).unwrap_or(attr_lower.as_str())
        } else {
            attr_lower.as_str()
        };
        out.push(' ');
        out.push_str(attr_out);
        out.push_str("=\"");
        escape_attr_into(out, &attr.value);
        out.push('"');
    }
    out.push('>');

    if !is_svg && generated::void_elements().contains(lower.as_str()) {
        return;
    }

    for child in node.children() {
        write_node(out, &child, false, None);
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn write_element_xml(out: &mut String, node: &Handle, inherited: XmlScope) {
    let name = node.element_name().expect("element");
    let ns_uri = name.ns.as_ref().to_string();
    let mut scope = inherited;

    let tag = match &name.prefix {
        Some(prefix) => format!("{}:{}", prefix, name.local),
        None => name.local.as_ref().to_string(),
    };

    out.push('<');
    out.push_str(&tag);

    match &name.prefix {
        None => {
            // Emit xmlns only where the namespace departs from context.
            if scope.default_ns.as_deref() != Some(ns_uri.as_str()) && !ns_uri.is_empty() {
                out.push_str(" xmlns=\"");
                escape_attr_into(out, &ns_uri);
                out.push('"');
                scope.default_ns = Some(ns_uri.clone());
            }
        }
        Some(prefix) => {
            let prefix = prefix.as_ref().to_string();
            if scope.prefixes.get(&prefix).map(String::as_str) != Some(ns_uri.as_str()) {
                out.push_str(" xmlns:");
                out.push_str(&prefix);
                out.push_str("=\"");
                escape_attr_into(out, &ns_uri);
                out.push('"');
                scope.prefixes.insert(prefix, ns_uri.clone());
            }
        }
    }

    for attr in node.attributes() {
        let aname = attr_name(&attr.name);
        // Namespace declarations are re-derived from the walk context.
        if aname == "xmlns" || aname.starts_with("xmlns:") {
            continue;
        }
        out.push(' ');
        out.push_str(&aname);
        out.push_str("=\"");
        escape_attr_into(out, &attr.value);
        out.push('"');
    }

    let children = node.children();
    let lower = name.local.as_ref().to_ascii_lowercase();
    let void_html = name.ns == ns!(html) && generated::void_elements().contains(lower.as_str());
    if children.is_empty() || void_html {
        out.push_str("/>");
        return;
    }

    out.push('>');
    for child in children {
        write_node(out, &child, true, Some(&scope));
    }
    out.push_str("</");
    out.push_str(&tag);
    out.push('>');
}
