//! The shared `TreeSink` implementation both parser collaborators build
//! through, plus the two parse entry points. html5ever and xml5ever drive the
//! same interface, so one sink serves HTML and XHTML inputs alike.

use super::{Handle, Node, NodeData};
use crate::generated;
use html5ever::QualName;
use html5ever::driver::ParseOpts;
use html5ever::interface::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{Attribute, LocalName, ns, namespace_url};
use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub struct Sink {
    document: Handle,
    quirks_mode: Cell<QuirksMode>,
}

impl Sink {
    pub fn new() -> Self {
        Sink {
            document: Node::new_document(),
            quirks_mode: Cell::new(QuirksMode::NoQuirks),
        }
    }

    /// Raw-text container check: character data appended under one of these
    /// HTML elements becomes a `Data` node instead of `Text`.
    fn is_raw_text_container(parent: &Handle) -> bool {
        match &parent.data {
            NodeData::Element { name, .. } => {
                name.ns == ns!(html)
                    && generated::raw_text_containers()
                        .contains(name.local.as_ref().to_ascii_lowercase().as_str())
            }
            _ => false,
        }
    }

    fn new_character_node(parent: &Handle, text: StrTendril) -> Handle {
        let contents = RefCell::new(text.to_string());
        if Self::is_raw_text_container(parent) {
            Node::new(NodeData::Data { contents })
        } else {
            Node::new(NodeData::Text { contents })
        }
    }

    /// Appends a node or merges character data into an adjacent text node,
    /// the same discipline the reference arena sink uses.
    fn append_common<P, A>(&self, parent: &Handle, child: NodeOrText<Handle>, previous: P, append: A)
    where
        P: FnOnce() -> Option<Handle>,
        A: FnOnce(Handle),
    {
        let new_node = match child {
            NodeOrText::AppendText(text) => {
                if let Some(prev) = previous() {
                    match &prev.data {
                        NodeData::Text { contents } | NodeData::Data { contents } => {
                            contents.borrow_mut().push_str(&text);
                            return;
                        }
                        _ => {}
                    }
                }
                Self::new_character_node(parent, text)
            }
            NodeOrText::AppendNode(node) => node,
        };
        append(new_node);
    }
}

impl TreeSink for Sink {
    type Handle = Handle;
    type Output = Handle;
    type ElemName<'a>
        = &'a QualName
    where
        Self: 'a;

    fn finish(self) -> Handle {
        self.document
    }

    fn parse_error(&self, _msg: Cow<'static, str>) {}

    fn get_document(&self) -> Handle {
        self.document.clone()
    }

    fn set_quirks_mode(&self, mode: QuirksMode) {
        self.quirks_mode.set(mode);
    }

    fn same_node(&self, x: &Handle, y: &Handle) -> bool {
        Rc::ptr_eq(x, y)
    }

    fn elem_name<'a>(&'a self, target: &'a Handle) -> Self::ElemName<'a> {
        target.element_name().expect("not an element")
    }

    fn create_element(&self, name: QualName, attrs: Vec<Attribute>, flags: ElementFlags) -> Handle {
        Node::new(NodeData::Element {
            name,
            attrs: RefCell::new(attrs),
            template_contents: RefCell::new(if flags.template {
                Some(Node::new_document())
            } else {
                None
            }),
            mathml_annotation_xml_integration_point: flags
                .mathml_annotation_xml_integration_point,
        })
    }

    fn create_comment(&self, text: StrTendril) -> Handle {
        Node::new(NodeData::Comment {
            contents: text.to_string(),
        })
    }

    fn create_pi(&self, target: StrTendril, data: StrTendril) -> Handle {
        Node::new(NodeData::ProcessingInstruction {
            target: target.to_string(),
            contents: data.to_string(),
        })
    }

    fn append(&self, parent: &Handle, child: NodeOrText<Handle>) {
        self.append_common(
            parent,
            child,
            || parent.children.borrow().last().cloned(),
            |new_node| parent.append_child(&new_node),
        );
    }

    fn append_before_sibling(&self, sibling: &Handle, child: NodeOrText<Handle>) {
        let parent = sibling.parent().expect("sibling has no parent");
        self.append_common(
            &parent,
            child,
            || sibling.prev_sibling(),
            |new_node| sibling.insert_before(&new_node),
        );
    }

    fn append_based_on_parent_node(
        &self,
        element: &Handle,
        prev_element: &Handle,
        child: NodeOrText<Handle>,
    ) {
        if element.parent().is_some() {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) {
        self.document.append_child(&Node::new(NodeData::Doctype {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        }));
    }

    fn get_template_contents(&self, target: &Handle) -> Handle {
        if let NodeData::Element {
            template_contents, ..
        } = &target.data
        {
            if let Some(contents) = template_contents.borrow().as_ref() {
                return contents.clone();
            }
        }
        panic!("not a template element");
    }

    fn is_mathml_annotation_xml_integration_point(&self, target: &Handle) -> bool {
        match &target.data {
            NodeData::Element {
                mathml_annotation_xml_integration_point,
                ..
            } => *mathml_annotation_xml_integration_point,
            _ => panic!("not an element"),
        }
    }

    fn add_attrs_if_missing(&self, target: &Handle, attrs: Vec<Attribute>) {
        let NodeData::Element {
            attrs: existing, ..
        } = &target.data
        else {
            panic!("not an element");
        };
        let mut existing = existing.borrow_mut();
        let present: Vec<QualName> = existing.iter().map(|a| a.name.clone()).collect();
        existing.extend(
            attrs
                .into_iter()
                .filter(|attr| !present.contains(&attr.name)),
        );
    }

    fn remove_from_parent(&self, target: &Handle) {
        target.detach();
    }

    fn reparent_children(&self, node: &Handle, new_parent: &Handle) {
        for child in node.children() {
            new_parent.append_child(&child);
        }
    }
}

fn parse_opts() -> ParseOpts {
    // Scripting is reported as enabled so `<noscript>` contents tokenize as
    // raw text, matching the browsers the sanitized output will meet.
    ParseOpts {
        tree_builder: TreeBuilderOpts {
            scripting_enabled: true,
            ..TreeBuilderOpts::default()
        },
        ..ParseOpts::default()
    }
}

/// Parses a full HTML document.
pub fn parse_html_document(input: &str) -> Handle {
    let document =
        html5ever::driver::parse_document(Sink::new(), parse_opts()).one(StrTendril::from(input));
    super::flatten_templates(&document);
    document
}

/// Parses markup as a fragment in `<body>` context and returns the wrapper
/// element holding the parsed nodes. Fragment context keeps `<template>`,
/// `<style>` and `<script>` in the fragment instead of hoisting them into a
/// synthesized `<head>`.
pub fn parse_html_fragment(input: &str) -> Handle {
    let context = QualName::new(None, ns!(html), LocalName::from("body"));
    let document =
        html5ever::driver::parse_fragment(Sink::new(), parse_opts(), context, Vec::new())
            .one(StrTendril::from(input));
    super::flatten_templates(&document);
    // The fragment algorithm parents everything under a synthetic root
    // element on the document.
    document
        .children()
        .into_iter()
        .find(|c| c.is_element())
        .unwrap_or(document)
}

/// Parses an XML document (the XHTML and custom-namespace input paths).
pub fn parse_xml_document(input: &str) -> Handle {
    let document = xml5ever::driver::parse_document(Sink::new(), Default::default())
        .one(StrTendril::from(input));
    super::flatten_templates(&document);
    document
}
