//! A small mutable DOM the sanitizer owns.
//!
//! The parser collaborators (html5ever / xml5ever) build this tree directly
//! through the shared `TreeSink` implementation in [`sink`]. Nodes are
//! reference-counted so callers can hold on to documents and elements across
//! calls (`sanitize_to_document_tree`, `sanitize_in_place`); parents are weak
//! back-references, children an ordered vector, attributes an
//! insertion-ordered vector of parser attributes.

use html5ever::{Attribute, LocalName, QualName, ns, namespace_url};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub mod sink;

pub type Handle = Rc<Node>;

/// Node kinds, one tagged union so every decision site is exhaustive.
///
/// `Data` is the raw character data of `<script>`/`<style>`-like containers;
/// it serializes unescaped. `ProcessingInstruction` carries XML declarations
/// (and any other PI); the sanitizer detaches it unconditionally.
#[derive(Debug)]
pub enum NodeData {
    Document,
    Doctype {
        name: String,
        public_id: String,
        system_id: String,
    },
    Text {
        contents: RefCell<String>,
    },
    Data {
        contents: RefCell<String>,
    },
    Comment {
        contents: String,
    },
    ProcessingInstruction {
        target: String,
        contents: String,
    },
    Element {
        name: QualName,
        attrs: RefCell<Vec<Attribute>>,
        /// Parse-time home of `<template>` children; folded into `children`
        /// by [`flatten_templates`] before the sanitizer ever walks the tree.
        template_contents: RefCell<Option<Handle>>,
        /// Kept for the tree builder's foreign-content handling.
        mathml_annotation_xml_integration_point: bool,
    },
}

#[derive(Debug)]
pub struct Node {
    parent: RefCell<Option<Weak<Node>>>,
    children: RefCell<Vec<Handle>>,
    pub data: NodeData,
}

impl Node {
    pub fn new(data: NodeData) -> Handle {
        Rc::new(Node {
            parent: RefCell::new(None),
            children: RefCell::new(Vec::new()),
            data,
        })
    }

    pub fn new_document() -> Handle {
        Self::new(NodeData::Document)
    }

    pub fn new_text(contents: impl Into<String>) -> Handle {
        Self::new(NodeData::Text {
            contents: RefCell::new(contents.into()),
        })
    }

    pub fn new_element(name: QualName, attrs: Vec<Attribute>) -> Handle {
        Self::new(NodeData::Element {
            name,
            attrs: RefCell::new(attrs),
            template_contents: RefCell::new(None),
            mathml_annotation_xml_integration_point: false,
        })
    }

    pub fn parent(self: &Rc<Self>) -> Option<Handle> {
        self.parent.borrow().as_ref().and_then(Weak::upgrade)
    }

    pub fn children(self: &Rc<Self>) -> Vec<Handle> {
        self.children.borrow().clone()
    }

    pub fn first_child(self: &Rc<Self>) -> Option<Handle> {
        self.children.borrow().first().cloned()
    }

    pub fn has_children(self: &Rc<Self>) -> bool {
        !self.children.borrow().is_empty()
    }

    pub fn index_of_child(self: &Rc<Self>, child: &Handle) -> Option<usize> {
        self.children
            .borrow()
            .iter()
            .position(|c| Rc::ptr_eq(c, child))
    }

    pub fn next_sibling(self: &Rc<Self>) -> Option<Handle> {
        let parent = self.parent()?;
        let idx = parent.index_of_child(self)?;
        parent.children.borrow().get(idx + 1).cloned()
    }

    pub fn prev_sibling(self: &Rc<Self>) -> Option<Handle> {
        let parent = self.parent()?;
        let idx = parent.index_of_child(self)?;
        if idx == 0 {
            return None;
        }
        parent.children.borrow().get(idx - 1).cloned()
    }

    /// Removes this node from its parent. A no-op for detached nodes.
    pub fn detach(self: &Rc<Self>) {
        if let Some(parent) = self.parent() {
            let mut children = parent.children.borrow_mut();
            if let Some(idx) = children.iter().position(|c| Rc::ptr_eq(c, self)) {
                children.remove(idx);
            }
        }
        *self.parent.borrow_mut() = None;
    }

    pub fn append_child(self: &Rc<Self>, child: &Handle) {
        child.detach();
        *child.parent.borrow_mut() = Some(Rc::downgrade(self));
        self.children.borrow_mut().push(child.clone());
    }

    pub fn insert_child_at(self: &Rc<Self>, idx: usize, child: &Handle) {
        child.detach();
        *child.parent.borrow_mut() = Some(Rc::downgrade(self));
        let mut children = self.children.borrow_mut();
        let idx = idx.min(children.len());
        children.insert(idx, child.clone());
    }

    pub fn insert_before(self: &Rc<Self>, new_sibling: &Handle) {
        if let Some(parent) = self.parent() {
            let idx = parent.index_of_child(self).unwrap_or(0);
            parent.insert_child_at(idx, new_sibling);
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element { .. })
    }

    pub fn element_name(&self) -> Option<&QualName> {
        match &self.data {
            NodeData::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Lowercased local tag name; the form every HTML-mode table is keyed by.
    pub fn tag_lower(&self) -> Option<String> {
        self.element_name()
            .map(|n| n.local.as_ref().to_ascii_lowercase())
    }

    /// Local tag name as parsed (canonical case for foreign content).
    pub fn tag_name(&self) -> Option<String> {
        self.element_name().map(|n| n.local.as_ref().to_string())
    }

    /// The name recorded in the removed-items log: the lowercased tag for
    /// elements, `#text`/`#comment`/`#document` style names otherwise.
    pub fn node_name(&self) -> String {
        match &self.data {
            NodeData::Document => "#document".to_string(),
            NodeData::Doctype { name, .. } => format!("!{name}"),
            NodeData::Text { .. } | NodeData::Data { .. } => "#text".to_string(),
            NodeData::Comment { .. } => "#comment".to_string(),
            NodeData::ProcessingInstruction { .. } => "#decl".to_string(),
            NodeData::Element { name, .. } => name.local.as_ref().to_ascii_lowercase(),
        }
    }

    pub fn attributes(&self) -> Vec<Attribute> {
        match &self.data {
            NodeData::Element { attrs, .. } => attrs.borrow().clone(),
            _ => Vec::new(),
        }
    }

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        let NodeData::Element { attrs, .. } = &self.data else {
            return None;
        };
        attrs
            .borrow()
            .iter()
            .find(|a| attr_name(&a.name).eq_ignore_ascii_case(name))
            .map(|a| a.value.to_string())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.get_attribute(name).is_some()
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        let NodeData::Element { attrs, .. } = &self.data else {
            return;
        };
        let mut attrs = attrs.borrow_mut();
        if let Some(existing) = attrs
            .iter_mut()
            .find(|a| attr_name(&a.name).eq_ignore_ascii_case(name))
        {
            existing.value = value.into();
            return;
        }
        attrs.push(Attribute {
            name: QualName::new(None, ns!(), LocalName::from(name)),
            value: value.into(),
        });
    }

    pub fn remove_attribute(&self, name: &str) -> bool {
        let NodeData::Element { attrs, .. } = &self.data else {
            return false;
        };
        let mut attrs = attrs.borrow_mut();
        let before = attrs.len();
        attrs.retain(|a| !attr_name(&a.name).eq_ignore_ascii_case(name));
        attrs.len() != before
    }

    /// Concatenated `Text`/`Data` contents of this subtree.
    pub fn text_content(self: &Rc<Self>) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Whether any direct child is an element.
    pub fn has_element_child(self: &Rc<Self>) -> bool {
        self.children.borrow().iter().any(|c| c.is_element())
    }

    /// Deep structural clone. The clone is detached.
    pub fn deep_clone(self: &Rc<Self>) -> Handle {
        let data = match &self.data {
            NodeData::Document => NodeData::Document,
            NodeData::Doctype {
                name,
                public_id,
                system_id,
            } => NodeData::Doctype {
                name: name.clone(),
                public_id: public_id.clone(),
                system_id: system_id.clone(),
            },
            NodeData::Text { contents } => NodeData::Text {
                contents: RefCell::new(contents.borrow().clone()),
            },
            NodeData::Data { contents } => NodeData::Data {
                contents: RefCell::new(contents.borrow().clone()),
            },
            NodeData::Comment { contents } => NodeData::Comment {
                contents: contents.clone(),
            },
            NodeData::ProcessingInstruction { target, contents } => {
                NodeData::ProcessingInstruction {
                    target: target.clone(),
                    contents: contents.clone(),
                }
            }
            NodeData::Element {
                name,
                attrs,
                template_contents,
                mathml_annotation_xml_integration_point,
            } => NodeData::Element {
                name: name.clone(),
                attrs: RefCell::new(attrs.borrow().clone()),
                template_contents: RefCell::new(
                    template_contents.borrow().as_ref().map(Node::deep_clone),
                ),
                mathml_annotation_xml_integration_point:
                    *mathml_annotation_xml_integration_point,
            },
        };
        let clone = Node::new(data);
        for child in self.children.borrow().iter() {
            clone.append_child(&child.deep_clone());
        }
        clone
    }
}

fn collect_text(node: &Handle, out: &mut String) {
    match &node.data {
        NodeData::Text { contents } | NodeData::Data { contents } => {
            out.push_str(&contents.borrow());
        }
        _ => {}
    }
    for child in node.children.borrow().iter() {
        collect_text(child, out);
    }
}

/// Pointer identity, the key of the per-call namespace side table.
pub fn node_id(handle: &Handle) -> usize {
    Rc::as_ptr(handle) as usize
}

/// Serialized attribute name (`prefix:local` when prefixed).
pub fn attr_name(name: &QualName) -> String {
    match &name.prefix {
        Some(prefix) => format!("{}:{}", prefix, name.local),
        None => name.local.as_ref().to_string(),
    }
}

/// Folds every `<template>`'s parse-time contents fragment into the
/// element's own child list, recursively. The engine then reasons about one
/// uniform tree: traversal, unwrap splicing, shadow-root recursion and
/// serialization all see template children as ordinary children.
pub fn flatten_templates(node: &Handle) {
    if let NodeData::Element {
        template_contents, ..
    } = &node.data
    {
        let contents = template_contents.borrow_mut().take();
        if let Some(fragment) = contents {
            for child in fragment.children() {
                node.append_child(&child);
            }
        }
    }
    for child in node.children() {
        flatten_templates(&child);
    }
}

/// First element child with the given lowercased local name.
pub fn find_element(node: &Handle, tag_lower: &str) -> Option<Handle> {
    node.children()
        .into_iter()
        .find(|c| c.tag_lower().as_deref() == Some(tag_lower))
}

/// First doctype child (documents only).
pub fn find_doctype(doc: &Handle) -> Option<Handle> {
    doc.children()
        .into_iter()
        .find(|c| matches!(c.data, NodeData::Doctype { .. }))
}
