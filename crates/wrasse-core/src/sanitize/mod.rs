//! The per-call sanitization engine: depth-first traversal, element
//! decisions, mXSS hardening, shadow-root handling, and the post-traversal
//! passes. Attribute filtering lives in [`attrs`].

use crate::config::ResolvedConfig;
use crate::dom::{Handle, NodeData, node_id};
use crate::hooks::{HookEvent, HookPhase, HookRegistry};
use crate::namespace::{self, Namespace, XmlNsScope};
use crate::serialize;
use regex::Regex;
use rustc_hash::FxHashMap;
use std::rc::Rc;
use std::sync::OnceLock;

pub(crate) mod attrs;

macro_rules! cached_regex {
    ($fn_name:ident, $pat:literal) => {
        pub(crate) fn $fn_name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pat).expect("builtin regex must compile"))
        }
    };
}

// `<` opening a tag-like sequence inside what should be plain text.
cached_regex!(re_tag_open, r"<[/\w!]");
// A raw-text container smuggling its own closing tag for a nested parse.
cached_regex!(re_nested_raw_text, r"(?i)</no(script|embed|frames)");
// Template expression syntaxes stripped under `safe_for_templates`.
cached_regex!(re_mustache_expr, r"\{\{[\w\W]*|[\w\W]*\}\}");
cached_regex!(re_erb_expr, r"<%[\w\W]*|[\w\W]*%>");
cached_regex!(re_tmplit_expr, r"\$\{[\w\W]*\}");
// The baseline shape of a custom element name.
cached_regex!(re_basic_custom_element, r"^[a-z][.\w]*(-[.\w]+)+$");

/// One removed item, reported exactly once per removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removed {
    Element { node_name: String },
    Attribute { name: String, from_node_name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    Keep,
    Remove,
    Unwrap,
}

pub(crate) fn strip_template_expressions(value: &str) -> String {
    let mut out = re_mustache_expr().replace_all(value, " ").into_owned();
    out = re_erb_expr().replace_all(&out, " ").into_owned();
    re_tmplit_expr().replace_all(&out, " ").into_owned()
}

pub(crate) struct Sanitizer<'a> {
    pub(crate) cfg: &'a ResolvedConfig,
    pub(crate) hooks: &'a HookRegistry,
    pub(crate) removed: Vec<Removed>,
    ns_map: FxHashMap<usize, Namespace>,
    xml_scopes: FxHashMap<usize, XmlNsScope>,
    /// Detached nodes stay alive for the whole call: the namespace tables
    /// key on pointer identity, so freed allocations must not be reusable
    /// while a walk is in flight.
    graveyard: Vec<Handle>,
    saw_svg: bool,
}

impl<'a> Sanitizer<'a> {
    pub fn new(cfg: &'a ResolvedConfig, hooks: &'a HookRegistry) -> Self {
        Sanitizer {
            cfg,
            hooks,
            removed: Vec::new(),
            ns_map: FxHashMap::default(),
            xml_scopes: FxHashMap::default(),
            graveyard: Vec::new(),
            saw_svg: false,
        }
    }

    /// Tag name in lookup form: lowercased outside XHTML.
    pub(crate) fn transform_name(&self, name: &str) -> String {
        if self.cfg.is_xhtml() {
            name.to_string()
        } else {
            name.to_ascii_lowercase()
        }
    }

    pub(crate) fn record(&mut self, removed: Removed) {
        self.removed.push(removed);
    }

    /// Records and detaches a node, keeping the detached handle alive for
    /// the rest of the call.
    pub(crate) fn remove_node(&mut self, node: &Handle, node_name: String) {
        self.record(Removed::Element { node_name });
        node.detach();
        self.graveyard.push(node.clone());
    }

    /// Sanitizes every descendant of `root` (not `root` itself), then runs
    /// the post-traversal passes.
    pub fn run(&mut self, root: &Handle) {
        self.seed_root(root);
        let mut current = root.first_child();
        while let Some(node) = current {
            current = self.process_node(&node, root);
        }
        if self.cfg.safe_for_templates {
            normalize_text(root);
            strip_templates_in_subtree(root);
        }
        if self.cfg.safe_for_xml && self.saw_svg {
            self.remove_svg_sentinels(root);
        }
    }

    /// Element decision for an in-place root, before any mutation.
    pub fn root_decision(&mut self, root: &Handle) -> Decision {
        self.seed_root(root);
        let tag = match root.tag_name() {
            Some(name) => self.transform_name(&name),
            None => return Decision::Remove,
        };
        self.decide(root, &tag, root)
    }

    /// Hook firing and attribute filtering for a kept in-place root.
    pub fn process_kept_root(&mut self, root: &Handle) {
        self.hooks.fire(HookPhase::BeforeSanitizeElements, root, None);
        let tag = self
            .tag_of(root)
            .unwrap_or_else(|| root.node_name());
        let mut event = HookEvent::for_element(&tag, self.cfg.allowed_tags.clone());
        self.hooks
            .fire(HookPhase::UponSanitizeElement, root, Some(&mut event));
        self.hooks
            .fire(HookPhase::BeforeSanitizeAttributes, root, None);
        attrs::sanitize_attributes(self, root, &tag);
        self.hooks
            .fire(HookPhase::AfterSanitizeAttributes, root, None);
        self.hooks.fire(HookPhase::AfterSanitizeElements, root, None);
    }

    fn tag_of(&self, node: &Handle) -> Option<String> {
        node.tag_name().map(|n| self.transform_name(&n))
    }

    // ---- namespace bookkeeping -------------------------------------------

    fn seed_root(&mut self, root: &Handle) {
        if self.cfg.is_xhtml() {
            // Fold xmlns declarations from the document down to the root so
            // in-place roots inherit their real context.
            let mut chain = Vec::new();
            let mut cursor = Some(root.clone());
            while let Some(node) = cursor {
                cursor = node.parent();
                chain.push(node);
            }
            let mut scope = XmlNsScope::default();
            for node in chain.iter().rev() {
                if node.is_element() {
                    scope = scope.descend(node);
                    let ns = scope.namespace_of(node);
                    self.xml_scopes.insert(node_id(node), scope.clone());
                    self.ns_map.insert(node_id(node), ns);
                }
            }
            if !root.is_element() {
                self.xml_scopes.insert(node_id(root), scope);
                self.ns_map
                    .insert(node_id(root), Namespace::from_uri(&self.cfg.namespace_uri));
            }
        } else {
            let ns = match root.element_name() {
                Some(name) if !name.ns.as_ref().is_empty() => {
                    Namespace::from_uri(name.ns.as_ref())
                }
                _ => Namespace::from_uri(&self.cfg.namespace_uri),
            };
            self.ns_map.insert(node_id(root), ns);
        }
    }

    /// Computes (and caches) the namespace of an element from its parent's
    /// entry. Every element has an entry before its decision is evaluated;
    /// spliced clones re-derive from their new context on their own visit.
    fn ensure_namespace(&mut self, el: &Handle) -> Namespace {
        if let Some(ns) = self.ns_map.get(&node_id(el)) {
            return ns.clone();
        }
        let ns = if self.cfg.is_xhtml() {
            let parent_scope = el
                .parent()
                .and_then(|p| self.xml_scopes.get(&node_id(&p)).cloned())
                .unwrap_or_default();
            let scope = parent_scope.descend(el);
            let ns = scope.namespace_of(el);
            self.xml_scopes.insert(node_id(el), scope);
            ns
        } else {
            let (parent_ns, parent_tag) = self.parent_context(el);
            let tag = el.tag_lower().unwrap_or_default();
            namespace::html_transition(&parent_ns, &parent_tag, &tag)
        };
        self.ns_map.insert(node_id(el), ns.clone());
        ns
    }

    /// Parent namespace and lowercased tag, with the configured namespace and
    /// a `template` stand-in at the sanitization boundary.
    fn parent_context(&mut self, node: &Handle) -> (Namespace, String) {
        let Some(parent) = node.parent() else {
            return (
                Namespace::from_uri(&self.cfg.namespace_uri),
                "template".to_string(),
            );
        };
        if !parent.is_element() {
            return (
                Namespace::from_uri(&self.cfg.namespace_uri),
                "template".to_string(),
            );
        }
        let ns = match self.ns_map.get(&node_id(&parent)) {
            Some(ns) => ns.clone(),
            // Parents are visited before children; a missing entry only
            // happens for in-place ancestors outside the walk.
            None => self.ensure_namespace(&parent),
        };
        (ns, parent.tag_lower().unwrap_or_default())
    }

    // ---- traversal --------------------------------------------------------

    fn process_node(&mut self, node: &Handle, root: &Handle) -> Option<Handle> {
        match &node.data {
            NodeData::Element { .. } => self.process_element(node, root),
            NodeData::Text { .. } | NodeData::Data { .. } => self.process_chardata(node, root),
            NodeData::Comment { .. } | NodeData::ProcessingInstruction { .. } => {
                if self.in_shadow_subtree(node, root) {
                    self.hooks
                        .fire(HookPhase::UponSanitizeShadowNode, node, None);
                }
                self.hooks.fire(HookPhase::BeforeSanitizeElements, node, None);
                let next = next_in_subtree(node, root, true);
                self.remove_node(node, node.node_name());
                next
            }
            NodeData::Document => next_in_subtree(node, root, false),
            NodeData::Doctype { .. } => next_in_subtree(node, root, true),
        }
    }

    fn process_element(&mut self, el: &Handle, root: &Handle) -> Option<Handle> {
        if self.in_shadow_subtree(el, root) {
            self.hooks
                .fire(HookPhase::UponSanitizeShadowNode, el, None);
        }
        self.hooks.fire(HookPhase::BeforeSanitizeElements, el, None);

        let tag = self.tag_of(el).unwrap_or_default();
        let ns = self.ensure_namespace(el);
        if ns == Namespace::Svg {
            self.saw_svg = true;
        }

        let mut event = HookEvent::for_element(&tag, self.cfg.allowed_tags.clone());
        self.hooks
            .fire(HookPhase::UponSanitizeElement, el, Some(&mut event));

        let is_host = is_shadow_host(el);
        if is_host {
            self.hooks
                .fire(HookPhase::BeforeSanitizeShadowDom, el, None);
        }

        match self.decide(el, &tag, root) {
            Decision::Keep => {
                self.hooks
                    .fire(HookPhase::BeforeSanitizeAttributes, el, None);
                attrs::sanitize_attributes(self, el, &tag);
                self.hooks
                    .fire(HookPhase::AfterSanitizeAttributes, el, None);
                self.hooks.fire(HookPhase::AfterSanitizeElements, el, None);
                if is_host {
                    self.hooks
                        .fire(HookPhase::AfterSanitizeShadowDom, el, None);
                }
                next_in_subtree(el, root, false)
            }
            Decision::Remove => {
                let next = next_in_subtree(el, root, true);
                self.remove_node(el, el.node_name());
                next
            }
            Decision::Unwrap => {
                let fallback = next_in_subtree(el, root, true);
                let parent = el.parent();
                let children = el.children();
                let Some(parent) = parent else {
                    self.remove_node(el, el.node_name());
                    return fallback;
                };
                let idx = parent.index_of_child(el).unwrap_or(0);
                self.remove_node(el, el.node_name());
                // Splice clones so the detached original stays intact as the
                // removed record; the clones are visited next and sanitized
                // themselves.
                let clones: Vec<Handle> = children.iter().map(|c| c.deep_clone()).collect();
                for (offset, clone) in clones.iter().enumerate() {
                    parent.insert_child_at(idx + offset, clone);
                }
                clones.first().cloned().or(fallback)
            }
        }
    }

    fn process_chardata(&mut self, node: &Handle, root: &Handle) -> Option<Handle> {
        if self.in_shadow_subtree(node, root) {
            self.hooks
                .fire(HookPhase::UponSanitizeShadowNode, node, None);
        }
        self.hooks.fire(HookPhase::BeforeSanitizeElements, node, None);

        // Text nodes pass the same allow gate as elements, under `#text`.
        if !self.cfg.allowed_tags.contains("#text") || self.cfg.forbid_tags.contains("#text") {
            let next = next_in_subtree(node, root, true);
            self.remove_node(node, "#text".to_string());
            return next;
        }

        if self.cfg.safe_for_templates {
            let changed = match &node.data {
                NodeData::Text { contents } | NodeData::Data { contents } => {
                    let current = contents.borrow().clone();
                    let stripped = strip_template_expressions(&current);
                    if stripped != current {
                        *contents.borrow_mut() = stripped;
                        true
                    } else {
                        false
                    }
                }
                _ => false,
            };
            if changed {
                self.record(Removed::Element {
                    node_name: "#text".to_string(),
                });
            }
        }

        if self.cfg.safe_for_xml {
            let foreign_parent = node
                .parent()
                .filter(|p| p.is_element())
                .map(|p| self.ensure_namespace(&p))
                .is_some_and(|ns| ns != Namespace::Html);
            if foreign_parent {
                let suspicious = match &node.data {
                    NodeData::Text { contents } | NodeData::Data { contents } => {
                        let text = contents.borrow();
                        re_tag_open().is_match(&text) || &*text == "\">"
                    }
                    _ => false,
                };
                if suspicious {
                    let next = next_in_subtree(node, root, true);
                    self.remove_node(node, "#text".to_string());
                    self.hooks.fire(HookPhase::AfterSanitizeElements, node, None);
                    return next;
                }
            }
        }

        self.hooks.fire(HookPhase::AfterSanitizeElements, node, None);
        next_in_subtree(node, root, true)
    }

    // ---- decisions --------------------------------------------------------

    pub(crate) fn decide(&mut self, el: &Handle, tag: &str, _root: &Handle) -> Decision {
        // Leaf mXSS: character data that re-parses into markup while the
        // element pretends to have no element children.
        if self.cfg.safe_for_xml && el.has_children() && !el.has_element_child() {
            let inner = serialize::inner_markup(el, false);
            if re_tag_open().is_match(&inner) && re_tag_open().is_match(&el.text_content()) {
                return Decision::Remove;
            }
        }

        let forbidden = self.cfg.forbid_tags.contains(tag);
        let allowed = !forbidden && self.cfg.allowed_tags.contains(tag);
        if !allowed {
            if !forbidden && self.is_allowed_custom_element(tag) {
                return Decision::Keep;
            }
            if self.cfg.keep_content && !self.cfg.forbid_contents.contains(tag) {
                return Decision::Unwrap;
            }
            return Decision::Remove;
        }

        // Raw-text containers carrying their own close tag become markup on
        // the second parse.
        if self.cfg.safe_for_xml
            && matches!(tag, "noscript" | "noembed" | "noframes")
            && re_nested_raw_text().is_match(&serialize::inner_markup(el, false))
        {
            return Decision::Remove;
        }

        let ns = self.ensure_namespace(el);
        let (parent_ns, parent_tag) = self.parent_context(el);
        let tag_lower = tag.to_ascii_lowercase();
        if !namespace::check_valid_namespace(self.cfg, &ns, &parent_ns, &parent_tag, &tag_lower) {
            return Decision::Remove;
        }

        Decision::Keep
    }

    pub(crate) fn is_basic_custom_element(tag: &str) -> bool {
        tag != "annotation-xml" && re_basic_custom_element().is_match(tag)
    }

    fn is_allowed_custom_element(&self, tag: &str) -> bool {
        Self::is_basic_custom_element(tag)
            && self
                .cfg
                .tag_name_check
                .as_ref()
                .is_some_and(|re| re.is_match(tag))
    }

    // ---- shadow roots -----------------------------------------------------

    fn in_shadow_subtree(&self, node: &Handle, root: &Handle) -> bool {
        let mut cursor = node.parent();
        while let Some(ancestor) = cursor {
            if is_shadow_host(&ancestor) {
                return true;
            }
            if Rc::ptr_eq(&ancestor, root) {
                break;
            }
            cursor = ancestor.parent();
        }
        false
    }

    // ---- post passes ------------------------------------------------------

    /// Empty `<svg>` sentinels followed by `//[`-prefixed text are a known
    /// smuggling pattern for second-parse payloads.
    fn remove_svg_sentinels(&mut self, root: &Handle) {
        let mut sentinels = Vec::new();
        collect_svg_sentinels(root, &mut sentinels);
        for el in sentinels {
            self.remove_node(&el, el.node_name());
        }
    }
}

pub(crate) fn is_shadow_host(node: &Handle) -> bool {
    node.tag_lower().as_deref() == Some("template")
        && (node.has_attribute("shadowroot") || node.has_attribute("shadowrootmode"))
}

/// Next node in document order within `root`'s subtree: first child, else
/// next sibling, else the nearest ancestor's next sibling. `skip_children`
/// jumps over the current subtree.
fn next_in_subtree(node: &Handle, root: &Handle, skip_children: bool) -> Option<Handle> {
    if !skip_children {
        if let Some(child) = node.first_child() {
            return Some(child);
        }
    }
    let mut cursor = node.clone();
    loop {
        if Rc::ptr_eq(&cursor, root) {
            return None;
        }
        if let Some(sibling) = cursor.next_sibling() {
            return Some(sibling);
        }
        match cursor.parent() {
            Some(parent) => cursor = parent,
            None => return None,
        }
    }
}

/// Merges adjacent text siblings so expressions split across nodes cannot
/// survive the per-node strip.
fn normalize_text(node: &Handle) {
    let children = node.children();
    let mut previous: Option<Handle> = None;
    for child in children {
        let merged = match (&previous, &child.data) {
            (Some(prev), NodeData::Text { contents }) => {
                if let NodeData::Text { contents: prev_c } = &prev.data {
                    prev_c.borrow_mut().push_str(&contents.borrow());
                    child.detach();
                    true
                } else {
                    false
                }
            }
            _ => false,
        };
        if !merged {
            previous = Some(child.clone());
        }
    }
    for child in node.children() {
        normalize_text(&child);
    }
}

fn strip_templates_in_subtree(node: &Handle) {
    if let NodeData::Text { contents } | NodeData::Data { contents } = &node.data {
        let current = contents.borrow().clone();
        let stripped = strip_template_expressions(&current);
        if stripped != current {
            *contents.borrow_mut() = stripped;
        }
    }
    for child in node.children() {
        strip_templates_in_subtree(&child);
    }
}

fn collect_svg_sentinels(node: &Handle, out: &mut Vec<Handle>) {
    for child in node.children() {
        if child.tag_lower().as_deref() == Some("svg") && !child.has_children() {
            let next_text = child.next_sibling().and_then(|sib| match &sib.data {
                NodeData::Text { contents } | NodeData::Data { contents } => {
                    Some(contents.borrow().trim_start().starts_with("//["))
                }
                _ => None,
            });
            if next_text == Some(true) {
                out.push(child.clone());
                continue;
            }
        }
        collect_svg_sentinels(&child, out);
    }
}
