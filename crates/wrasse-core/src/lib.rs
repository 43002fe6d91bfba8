#![forbid(unsafe_code)]

//! Sanitization engine for `wrasse`, a security-focused HTML/SVG/MathML
//! sanitizer.
//!
//! Design goals:
//! - parity with upstream DOMPurify (`@3.2.4`) for decision order, default
//!   allow lists, and mXSS hardening; upstream is treated as the spec
//! - deterministic, testable string output (no browser in the loop)
//! - synchronous operation: every entry point runs to completion on the
//!   caller's thread
//!
//! Parsing is delegated to html5ever/xml5ever, which build the engine's own
//! mutable tree ([`dom`]). The pipeline is: pre-process the input string,
//! parse, track namespaces, walk the tree firing hooks and filtering
//! attributes, then serialize.
//!
//! ```
//! use wrasse_core as wrasse;
//!
//! assert_eq!(wrasse::sanitize("<img src=x onerror=alert(1)>", None), r#"<img src="x">"#);
//! assert_eq!(wrasse::sanitize("<a href=\"javascript:alert(1)\">x</a>", None), "<a>x</a>");
//! ```

pub mod config;
pub mod dom;
pub mod error;
pub mod generated;
pub mod hooks;
pub mod namespace;
mod preprocess;
pub mod sanitize;
mod serialize;

pub use config::{
    CustomElementHandling, ParserMediaType, Profiles, SanitizerConfig,
};
pub use dom::{Handle, Node, NodeData};
pub use error::{Error, Result};
pub use hooks::{AllowSet, HookEvent, HookHandle, HookPhase};
pub use namespace::{HTML_NAMESPACE, MATHML_NAMESPACE, Namespace, SVG_NAMESPACE};
pub use sanitize::Removed;

use config::ResolvedConfig;
use hooks::HookRegistry;
use parking_lot::ReentrantMutex;
use sanitize::{Decision, Sanitizer};
use std::cell::RefCell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, OnceLock};

/// Input accepted by every entry point: markup, a list of markup fragments
/// (joined by `,`), or an already-parsed node.
#[derive(Clone)]
pub enum Input {
    Markup(String),
    List(Vec<String>),
    Node(Handle),
}

impl From<&str> for Input {
    fn from(value: &str) -> Self {
        Input::Markup(value.to_string())
    }
}

impl From<String> for Input {
    fn from(value: String) -> Self {
        Input::Markup(value)
    }
}

impl From<Vec<String>> for Input {
    fn from(value: Vec<String>) -> Self {
        Input::List(value)
    }
}

impl From<&[&str]> for Input {
    fn from(value: &[&str]) -> Self {
        Input::List(value.iter().map(|s| s.to_string()).collect())
    }
}

impl From<Handle> for Input {
    fn from(value: Handle) -> Self {
        Input::Node(value)
    }
}

impl From<&Handle> for Input {
    fn from(value: &Handle) -> Self {
        Input::Node(value.clone())
    }
}

/// Result of [`sanitize_to_fragment`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentOutput {
    pub html: String,
    /// Text content of the fragment's first child when it is text-like.
    pub first_child_node_value: Option<String>,
}

/// Result of [`sanitize_to_document`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentOutput {
    pub html: String,
    pub head_html: Option<String>,
    pub body_html: Option<String>,
}

/// Result of [`sanitize_and_get_removed`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitizeOutcome {
    pub sanitized: String,
    pub removed: Vec<Removed>,
}

#[derive(Default)]
struct GlobalState {
    config: Option<SanitizerConfig>,
    hooks: HookRegistry,
    removed: Vec<Removed>,
}

/// Process-wide state behind the recursive lock: the persistent config, the
/// hook registry, and the last call's removed log. Hooks run inside the lock
/// and may re-enter any entry point; snapshots are taken under short borrows
/// so re-entrant calls never observe an outstanding `RefCell` borrow.
fn state() -> &'static ReentrantMutex<RefCell<GlobalState>> {
    static STATE: OnceLock<ReentrantMutex<RefCell<GlobalState>>> = OnceLock::new();
    STATE.get_or_init(|| ReentrantMutex::new(RefCell::new(GlobalState::default())))
}

struct SanitizedCall {
    doc: Handle,
    /// Subtree the walk covered (document element or wrapper).
    walk_root: Handle,
    /// Element fragment output serializes relative to (body, or the wrapper).
    serial_root: Handle,
    removed: Vec<Removed>,
    xml: bool,
    emit_doctype: bool,
}

fn build_from_markup(
    markup: &str,
    cfg: &ResolvedConfig,
    xml: bool,
) -> Option<(Handle, Handle, Handle)> {
    if markup.is_empty() {
        return None;
    }
    if xml {
        let wrapped = preprocess::wrap_xml(markup, &cfg.namespace_uri);
        let doc = dom::sink::parse_xml_document(&wrapped);
        let doc_element = doc.children().into_iter().find(|c| c.is_element())?;
        if cfg.namespace_uri == HTML_NAMESPACE {
            let body = dom::find_element(&doc_element, "body")?;
            let serial = if cfg.whole_document {
                doc_element.clone()
            } else {
                body
            };
            Some((doc, doc_element, serial))
        } else {
            Some((doc.clone(), doc_element.clone(), doc_element))
        }
    } else if cfg.whole_document {
        let prepared = preprocess::prepare_html(markup, cfg.force_body);
        let doc = dom::sink::parse_html_document(&prepared.markup);
        let html = dom::find_element(&doc, "html")?;
        let body = dom::find_element(&html, "body").unwrap_or_else(|| html.clone());
        if cfg.force_body {
            if let Some(sentinel) = dom::find_element(&body, preprocess::FORCE_BODY_SENTINEL_TAG) {
                sentinel.detach();
            }
        } else if let Some(ws) = prepared.leading_whitespace {
            // Document parsing drops whitespace before body content.
            body.insert_child_at(0, &Node::new_text(ws));
        }
        Some((doc, html.clone(), html))
    } else {
        // Fragment path: parse in body context (fragment semantics keep
        // templates, styles and scripts where they were written), then graft
        // the children into a document skeleton so every output shape has a
        // head and body to point at.
        let prepared = preprocess::prepare_html(markup, cfg.force_body);
        let fragment = dom::sink::parse_html_fragment(&prepared.markup);
        let doc = dom::sink::parse_html_document("");
        let html = dom::find_element(&doc, "html")?;
        let body = dom::find_element(&html, "body")?;
        for child in fragment.children() {
            body.append_child(&child);
        }
        if cfg.force_body {
            if let Some(sentinel) = dom::find_element(&body, preprocess::FORCE_BODY_SENTINEL_TAG) {
                sentinel.detach();
            }
        }
        Some((doc, html, body))
    }
}

fn build_from_node(node: &Handle, cfg: &ResolvedConfig) -> Option<(Handle, Handle, Handle)> {
    let clone = node.deep_clone();
    let doc = dom::sink::parse_html_document("");
    let html = dom::find_element(&doc, "html")?;
    let body = dom::find_element(&html, "body")?;
    match clone.tag_lower().as_deref() {
        Some("html") => {
            html.detach();
            doc.append_child(&clone);
            let body = dom::find_element(&clone, "body").unwrap_or_else(|| clone.clone());
            let serial = if cfg.whole_document { clone.clone() } else { body };
            Some((doc, clone, serial))
        }
        Some("body") => {
            body.detach();
            html.append_child(&clone);
            let serial = if cfg.whole_document { html.clone() } else { clone };
            Some((doc, html, serial))
        }
        _ => {
            body.append_child(&clone);
            let serial = if cfg.whole_document { html.clone() } else { body };
            Some((doc, html, serial))
        }
    }
}

/// Comments and declarations the parser left outside the document element
/// (typical for leading `<!--…-->` input) are removed like any other.
fn sweep_document_level(doc: &Handle, sanitizer: &mut Sanitizer<'_>) {
    for child in doc.children() {
        if matches!(
            child.data,
            NodeData::Comment { .. } | NodeData::ProcessingInstruction { .. }
        ) {
            sanitizer.remove_node(&child, child.node_name());
        }
    }
}

fn build_and_sanitize(
    input: &Input,
    cfg: &ResolvedConfig,
    hooks: &HookRegistry,
) -> Option<SanitizedCall> {
    let xml = cfg.is_xhtml() || cfg.namespace_uri != HTML_NAMESPACE;
    let (doc, walk_root, serial_root) = match input {
        Input::Markup(markup) => build_from_markup(markup, cfg, xml)?,
        Input::List(parts) => build_from_markup(&parts.join(","), cfg, xml)?,
        Input::Node(node) => build_from_node(node, cfg)?,
    };

    let mut sanitizer = Sanitizer::new(cfg, hooks);
    sweep_document_level(&doc, &mut sanitizer);
    sanitizer.run(&walk_root);

    let emit_doctype =
        cfg.allowed_tags.contains("!doctype") && dom::find_doctype(&doc).is_some();
    let removed = std::mem::take(&mut sanitizer.removed);
    Some(SanitizedCall {
        doc,
        walk_root,
        serial_root,
        removed,
        xml,
        emit_doctype,
    })
}

/// Lock, snapshot the effective configuration and hooks, run one call, and
/// publish the removed log. `None` means the empty-output path (empty input
/// or a swallowed internal failure); the removed log is still reset.
fn sanitize_call(
    input: &Input,
    config: Option<&SanitizerConfig>,
) -> Option<(SanitizedCall, ResolvedConfig)> {
    let guard = state().lock();
    let (cfg, hooks) = {
        let st = guard.borrow();
        // A persistent config installed via `set_config` overrides the
        // per-call argument.
        let cfg = st
            .config
            .clone()
            .or_else(|| config.cloned())
            .unwrap_or_default();
        (cfg, st.hooks.clone())
    };
    let resolved = config::resolve(&cfg);

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        build_and_sanitize(input, &resolved, &hooks)
    }));
    match outcome {
        Ok(Some(call)) => {
            guard.borrow_mut().removed = call.removed.clone();
            Some((call, resolved))
        }
        Ok(None) | Err(_) => {
            guard.borrow_mut().removed = Vec::new();
            None
        }
    }
}

fn fragment_string(call: &SanitizedCall, cfg: &ResolvedConfig) -> String {
    if cfg.whole_document {
        let mut out = String::new();
        if call.emit_doctype {
            if let Some(doctype) = dom::find_doctype(&call.doc) {
                out.push_str(&serialize::outer_markup(&doctype, call.xml));
            }
        }
        out.push_str(&serialize::outer_markup(&call.serial_root, call.xml));
        out
    } else {
        serialize::inner_markup(&call.serial_root, call.xml)
    }
}

/// Sanitizes markup (or a node) and returns the serialized fragment.
pub fn sanitize(input: impl Into<Input>, config: Option<&SanitizerConfig>) -> String {
    let input = input.into();
    match sanitize_call(&input, config) {
        Some((call, cfg)) => fragment_string(&call, &cfg),
        None => String::new(),
    }
}

/// Sanitizes and returns the outer serialization of the sanitized root
/// element (the body, or the namespace wrapper).
pub fn sanitize_to_dom(input: impl Into<Input>, config: Option<&SanitizerConfig>) -> String {
    let input = input.into();
    match sanitize_call(&input, config) {
        Some((call, _)) => serialize::outer_markup(&call.serial_root, call.xml),
        None => String::new(),
    }
}

/// Sanitizes and returns the fragment plus the text content of its first
/// child when that child is text-like.
pub fn sanitize_to_fragment(
    input: impl Into<Input>,
    config: Option<&SanitizerConfig>,
) -> FragmentOutput {
    let input = input.into();
    match sanitize_call(&input, config) {
        Some((call, _)) => {
            let first_child_node_value =
                call.serial_root.first_child().and_then(|c| match &c.data {
                    NodeData::Text { contents } | NodeData::Data { contents } => {
                        Some(contents.borrow().clone())
                    }
                    _ => None,
                });
            FragmentOutput {
                html: serialize::inner_markup(&call.serial_root, call.xml),
                first_child_node_value,
            }
        }
        None => FragmentOutput::default(),
    }
}

/// Sanitizes and returns full-document serializations.
pub fn sanitize_to_document(
    input: impl Into<Input>,
    config: Option<&SanitizerConfig>,
) -> DocumentOutput {
    let input = input.into();
    match sanitize_call(&input, config) {
        Some((call, _)) => {
            let head = dom::find_element(&call.walk_root, "head");
            let body = dom::find_element(&call.walk_root, "body");
            DocumentOutput {
                html: serialize::document_markup(&call.doc, call.xml, call.emit_doctype),
                head_html: head.map(|h| serialize::outer_markup(&h, call.xml)),
                body_html: body.map(|b| serialize::outer_markup(&b, call.xml)),
            }
        }
        None => DocumentOutput::default(),
    }
}

/// Sanitizes and returns the mutable parse tree (the document node).
pub fn sanitize_to_document_tree(
    input: impl Into<Input>,
    config: Option<&SanitizerConfig>,
) -> Handle {
    let input = input.into();
    match sanitize_call(&input, config) {
        Some((call, _)) => call.doc,
        None => Node::new_document(),
    }
}

/// Sanitizes and returns both the fragment and the removed log of the call.
pub fn sanitize_and_get_removed(
    input: impl Into<Input>,
    config: Option<&SanitizerConfig>,
) -> SanitizeOutcome {
    let input = input.into();
    match sanitize_call(&input, config) {
        Some((call, cfg)) => SanitizeOutcome {
            sanitized: fragment_string(&call, &cfg),
            removed: call.removed,
        },
        None => SanitizeOutcome::default(),
    }
}

/// Sanitizes the element's subtree in place and returns the same element.
///
/// Fails with [`Error::ForbiddenRootNode`] when the active configuration
/// would remove or unwrap the element itself; the check runs before any
/// mutation.
pub fn sanitize_in_place(element: &Handle, config: Option<&SanitizerConfig>) -> Result<Handle> {
    let guard = state().lock();
    let (cfg, hooks) = {
        let st = guard.borrow();
        let cfg = st
            .config
            .clone()
            .or_else(|| config.cloned())
            .unwrap_or_default();
        (cfg, st.hooks.clone())
    };
    let resolved = config::resolve(&cfg);

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let mut sanitizer = Sanitizer::new(&resolved, &hooks);
        if sanitizer.root_decision(element) != Decision::Keep {
            return Err(Error::ForbiddenRootNode {
                tag_name: element.node_name(),
            });
        }
        sanitizer.process_kept_root(element);
        sanitizer.run(element);
        Ok(sanitizer.removed)
    }));
    match outcome {
        Ok(Ok(removed)) => {
            guard.borrow_mut().removed = removed;
            Ok(element.clone())
        }
        Ok(Err(err)) => {
            guard.borrow_mut().removed = Vec::new();
            Err(err)
        }
        Err(_) => {
            guard.borrow_mut().removed = Vec::new();
            Ok(element.clone())
        }
    }
}

/// Installs a persistent configuration that overrides per-call configs until
/// [`clear_config`] is called.
pub fn set_config(config: SanitizerConfig) {
    let guard = state().lock();
    guard.borrow_mut().config = Some(config);
}

pub fn clear_config() {
    let guard = state().lock();
    guard.borrow_mut().config = None;
}

/// The removed log of the most recent call.
pub fn removed() -> Vec<Removed> {
    let guard = state().lock();
    let removed = guard.borrow().removed.clone();
    removed
}

pub fn add_hook<F>(phase: HookPhase, hook: F) -> HookHandle
where
    F: Fn(&Handle, Option<&mut HookEvent>) + Send + Sync + 'static,
{
    let guard = state().lock();
    let handle = guard.borrow_mut().hooks.add(phase, Arc::new(hook));
    handle
}

/// Re-registers a handle returned by an earlier [`add_hook`].
pub fn add_hook_handle(handle: HookHandle) {
    let guard = state().lock();
    guard.borrow_mut().hooks.add_handle(handle);
}

/// Removes and returns the most recently added hook of a phase.
pub fn remove_hook(phase: HookPhase) -> Option<HookHandle> {
    let guard = state().lock();
    let handle = guard.borrow_mut().hooks.pop(phase);
    handle
}

/// Removes a specific hook by identity.
pub fn remove_hook_handle(phase: HookPhase, handle: &HookHandle) -> Option<HookHandle> {
    let guard = state().lock();
    let removed = guard.borrow_mut().hooks.remove(phase, handle);
    removed
}

pub fn remove_hooks(phase: HookPhase) {
    let guard = state().lock();
    guard.borrow_mut().hooks.clear(phase);
}

pub fn remove_all_hooks() {
    let guard = state().lock();
    guard.borrow_mut().hooks.clear_all();
}

#[cfg(test)]
mod tests;
