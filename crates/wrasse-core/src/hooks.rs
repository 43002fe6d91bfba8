//! Hook phases, the hook registry, and the per-visit hook event.
//!
//! Hooks run on the caller's thread, inside the process-wide lock, and may
//! re-enter the sanitizer. A panicking hook is treated as a no-op for that
//! node or attribute; the sanitizer never propagates hook faults.

use crate::dom::Handle;
use rustc_hash::{FxHashMap, FxHashSet};
use std::cell::RefCell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    BeforeSanitizeElements,
    AfterSanitizeElements,
    BeforeSanitizeAttributes,
    AfterSanitizeAttributes,
    UponSanitizeElement,
    UponSanitizeAttribute,
    BeforeSanitizeShadowDom,
    AfterSanitizeShadowDom,
    UponSanitizeShadowNode,
}

pub type HookFn = Arc<dyn Fn(&Handle, Option<&mut HookEvent>) + Send + Sync>;

/// A registered hook. Identity (not function equality) is what removal
/// compares, so the same closure can be registered twice and removed once.
#[derive(Clone)]
pub struct HookHandle {
    phase: HookPhase,
    id: u64,
    func: HookFn,
}

impl HookHandle {
    pub fn phase(&self) -> HookPhase {
        self.phase
    }

    pub(crate) fn same_hook(&self, other: &HookHandle) -> bool {
        self.id == other.id
    }
}

impl std::fmt::Debug for HookHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookHandle")
            .field("phase", &self.phase)
            .field("id", &self.id)
            .finish()
    }
}

/// A capability over a live allow set. Hook events hand these out so
/// `uponSanitizeElement` / `uponSanitizeAttribute` hooks can consult and
/// mutate the effective allow lists for the remainder of the call.
#[derive(Debug, Clone, Default)]
pub struct AllowSet(Rc<RefCell<FxHashSet<String>>>);

impl AllowSet {
    pub(crate) fn from_set(set: FxHashSet<String>) -> Self {
        AllowSet(Rc::new(RefCell::new(set)))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.borrow().contains(key)
    }

    pub fn set(&self, key: &str, allowed: bool) {
        if allowed {
            self.insert(key);
        } else {
            self.remove(key);
        }
    }

    pub fn insert(&self, key: &str) {
        self.0.borrow_mut().insert(key.to_string());
    }

    pub fn remove(&self, key: &str) {
        self.0.borrow_mut().remove(key);
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

/// Shared mutable state for one element or attribute visit.
#[derive(Debug, Clone)]
pub struct HookEvent {
    pub tag_name: Option<String>,
    pub allowed_tags: Option<AllowSet>,
    pub attr_name: Option<String>,
    pub attr_value: Option<String>,
    pub allowed_attributes: Option<AllowSet>,
    /// Attribute visits only: set `false` to drop the attribute.
    pub keep_attr: bool,
    /// Attribute visits only: `Some(true)` keeps the attribute bypassing all
    /// further checks.
    pub force_keep_attr: Option<bool>,
}

impl Default for HookEvent {
    fn default() -> Self {
        HookEvent {
            tag_name: None,
            allowed_tags: None,
            attr_name: None,
            attr_value: None,
            allowed_attributes: None,
            keep_attr: true,
            force_keep_attr: None,
        }
    }
}

impl HookEvent {
    pub(crate) fn for_element(tag_name: &str, allowed_tags: AllowSet) -> Self {
        HookEvent {
            tag_name: Some(tag_name.to_string()),
            allowed_tags: Some(allowed_tags),
            ..HookEvent::default()
        }
    }

    pub(crate) fn for_attribute(name: &str, value: &str, allowed_attributes: AllowSet) -> Self {
        HookEvent {
            attr_name: Some(name.to_string()),
            attr_value: Some(value.to_string()),
            allowed_attributes: Some(allowed_attributes),
            ..HookEvent::default()
        }
    }
}

#[derive(Clone, Default)]
pub(crate) struct HookRegistry {
    hooks: FxHashMap<HookPhase, Vec<HookHandle>>,
    next_id: u64,
}

impl HookRegistry {
    pub fn add(&mut self, phase: HookPhase, func: HookFn) -> HookHandle {
        self.next_id += 1;
        let handle = HookHandle {
            phase,
            id: self.next_id,
            func,
        };
        self.hooks.entry(phase).or_default().push(handle.clone());
        handle
    }

    /// Re-appends a handle obtained from an earlier registration.
    pub fn add_handle(&mut self, handle: HookHandle) {
        self.hooks
            .entry(handle.phase)
            .or_default()
            .push(handle);
    }

    pub fn pop(&mut self, phase: HookPhase) -> Option<HookHandle> {
        self.hooks.get_mut(&phase).and_then(Vec::pop)
    }

    pub fn remove(&mut self, phase: HookPhase, handle: &HookHandle) -> Option<HookHandle> {
        let list = self.hooks.get_mut(&phase)?;
        let idx = list.iter().position(|h| h.same_hook(handle))?;
        Some(list.remove(idx))
    }

    pub fn clear(&mut self, phase: HookPhase) {
        self.hooks.remove(&phase);
    }

    pub fn clear_all(&mut self) {
        self.hooks.clear();
    }

    pub fn has(&self, phase: HookPhase) -> bool {
        self.hooks.get(&phase).is_some_and(|l| !l.is_empty())
    }

    /// Fires a phase. Each hook is isolated: a panic inside one hook is
    /// swallowed and the remaining hooks still run.
    pub fn fire(&self, phase: HookPhase, node: &Handle, mut event: Option<&mut HookEvent>) {
        let Some(list) = self.hooks.get(&phase) else {
            return;
        };
        for hook in list {
            let ev = event.as_deref_mut();
            let _ = catch_unwind(AssertUnwindSafe(|| (hook.func)(node, ev)));
        }
    }
}
