use super::serial;
use crate::{
    HookPhase, SanitizerConfig, add_hook, add_hook_handle, remove_all_hooks, remove_hook,
    remove_hook_handle, remove_hooks, sanitize,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Drops every hook this test registered even on assertion failure.
struct HookCleanup;

impl Drop for HookCleanup {
    fn drop(&mut self) {
        remove_all_hooks();
    }
}

#[test]
fn force_keep_attr_overrides_the_filter() {
    let _guard = serial();
    let _cleanup = HookCleanup;
    add_hook(HookPhase::UponSanitizeAttribute, |_, event| {
        if let Some(event) = event {
            if event.attr_name.as_deref() == Some("onclick") {
                event.force_keep_attr = Some(true);
            }
        }
    });
    assert_eq!(
        sanitize(r#"<a onclick="alert(1)">x</a>"#, None),
        r#"<a onclick="alert(1)">x</a>"#
    );
}

#[test]
fn keep_attr_false_drops_an_otherwise_valid_attribute() {
    let _guard = serial();
    let _cleanup = HookCleanup;
    add_hook(HookPhase::UponSanitizeAttribute, |_, event| {
        if let Some(event) = event {
            if event.attr_name.as_deref() == Some("title") {
                event.keep_attr = false;
            }
        }
    });
    assert_eq!(sanitize(r#"<b title="t">x</b>"#, None), "<b>x</b>");
}

#[test]
fn hooks_can_mutate_attribute_values() {
    let _guard = serial();
    let _cleanup = HookCleanup;
    add_hook(HookPhase::UponSanitizeAttribute, |_, event| {
        if let Some(event) = event {
            if event.attr_name.as_deref() == Some("href") {
                event.attr_value = Some("/rewritten".to_string());
            }
        }
    });
    assert_eq!(
        sanitize(r#"<a href="/original">x</a>"#, None),
        r#"<a href="/rewritten">x</a>"#
    );
}

#[test]
fn element_hooks_can_extend_the_live_allow_list() {
    let _guard = serial();
    let _cleanup = HookCleanup;
    add_hook(HookPhase::UponSanitizeElement, |_, event| {
        if let Some(event) = event {
            if event.tag_name.as_deref() == Some("foobar") {
                if let Some(allowed) = &event.allowed_tags {
                    allowed.set("foobar", true);
                }
            }
        }
    });
    assert_eq!(
        sanitize("<foobar>abc</foobar>", None),
        "<foobar>abc</foobar>"
    );
}

#[test]
fn all_element_phases_fire() {
    let _guard = serial();
    let _cleanup = HookCleanup;
    let counters: Arc<[AtomicUsize; 4]> = Arc::new([
        AtomicUsize::new(0),
        AtomicUsize::new(0),
        AtomicUsize::new(0),
        AtomicUsize::new(0),
    ]);
    for (idx, phase) in [
        HookPhase::BeforeSanitizeElements,
        HookPhase::UponSanitizeElement,
        HookPhase::BeforeSanitizeAttributes,
        HookPhase::AfterSanitizeAttributes,
    ]
    .into_iter()
    .enumerate()
    {
        let counters = counters.clone();
        add_hook(phase, move |_, _| {
            counters[idx].fetch_add(1, Ordering::SeqCst);
        });
    }

    sanitize("<b>x</b>", None);
    // beforeSanitizeElements fires for the element and the text node.
    assert_eq!(counters[0].load(Ordering::SeqCst), 2);
    assert_eq!(counters[1].load(Ordering::SeqCst), 1);
    assert_eq!(counters[2].load(Ordering::SeqCst), 1);
    assert_eq!(counters[3].load(Ordering::SeqCst), 1);
}

#[test]
fn shadow_hooks_fire_for_hosts_and_their_subtrees() {
    let _guard = serial();
    let _cleanup = HookCleanup;
    let shadow_nodes = Arc::new(AtomicUsize::new(0));
    let dom_phases = Arc::new(AtomicUsize::new(0));

    {
        let shadow_nodes = shadow_nodes.clone();
        add_hook(HookPhase::UponSanitizeShadowNode, move |node, _| {
            shadow_nodes.fetch_add(1, Ordering::SeqCst);
            // Hook-injected attributes survive the attribute filter.
            if node.is_element() {
                node.set_attribute("data-shadow-seen", "1");
            }
        });
    }
    for phase in [
        HookPhase::BeforeSanitizeShadowDom,
        HookPhase::AfterSanitizeShadowDom,
    ] {
        let dom_phases = dom_phases.clone();
        add_hook(phase, move |_, _| {
            dom_phases.fetch_add(1, Ordering::SeqCst);
        });
    }

    let cfg = SanitizerConfig {
        add_attributes: vec!["shadowroot".to_string()],
        ..SanitizerConfig::default()
    };
    let out = sanitize(
        r#"<template shadowroot="open"><div>x</div></template>"#,
        Some(&cfg),
    );
    assert!(out.contains(r#"shadowroot="open""#), "unexpected: {out}");
    assert!(
        out.contains(r#"<div data-shadow-seen="1">x</div>"#),
        "unexpected: {out}"
    );
    // div + its text child.
    assert_eq!(shadow_nodes.load(Ordering::SeqCst), 2);
    assert_eq!(dom_phases.load(Ordering::SeqCst), 2);
}

#[test]
fn a_panicking_hook_is_a_no_op() {
    let _guard = serial();
    let _cleanup = HookCleanup;
    add_hook(HookPhase::BeforeSanitizeElements, |_, _| {
        panic!("hook fault");
    });
    assert_eq!(sanitize("<b>x</b>", None), "<b>x</b>");
}

#[test]
fn hook_registry_supports_pop_remove_and_re_add() {
    let _guard = serial();
    let _cleanup = HookCleanup;

    let first = add_hook(HookPhase::UponSanitizeAttribute, |_, event| {
        if let Some(event) = event {
            event.keep_attr = false;
        }
    });
    // With the hook installed every attribute is dropped.
    assert_eq!(sanitize(r#"<b title="t">x</b>"#, None), "<b>x</b>");

    // Pop-last returns the handle and disables the hook.
    let popped = remove_hook(HookPhase::UponSanitizeAttribute).expect("hook present");
    assert_eq!(
        sanitize(r#"<b title="t">x</b>"#, None),
        r#"<b title="t">x</b>"#
    );

    // Re-adding the popped handle restores the behavior.
    add_hook_handle(popped);
    assert_eq!(sanitize(r#"<b title="t">x</b>"#, None), "<b>x</b>");

    // Removal by identity.
    let removed = remove_hook_handle(HookPhase::UponSanitizeAttribute, &first);
    assert!(removed.is_some());
    assert_eq!(
        sanitize(r#"<b title="t">x</b>"#, None),
        r#"<b title="t">x</b>"#
    );

    // Clearing an empty phase is fine.
    remove_hooks(HookPhase::UponSanitizeAttribute);
    assert!(remove_hook(HookPhase::UponSanitizeAttribute).is_none());
}
