#![forbid(unsafe_code)]

//! `wrasse` is a security-focused HTML/SVG/MathML sanitizer.
//!
//! It is a parity-focused implementation of the DOMPurify sanitization model
//! (pinned to DOMPurify `@3.2.4`); upstream DOMPurify is treated as the spec
//! for decision order, default allow lists, and mXSS hardening behavior.
//!
//! The engine lives in `wrasse-core`; this crate re-exports its public API.
//!
//! ```
//! assert_eq!(
//!     wrasse::sanitize("<img src=x onerror=alert(1)>", None),
//!     r#"<img src="x">"#
//! );
//! ```

pub use wrasse_core::*;
