//! Node-to-component dispatch for HTML-like syntax trees.
//!
//! `arbor-dispatch` decides, per node of a hast-shaped tree, which named
//! component renders it. It knows nothing about templates or output; the
//! `arbor-render` crate plugs the decision into a template host and walks the
//! tree.
//!
//! # Features
//!
//! - **Node model**: [`Node`], [`Element`], [`Text`], deserializable from hast JSON
//! - **Hook chain**: [`Pipeline`] with first-decision-wins semantics
//! - **Outcomes**: [`Outcome::Continue`], [`Outcome::Skip`], [`Outcome::Use`]
//! - **Async hooks**: [`AsyncHook`] awaited in order by [`Pipeline::resolve_async`]
//!
//! # Pipeline Substitution
//!
//! A pipeline is never global. Every call to [`Pipeline::resolve`] takes the
//! pipeline reference to hand to hooks and to store in the default element
//! state, so a subtree can be rendered with a different rule set simply by
//! passing a different `Arc<Pipeline>`.
//!
//! ```rust
//! use std::sync::Arc;
//! use arbor_dispatch::{Node, Outcome, Pipeline, ELEMENT_COMPONENT};
//!
//! let strict = Arc::new(Pipeline::new().hook(|_, _| Ok(Outcome::Skip)));
//! let relaxed = Arc::new(Pipeline::new());
//!
//! let node = Node::element("aside");
//! assert!(strict.resolve(&node, &strict).unwrap().is_void());
//! assert_eq!(relaxed.resolve(&node, &relaxed).unwrap().component, ELEMENT_COMPONENT);
//! ```

mod error;
mod node;
mod pipeline;

pub use error::{DispatchError, HookError};
pub use node::{Element, Node, Properties, PropertyValue, Text};
pub use pipeline::{
    AsyncHook, Component, ComponentState, HookFn, Outcome, Pipeline, Resolution,
    ELEMENT_COMPONENT, TEXT_COMPONENT, VOID_COMPONENT,
};

// Re-exported so async hooks can be implemented without a direct dependency.
pub use async_trait::async_trait;
