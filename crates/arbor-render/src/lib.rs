//! # Arbor Render - Component Rendering for HTML-like Trees
//!
//! `arbor-render` turns hast-shaped node trees into HTML. Which component
//! renders each node is decided by an [`arbor_dispatch::Pipeline`]; this
//! crate supplies the components, the render loop and the markup helpers.
//!
//! ## Core Concepts
//!
//! - [`Host`]: MiniJinja environment with the built-in components and the
//!   `contents` render loop function
//! - [`AsyncRenderer`]: Native walker for pipelines with async hooks
//! - [`stringify_attributes`]: hast properties to HTML attribute text
//! - [`RenderError`]: Error type of every render entry point
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use arbor_dispatch::{Node, Pipeline};
//! use arbor_render::Host;
//!
//! let nodes: Vec<Node> = serde_json::from_str(r#"[
//!     {"type": "element", "tagName": "p", "children": [
//!         {"type": "text", "value": "Fish & chips"}
//!     ]}
//! ]"#).unwrap();
//!
//! let host = Host::new().unwrap();
//! let html = host.render(&nodes, &Arc::new(Pipeline::new())).unwrap();
//! assert_eq!(html, "<p>Fish &amp; chips</p>");
//! ```
//!
//! ## Custom Components
//!
//! A hook returns [`Outcome::Use`](arbor_dispatch::Outcome::Use) to pick a
//! component; the component is a template registered on the host:
//!
//! ```rust
//! use std::sync::Arc;
//! use arbor_dispatch::{ComponentState, Element, Node, Outcome, Pipeline};
//! use arbor_render::Host;
//!
//! let mut host = Host::new().unwrap();
//! host.add_component(
//!     "note",
//!     r#"<aside class="note">{{ contents(node.children) }}</aside>"#,
//! ).unwrap();
//!
//! let pipeline = Arc::new(Pipeline::new().hook(|el, pipeline| {
//!     if el.has_class("note") {
//!         return Ok(pipeline.component("note", ComponentState::for_node(el.clone())));
//!     }
//!     Ok(Outcome::Continue)
//! }));
//!
//! let nodes = vec![Element::new("div")
//!     .with_property("className", vec!["note"])
//!     .with_child(Node::text("Heads up"))
//!     .into()];
//! assert_eq!(
//!     host.render(&nodes, &pipeline).unwrap(),
//!     r#"<aside class="note">Heads up</aside>"#
//! );
//! ```

pub mod async_render;
pub mod attributes;
pub mod context;
mod error;
pub mod template;
mod util;

// Error type
pub use error::RenderError;

// Host and render loop
pub use context::{pipeline_value, PipelineValue};
pub use template::{register_builtins, Host, COMPONENT_EXTENSIONS};

// Async rendering
pub use async_render::{AsyncComponent, AsyncRenderer, ComponentCall};

// Markup helpers
pub use attributes::stringify_attributes;
pub use util::{escape_html, is_void_element, VOID_ELEMENTS};
