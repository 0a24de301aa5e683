//! Tree rendering on top of MiniJinja.
//!
//! Components are ordinary MiniJinja templates. The render loop resolves a
//! node, builds the component context and renders the template; the
//! template recurses with `contents(...)`.
//!
//! ## Component Context
//!
//! | Name | Value |
//! |------|-------|
//! | `node` | The node, in hast JSON shape (`node.tagName`, `node.properties`, `node.children`, `node.value`) |
//! | `pipeline` | The pipeline to render children with, when the state carries one |
//! | `props` | The ambient props map, forwarded by `arbor_element` to children |
//! | any other key | Ambient props, then component state extras (state wins) |
//!
//! ## Template Helpers
//!
//! - `contents(nodes, pipeline=..., props=..., **extra)`: render a node list
//! - filters `attributes`, `escape_html`, `classes`, `has_class`, `text_content`
//! - test `void_element`
//!
//! ## Component Files
//!
//! [`Host::set_component_dir`] loads components by name from a directory.
//! Supported extensions: `.jinja`, `.jinja2`, `.j2`, `.html` (in priority order).

mod components;
mod contents;
pub mod filters;
mod host;
mod loader;

pub use components::register_builtins;
pub use host::Host;
pub use loader::{component_path, COMPONENT_EXTENSIONS};
