//! Built-in components.
//!
//! Every pipeline resolution names one of these unless a hook picks a
//! custom component:
//!
//! - `arbor_text` writes the escaped text value.
//! - `arbor_void` writes nothing.
//! - `arbor_element` writes the element's tags around its rendered children.

use arbor_dispatch::{ELEMENT_COMPONENT, TEXT_COMPONENT, VOID_COMPONENT};
use minijinja::Environment;
use tracing::trace;

use super::contents::contents;
use super::filters::register_filters;
use crate::error::RenderError;

const TEXT_SOURCE: &str = "{{ node.value | escape_html }}";

const VOID_SOURCE: &str = "";

const ELEMENT_SOURCE: &str = r#"
{%- if node.tagName is void_element -%}
<{{ node.tagName }}{{ node.properties | attributes }}/>
{%- else -%}
<{{ node.tagName }}{{ node.properties | attributes }}>{{ contents(node.children, pipeline=pipeline, props=props) }}</{{ node.tagName }}>
{%- endif -%}
"#;

const BUILTIN_COMPONENTS: &[(&str, &str)] = &[
    (TEXT_COMPONENT, TEXT_SOURCE),
    (VOID_COMPONENT, VOID_SOURCE),
    (ELEMENT_COMPONENT, ELEMENT_SOURCE),
];

/// Installs the built-in components, the `contents` function and the markup
/// filters on an environment.
///
/// [`Host::new`](crate::Host::new) calls this for you. Calling it again is
/// harmless: components that already exist are left alone, so an overridden
/// `arbor_element` survives.
pub fn register_builtins(env: &mut Environment<'static>) -> Result<(), RenderError> {
    register_filters(env);
    env.add_function("contents", contents);

    for &(name, source) in BUILTIN_COMPONENTS {
        if env.get_template(name).is_ok() {
            trace!(component = name, "component already registered");
            continue;
        }
        env.add_template(name, source)?;
    }
    Ok(())
}
