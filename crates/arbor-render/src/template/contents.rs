//! The render loop.
//!
//! [`render_nodes`] resolves each sibling through the pipeline and renders
//! the chosen component. Components recurse by calling the `contents`
//! template function on their children, which lands back in
//! [`render_nodes`]:
//!
//! ```jinja
//! <li>{{ contents(node.children, pipeline=pipeline, props=props) }}</li>
//! ```
//!
//! `pipeline=` and `props=` default to the calling component's own
//! `pipeline` and `props`. Any other keyword argument is added to the props
//! the children see.

use std::sync::Arc;

use arbor_dispatch::{DispatchError, Node, Pipeline};
use minijinja::value::{Kwargs, ViaDeserialize};
use minijinja::{Environment, Error, ErrorKind, State, Value};
use tracing::trace;

use crate::context::{component_context, extend_props, pipeline_from_value};

/// Renders sibling nodes in order and concatenates the output.
pub(crate) fn render_nodes(
    env: &Environment<'_>,
    nodes: &[Node],
    pipeline: &Arc<Pipeline>,
    props: &Value,
) -> Result<String, Error> {
    let mut out = String::new();
    for node in nodes {
        let resolution = pipeline.resolve(node, pipeline).map_err(dispatch_failed)?;
        trace!(component = %resolution.component, "rendering node");

        let ctx = component_context(props, &resolution.state)?;
        let template = env.get_template(&resolution.component)?;
        out.push_str(&template.render(ctx)?);
    }
    Ok(out)
}

fn dispatch_failed(err: DispatchError) -> Error {
    Error::new(ErrorKind::InvalidOperation, err.to_string()).with_source(err)
}

/// The `contents(nodes, pipeline=..., props=..., **extra)` template function.
pub(crate) fn contents(
    state: &State,
    nodes: ViaDeserialize<Vec<Node>>,
    kwargs: Kwargs,
) -> Result<Value, Error> {
    let pipeline_arg = given(kwargs.get::<Option<Value>>("pipeline")?)
        .or_else(|| state.lookup("pipeline"))
        .unwrap_or_default();
    let pipeline = pipeline_from_value(&pipeline_arg).ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidOperation,
            "contents() needs a pipeline: pass pipeline=... or render from a component that has one",
        )
    })?;

    let props = given(kwargs.get::<Option<Value>>("props")?)
        .or_else(|| state.lookup("props"))
        .unwrap_or_default();

    let mut extra = Vec::new();
    for name in kwargs.args() {
        if name != "pipeline" && name != "props" {
            extra.push((name.to_string(), kwargs.get::<Value>(name)?));
        }
    }
    kwargs.assert_all_used()?;
    let props = extend_props(&props, extra)?;

    let html = render_nodes(state.env(), &nodes.0, &pipeline, &props)?;
    Ok(Value::from_safe_string(html))
}

/// Treats `none` and undefined like a missing argument.
fn given(value: Option<Value>) -> Option<Value> {
    value.filter(|v| !v.is_none() && !v.is_undefined())
}
