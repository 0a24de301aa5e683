//! Building the context a component template is rendered with.
//!
//! Every component sees two layers of values:
//!
//! 1. **Ambient props**: a map handed down from the caller of the render
//!    loop. Each entry becomes a top-level template variable.
//! 2. **Component state**: `node`, `pipeline` and the state's extra values.
//!
//! The state is applied last, so it wins on every key conflict. The ambient
//! map itself is also exposed as `props`, which is how the element component
//! forwards it unchanged to the node's children.
//!
//! ```text
//! props  { lang: "en", node: ... }   →  lang, props          (node is reserved)
//! state  { node, pipeline, lang }    →  node, pipeline, lang (state wins)
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use arbor_dispatch::{ComponentState, Pipeline};
use minijinja::value::{Object, ObjectRepr, ValueKind};
use minijinja::{Error, ErrorKind, Value};
use serde::Serialize;
use tracing::trace;

use crate::error::RenderError;

/// Names the render loop owns. They never come from ambient props.
pub const RESERVED_NAMES: &[&str] = &["node", "pipeline", "props"];

/// A pipeline as seen by templates.
///
/// Templates only pass it around (`contents(..., pipeline=pipeline)`); the
/// render loop takes the `Arc` back out. `pipeline.hook_count` is readable
/// for debugging.
#[derive(Debug)]
pub struct PipelineValue(pub Arc<Pipeline>);

impl Object for PipelineValue {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Plain
    }

    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        match key.as_str()? {
            "hook_count" => Some(Value::from(self.0.len())),
            _ => None,
        }
    }

    fn render(self: &Arc<Self>, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<pipeline of {} hooks>", self.0.len())
    }
}

/// Wraps a pipeline so it can be placed in a template context.
///
/// Use it to hand a secondary pipeline to page templates rendered with
/// [`Host::render_template`](crate::Host::render_template).
pub fn pipeline_value(pipeline: &Arc<Pipeline>) -> Value {
    Value::from_object(PipelineValue(Arc::clone(pipeline)))
}

/// Extracts the pipeline from a template value.
pub(crate) fn pipeline_from_value(value: &Value) -> Option<Arc<Pipeline>> {
    value
        .downcast_object_ref::<PipelineValue>()
        .map(|wrapped| Arc::clone(&wrapped.0))
}

/// Serializes caller-supplied props into the ambient map.
///
/// `()` and `None` give an empty map. Anything else must serialize to a map
/// whose keys avoid [`RESERVED_NAMES`].
pub fn ambient_props<P: Serialize>(props: &P) -> Result<Value, RenderError> {
    let value = Value::from_serialize(props);
    if value.is_none() || value.is_undefined() {
        return Ok(Value::from(BTreeMap::<String, Value>::new()));
    }
    if value.kind() != ValueKind::Map {
        return Err(RenderError::ContextError(format!(
            "props must be a map, got {}",
            value.kind()
        )));
    }

    let keys = value.try_iter().map_err(RenderError::from)?;
    for key in keys {
        if let Some(name) = key.as_str() {
            if RESERVED_NAMES.contains(&name) {
                return Err(RenderError::ContextError(format!(
                    "'{name}' is reserved and cannot be passed as a prop"
                )));
            }
        }
    }
    Ok(value)
}

/// Layers `extra` over `props`, for `contents(..., key=value)` calls.
pub(crate) fn extend_props(props: &Value, extra: Vec<(String, Value)>) -> Result<Value, Error> {
    if extra.is_empty() {
        return Ok(props.clone());
    }
    let mut merged = map_entries(props)?;
    merged.extend(extra);
    Ok(Value::from(merged))
}

/// Returns the first reserved name a component state uses as an extra value.
pub(crate) fn reserved_extra(state: &ComponentState) -> Option<&'static str> {
    RESERVED_NAMES
        .iter()
        .copied()
        .find(|name| state.extra.contains_key(*name))
}

/// Builds the context for one component: ambient props, then state on top.
pub(crate) fn component_context(
    props: &Value,
    state: &ComponentState,
) -> Result<BTreeMap<String, Value>, Error> {
    if let Some(name) = reserved_extra(state) {
        return Err(Error::new(
            ErrorKind::InvalidOperation,
            format!("'{name}' is reserved and cannot be an extra state value"),
        ));
    }

    let mut ctx = map_entries(props)?;
    ctx.retain(|name, _| {
        let reserved = RESERVED_NAMES.contains(&name.as_str());
        if reserved {
            trace!(prop = %name, "ignoring reserved name in ambient props");
        }
        !reserved
    });
    ctx.insert("props".to_string(), props.clone());

    if let Some(node) = &state.node {
        ctx.insert("node".to_string(), Value::from_serialize(node));
    }
    if let Some(pipeline) = &state.pipeline {
        ctx.insert("pipeline".to_string(), pipeline_value(pipeline));
    }
    for (key, value) in &state.extra {
        ctx.insert(key.clone(), Value::from_serialize(value));
    }
    Ok(ctx)
}

fn map_entries(props: &Value) -> Result<BTreeMap<String, Value>, Error> {
    if props.is_undefined() || props.is_none() {
        return Ok(BTreeMap::new());
    }
    if props.kind() != ValueKind::Map {
        return Err(Error::new(
            ErrorKind::InvalidOperation,
            format!("props must be a map, got {}", props.kind()),
        ));
    }

    let mut entries = BTreeMap::new();
    for key in props.try_iter()? {
        let value = props.get_item(&key)?;
        entries.insert(key.to_string(), value);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_dispatch::Node;
    use serde_json::json;

    fn props(value: serde_json::Value) -> Value {
        ambient_props(&value).unwrap()
    }

    #[test]
    fn unit_props_are_empty() {
        let value = ambient_props(&()).unwrap();
        assert_eq!(value.len(), Some(0));
    }

    #[test]
    fn non_map_props_are_rejected() {
        let err = ambient_props(&vec![1, 2]).unwrap_err();
        assert!(matches!(err, RenderError::ContextError(_)));
    }

    #[test]
    fn reserved_props_are_rejected() {
        for name in RESERVED_NAMES {
            let bad = BTreeMap::from([(name.to_string(), 1)]);
            let err = ambient_props(&bad).unwrap_err();
            assert!(err.to_string().contains("reserved"), "{name}");
        }
    }

    #[test]
    fn state_wins_over_props() {
        let ambient = props(json!({"lang": "en", "theme": "dark"}));
        let state = ComponentState::for_node(Node::text("hi")).with("lang", "fr");

        let ctx = component_context(&ambient, &state).unwrap();

        assert_eq!(ctx["lang"].as_str(), Some("fr"));
        assert_eq!(ctx["theme"].as_str(), Some("dark"));
        assert_eq!(ctx["props"], ambient);
        assert!(ctx.contains_key("node"));
        assert!(!ctx.contains_key("pipeline"));
    }

    #[test]
    fn pipeline_round_trips_through_value() {
        let pipeline = Arc::new(Pipeline::new());
        let value = pipeline_value(&pipeline);
        let back = pipeline_from_value(&value).unwrap();
        assert!(Arc::ptr_eq(&back, &pipeline));
        assert!(pipeline_from_value(&Value::from("nope")).is_none());
        assert_eq!(value.get_attr("hook_count").unwrap(), Value::from(0));
    }

    #[test]
    fn extend_props_layers_extra_values() {
        let ambient = props(json!({"depth": 1, "lang": "en"}));
        let merged = extend_props(&ambient, vec![("depth".into(), Value::from(2))]).unwrap();
        assert_eq!(merged.get_attr("depth").unwrap(), Value::from(2));
        assert_eq!(merged.get_attr("lang").unwrap().as_str(), Some("en"));
    }

    #[test]
    fn reserved_names_in_state_extras_are_errors() {
        for name in RESERVED_NAMES {
            let state = ComponentState::for_node(Node::text("hi")).with(*name, "plain");
            let err = component_context(&Value::UNDEFINED, &state).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidOperation);
            assert!(err.to_string().contains(name), "{err}");
        }
    }

    #[test]
    fn non_map_props_in_templates_are_errors() {
        let err = component_context(&Value::from(3), &ComponentState::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    }
}
