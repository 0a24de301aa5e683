//! Rendering pipelines that contain async hooks.
//!
//! MiniJinja renders synchronously, so a pipeline with [`AsyncHook`]s
//! cannot go through [`Host`](crate::Host). [`AsyncRenderer`] walks the tree
//! itself: every node is resolved with
//! [`Pipeline::resolve_async`](arbor_dispatch::Pipeline::resolve_async) and
//! rendered by an [`AsyncComponent`] before the next sibling starts.
//!
//! The built-in components produce the same markup as the host's
//! templates, so switching renderers does not change the output.
//!
//! [`AsyncHook`]: arbor_dispatch::AsyncHook

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use arbor_dispatch::{ComponentState, Node, Pipeline, ELEMENT_COMPONENT, TEXT_COMPONENT, VOID_COMPONENT};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::attributes::stringify_attributes;
use crate::context::{reserved_extra, RESERVED_NAMES};
use crate::error::RenderError;
use crate::util::{escape_html, is_void_element};

/// A component rendered by [`AsyncRenderer`].
#[async_trait]
pub trait AsyncComponent: Send + Sync {
    /// Renders one resolved node.
    async fn render(&self, call: &ComponentCall<'_>) -> Result<String, RenderError>;
}

/// Everything a component sees while rendering a node.
pub struct ComponentCall<'a> {
    renderer: &'a AsyncRenderer,
    state: &'a ComponentState,
    props: &'a Map<String, Value>,
}

impl<'a> ComponentCall<'a> {
    /// The node from the component state.
    pub fn node(&self) -> Option<&'a Node> {
        self.state.node.as_ref()
    }

    /// The pipeline from the component state.
    pub fn pipeline(&self) -> Option<&'a Arc<Pipeline>> {
        self.state.pipeline.as_ref()
    }

    /// The full component state.
    pub fn state(&self) -> &'a ComponentState {
        self.state
    }

    /// The ambient props.
    pub fn props(&self) -> &'a Map<String, Value> {
        self.props
    }

    /// Looks up a value, state extras first, then ambient props.
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.state.extra.get(key).or_else(|| self.props.get(key))
    }

    /// Renders `nodes` with the state's pipeline and the same ambient props.
    pub async fn contents(&self, nodes: &[Node]) -> Result<String, RenderError> {
        let pipeline = self.pipeline().ok_or_else(|| {
            RenderError::ContextError("component state has no pipeline for its children".into())
        })?;
        self.renderer.render_nodes(nodes, pipeline, self.props).await
    }

    /// Renders `nodes` with an explicitly chosen pipeline.
    pub async fn contents_with(
        &self,
        nodes: &[Node],
        pipeline: &Arc<Pipeline>,
    ) -> Result<String, RenderError> {
        self.renderer.render_nodes(nodes, pipeline, self.props).await
    }
}

struct TextComponent;

#[async_trait]
impl AsyncComponent for TextComponent {
    async fn render(&self, call: &ComponentCall<'_>) -> Result<String, RenderError> {
        Ok(match call.node() {
            Some(Node::Text(text)) => escape_html(&text.value),
            _ => String::new(),
        })
    }
}

struct VoidComponent;

#[async_trait]
impl AsyncComponent for VoidComponent {
    async fn render(&self, _call: &ComponentCall<'_>) -> Result<String, RenderError> {
        Ok(String::new())
    }
}

struct ElementComponent;

#[async_trait]
impl AsyncComponent for ElementComponent {
    async fn render(&self, call: &ComponentCall<'_>) -> Result<String, RenderError> {
        let el = call.node().and_then(Node::as_element).ok_or_else(|| {
            RenderError::ContextError(format!("{ELEMENT_COMPONENT} needs an element node"))
        })?;
        let attrs = stringify_attributes(&el.properties);
        if is_void_element(&el.tag_name) {
            return Ok(format!("<{}{}/>", el.tag_name, attrs));
        }
        let children = call.contents(&el.children).await?;
        Ok(format!("<{tag}{attrs}>{children}</{tag}>", tag = el.tag_name))
    }
}

/// Tree renderer that awaits async hooks and async components in order.
///
/// ```rust
/// use std::sync::Arc;
/// use arbor_dispatch::{async_trait, AsyncHook, Element, HookError, Node, Outcome, Pipeline};
/// use arbor_render::AsyncRenderer;
///
/// struct DropScripts;
///
/// #[async_trait]
/// impl AsyncHook for DropScripts {
///     async fn call(&self, el: &Element, _: &Arc<Pipeline>) -> Result<Outcome, HookError> {
///         Ok(if el.tag_name == "script" { Outcome::Skip } else { Outcome::Continue })
///     }
/// }
///
/// let pipeline = Arc::new(Pipeline::new().async_hook(DropScripts));
/// let nodes = vec![
///     Element::new("p").with_child(Node::text("kept")).into(),
///     Element::new("script").with_child(Node::text("alert(1)")).into(),
/// ];
///
/// let html = futures::executor::block_on(AsyncRenderer::new().render(&nodes, &pipeline)).unwrap();
/// assert_eq!(html, "<p>kept</p>");
/// ```
#[derive(Clone)]
pub struct AsyncRenderer {
    components: HashMap<String, Arc<dyn AsyncComponent>>,
}

impl AsyncRenderer {
    /// Creates a renderer with the built-in components.
    pub fn new() -> Self {
        let mut components: HashMap<String, Arc<dyn AsyncComponent>> = HashMap::new();
        components.insert(TEXT_COMPONENT.to_string(), Arc::new(TextComponent));
        components.insert(VOID_COMPONENT.to_string(), Arc::new(VoidComponent));
        components.insert(ELEMENT_COMPONENT.to_string(), Arc::new(ElementComponent));
        Self { components }
    }

    /// Registers a component, replacing any existing one with that name.
    pub fn component<C>(mut self, name: impl Into<String>, component: C) -> Self
    where
        C: AsyncComponent + 'static,
    {
        self.components.insert(name.into(), Arc::new(component));
        self
    }

    /// Returns true if a component with this name is registered.
    pub fn has_component(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Renders `nodes` with `pipeline` and no ambient props.
    pub async fn render(&self, nodes: &[Node], pipeline: &Arc<Pipeline>) -> Result<String, RenderError> {
        self.render_with_props(nodes, pipeline, &()).await
    }

    /// Renders `nodes` with `pipeline`, exposing `props` to every component.
    pub async fn render_with_props<P: Serialize>(
        &self,
        nodes: &[Node],
        pipeline: &Arc<Pipeline>,
        props: &P,
    ) -> Result<String, RenderError> {
        let props = props_map(serde_json::to_value(props)?)?;
        debug!(nodes = nodes.len(), hooks = pipeline.len(), "rendering tree asynchronously");
        self.render_nodes(nodes, pipeline, &props).await
    }

    fn render_nodes<'a>(
        &'a self,
        nodes: &'a [Node],
        pipeline: &'a Arc<Pipeline>,
        props: &'a Map<String, Value>,
    ) -> BoxFuture<'a, Result<String, RenderError>> {
        async move {
            let mut out = String::new();
            for node in nodes {
                let resolution = pipeline.resolve_async(node, pipeline).await?;
                trace!(component = %resolution.component, "rendering node");
                if let Some(name) = reserved_extra(&resolution.state) {
                    return Err(RenderError::ContextError(format!(
                        "'{name}' is reserved and cannot be an extra state value of `{}`",
                        resolution.component
                    )));
                }

                let component = self
                    .components
                    .get(&resolution.component)
                    .ok_or_else(|| RenderError::ComponentNotFound(resolution.component.clone()))?;
                let call = ComponentCall {
                    renderer: self,
                    state: &resolution.state,
                    props,
                };
                out.push_str(&component.render(&call).await?);
            }
            Ok(out)
        }
        .boxed()
    }
}

impl Default for AsyncRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AsyncRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.components.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("AsyncRenderer").field("components", &names).finish()
    }
}

fn props_map(value: Value) -> Result<Map<String, Value>, RenderError> {
    let map = match value {
        Value::Null => return Ok(Map::new()),
        Value::Object(map) => map,
        other => {
            return Err(RenderError::ContextError(format!(
                "props must be a map, got {other}"
            )))
        }
    };
    if let Some(name) = RESERVED_NAMES.iter().find(|name| map.contains_key(**name)) {
        return Err(RenderError::ContextError(format!(
            "'{name}' is reserved and cannot be passed as a prop"
        )));
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_dispatch::{AsyncHook, Element, HookError, Outcome};
    use futures::executor::block_on;
    use serde_json::json;
    use std::sync::Mutex;

    struct Recorder(Arc<Mutex<Vec<String>>>, &'static str);

    #[async_trait]
    impl AsyncHook for Recorder {
        async fn call(&self, el: &arbor_dispatch::Element, _: &Arc<Pipeline>) -> Result<Outcome, HookError> {
            futures::future::ready(()).await;
            self.0.lock().unwrap().push(format!("{}:{}", self.1, el.tag_name));
            Ok(Outcome::Continue)
        }
    }

    struct Badge;

    #[async_trait]
    impl AsyncComponent for Badge {
        async fn render(&self, call: &ComponentCall<'_>) -> Result<String, RenderError> {
            let label = call.get("label").and_then(Value::as_str).unwrap_or("?");
            let children = match call.node().and_then(Node::as_element) {
                Some(el) => call.contents(&el.children).await?,
                None => String::new(),
            };
            Ok(format!("[{label}|{children}]"))
        }
    }

    fn list() -> Vec<Node> {
        vec![Element::new("ul")
            .with_child(Element::new("li").with_child(Node::text("a & b")).into())
            .with_child(Element::new("br").into())
            .into()]
    }

    #[test]
    fn builtins_match_template_output() {
        let pipeline = Arc::new(Pipeline::new());
        let html = block_on(AsyncRenderer::new().render(&list(), &pipeline)).unwrap();
        assert_eq!(html, "<ul><li>a &amp; b</li><br/></ul>");
    }

    #[test]
    fn hooks_run_in_order_per_node() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Arc::new(
            Pipeline::new()
                .async_hook(Recorder(log.clone(), "first"))
                .async_hook(Recorder(log.clone(), "second")),
        );

        block_on(AsyncRenderer::new().render(&list(), &pipeline)).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            [
                "first:ul", "second:ul", "first:li", "second:li", "first:br", "second:br",
            ]
        );
    }

    #[test]
    fn custom_components_recurse() {
        let pipeline = Arc::new(Pipeline::new().hook(|el, pipeline| {
            if el.tag_name == "li" {
                let state = ComponentState::for_node(el.clone()).with("label", "item");
                return Ok(pipeline.component("badge", state));
            }
            Ok(Outcome::Continue)
        }));
        let renderer = AsyncRenderer::new().component("badge", Badge);
        assert!(renderer.has_component("badge"));

        let html = block_on(renderer.render(&list(), &pipeline)).unwrap();
        assert_eq!(html, "<ul>[item|a &amp; b]<br/></ul>");
    }

    #[test]
    fn props_are_visible_and_state_wins() {
        let pipeline = Arc::new(Pipeline::new().hook(|el, pipeline| {
            Ok(match el.tag_name.as_str() {
                "li" => pipeline.component("badge", ComponentState::for_node(el.clone())),
                "br" => pipeline.component(
                    "badge",
                    ComponentState::for_node(el.clone()).with("label", "own"),
                ),
                _ => Outcome::Continue,
            })
        }));
        let renderer = AsyncRenderer::new().component("badge", Badge);

        let html = block_on(renderer.render_with_props(&list(), &pipeline, &json!({"label": "ambient"})))
            .unwrap();
        assert_eq!(html, "<ul>[ambient|a &amp; b][own|]</ul>");
    }

    #[test]
    fn missing_component_is_an_error() {
        let pipeline = Arc::new(
            Pipeline::new().hook(|el, p| Ok(p.component("nope", ComponentState::for_node(el.clone())))),
        );
        let err = block_on(AsyncRenderer::new().render(&list(), &pipeline)).unwrap_err();
        assert!(matches!(err, RenderError::ComponentNotFound(name) if name == "nope"));
    }

    #[test]
    fn reserved_and_non_map_props_are_rejected() {
        let pipeline = Arc::new(Pipeline::new());
        let renderer = AsyncRenderer::new();
        for props in [json!({"node": 1}), json!([1])] {
            let err = block_on(renderer.render_with_props(&[], &pipeline, &props)).unwrap_err();
            assert!(matches!(err, RenderError::ContextError(_)), "{props}");
        }
    }

    #[test]
    fn debug_lists_components() {
        let debug = format!("{:?}", AsyncRenderer::new());
        assert!(debug.contains("arbor_element"));
        assert!(debug.contains("arbor_text"));
    }
}
