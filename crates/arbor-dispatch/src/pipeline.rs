//! The hook chain that decides which component renders a node.
//!
//! A [`Pipeline`] holds hooks in registration order. For every element node
//! the hooks are consulted in that order and the first one that returns
//! something other than [`Outcome::Continue`] wins:
//!
//! ```text
//! text node     → arbor_text      { node }            (hooks never run)
//! Skip          → arbor_void      { }
//! Use(c)        → c.name          c.state             (verbatim)
//! no decision   → arbor_element   { node, pipeline }
//! ```
//!
//! Registration order is the only precedence mechanism. Hooks receive the
//! pipeline the caller passed to [`Pipeline::resolve`], which need not be the
//! pipeline doing the resolving; that is how a subtree gets rendered with a
//! different rule set.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use arbor_dispatch::{ComponentState, Node, Outcome, Pipeline};
//!
//! let pipeline = Arc::new(
//!     Pipeline::new()
//!         .hook(|node, pipeline| {
//!             if node.tag_name == "pre" {
//!                 return Ok(pipeline.component("pre", ComponentState::for_node(node.clone())));
//!             }
//!             Ok(Outcome::Continue)
//!         })
//!         .hook(|node, _| {
//!             Ok(if node.tag_name == "script" { Outcome::Skip } else { Outcome::Continue })
//!         }),
//! );
//!
//! let resolved = pipeline.resolve(&Node::element("script"), &pipeline).unwrap();
//! assert_eq!(resolved.component, arbor_dispatch::VOID_COMPONENT);
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, trace};

use crate::error::{DispatchError, HookError};
use crate::node::{Element, Node};

/// Component used for every text node.
pub const TEXT_COMPONENT: &str = "arbor_text";

/// Component used for skipped nodes. Renders nothing.
pub const VOID_COMPONENT: &str = "arbor_void";

/// Component used when no hook claims an element.
pub const ELEMENT_COMPONENT: &str = "arbor_element";

/// Type alias for synchronous hook functions.
pub type HookFn =
    Arc<dyn Fn(&Element, &Arc<Pipeline>) -> Result<Outcome, HookError> + Send + Sync>;

/// A hook whose decision is computed asynchronously.
///
/// Async hooks are awaited in registration order by
/// [`Pipeline::resolve_async`]; the next hook is not consulted until the
/// previous one has settled.
#[async_trait]
pub trait AsyncHook: Send + Sync {
    /// Decides the outcome for an element node.
    async fn call(&self, node: &Element, pipeline: &Arc<Pipeline>) -> Result<Outcome, HookError>;
}

/// The decision a hook makes for a node.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// No decision, fall through to the next hook.
    Continue,
    /// Render nothing for the node and its subtree.
    Skip,
    /// Render the node with the given component.
    Use(Component),
}

/// A component name plus the state it is rendered with.
#[derive(Debug, Clone)]
pub struct Component {
    /// Registered component name.
    pub name: String,
    /// State handed to the component.
    pub state: ComponentState,
}

impl Component {
    /// Creates a component reference.
    pub fn new(name: impl Into<String>, state: ComponentState) -> Self {
        Self {
            name: name.into(),
            state,
        }
    }
}

/// State bag a component is rendered with.
///
/// `node` and `pipeline` are typed slots because the render loop needs them
/// for recursion; everything else lives in `extra`.
#[derive(Debug, Clone, Default)]
pub struct ComponentState {
    /// The node being rendered, exposed to templates as `node`.
    pub node: Option<Node>,
    /// Pipeline for rendering children, exposed to templates as `pipeline`.
    pub pipeline: Option<Arc<Pipeline>>,
    /// Additional values, exposed to templates under their own names.
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ComponentState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a state carrying the given node.
    pub fn for_node(node: impl Into<Node>) -> Self {
        Self {
            node: Some(node.into()),
            ..Self::default()
        }
    }

    /// Sets the pipeline used to render the node's children.
    pub fn with_pipeline(mut self, pipeline: Arc<Pipeline>) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Adds an extra value.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Adds an extra value from anything serializable.
    ///
    /// ```rust
    /// use arbor_dispatch::ComponentState;
    ///
    /// #[derive(serde::Serialize)]
    /// struct Lang { name: &'static str }
    ///
    /// let state = ComponentState::new().try_with("lang", Lang { name: "rust" }).unwrap();
    /// assert_eq!(state.extra["lang"]["name"], "rust");
    /// ```
    pub fn try_with(
        mut self,
        key: impl Into<String>,
        value: impl Serialize,
    ) -> Result<Self, serde_json::Error> {
        self.extra.insert(key.into(), serde_json::to_value(value)?);
        Ok(self)
    }

    /// Returns true if neither a node, a pipeline nor extra values are set.
    pub fn is_empty(&self) -> bool {
        self.node.is_none() && self.pipeline.is_none() && self.extra.is_empty()
    }
}

/// The component chosen for a node and its state.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Name of the component to render.
    pub component: String,
    /// State to render it with.
    pub state: ComponentState,
}

impl Resolution {
    fn text(node: &Node) -> Self {
        Self {
            component: TEXT_COMPONENT.to_string(),
            state: ComponentState::for_node(node.clone()),
        }
    }

    fn void() -> Self {
        Self {
            component: VOID_COMPONENT.to_string(),
            state: ComponentState::new(),
        }
    }

    fn element(node: &Node, pipeline: &Arc<Pipeline>) -> Self {
        Self {
            component: ELEMENT_COMPONENT.to_string(),
            state: ComponentState::for_node(node.clone()).with_pipeline(Arc::clone(pipeline)),
        }
    }

    /// Returns true if this resolution renders nothing.
    pub fn is_void(&self) -> bool {
        self.component == VOID_COMPONENT
    }
}

#[derive(Clone)]
enum Hook {
    Sync(HookFn),
    Async(Arc<dyn AsyncHook>),
}

/// Ordered hook chain deciding the component for each node.
///
/// Build it with the chainable [`hook`](Self::hook) and
/// [`async_hook`](Self::async_hook) methods, then share it as
/// `Arc<Pipeline>`. Once shared, the chain can no longer change.
#[derive(Clone, Default)]
pub struct Pipeline {
    hooks: Vec<Hook>,
}

impl Pipeline {
    /// Creates a pipeline with no hooks.
    ///
    /// Every element resolves to the default element component.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a synchronous hook.
    ///
    /// Later hooks are only reached when every earlier hook returns
    /// [`Outcome::Continue`].
    pub fn hook<F>(mut self, f: F) -> Self
    where
        F: Fn(&Element, &Arc<Pipeline>) -> Result<Outcome, HookError> + Send + Sync + 'static,
    {
        self.hooks.push(Hook::Sync(Arc::new(f)));
        self
    }

    /// Appends an asynchronous hook.
    pub fn async_hook<H>(mut self, hook: H) -> Self
    where
        H: AsyncHook + 'static,
    {
        self.hooks.push(Hook::Async(Arc::new(hook)));
        self
    }

    /// Returns the number of registered hooks.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Returns true if no hooks are registered.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Returns true if any registered hook is async.
    pub fn has_async_hooks(&self) -> bool {
        self.hooks.iter().any(|h| matches!(h, Hook::Async(_)))
    }

    /// Wraps a component with a back-reference to this pipeline.
    ///
    /// Use it from hooks that want their component to render children with
    /// the same rule set. A pipeline already present in `state` is kept.
    pub fn component(self: &Arc<Self>, name: impl Into<String>, state: ComponentState) -> Outcome {
        let state = match state.pipeline {
            Some(_) => state,
            None => state.with_pipeline(Arc::clone(self)),
        };
        Outcome::Use(Component::new(name, state))
    }

    /// Decides the component for `node`.
    ///
    /// `pipeline` is handed to every hook and stored in the default element
    /// state, so children are rendered with it.
    ///
    /// # Errors
    ///
    /// Returns the first hook error, or [`DispatchError::AsyncHook`] when an
    /// async hook is reached before any sync hook decided.
    pub fn resolve(&self, node: &Node, pipeline: &Arc<Pipeline>) -> Result<Resolution, DispatchError> {
        let el = match node {
            Node::Text(_) => return Ok(Resolution::text(node)),
            Node::Element(el) => el,
        };

        for (position, hook) in self.hooks.iter().enumerate() {
            let outcome = match hook {
                Hook::Sync(f) => f(el, pipeline).map_err(|source| hook_failed(position, el, source))?,
                Hook::Async(_) => return Err(DispatchError::AsyncHook { position }),
            };
            if let Some(resolution) = settle(outcome, position, el) {
                return Ok(resolution);
            }
        }

        trace!(tag = %el.tag_name, "no hook claimed node, using element component");
        Ok(Resolution::element(node, pipeline))
    }

    /// Decides the component for `node`, awaiting async hooks in order.
    ///
    /// Follows exactly the rules of [`resolve`](Self::resolve); sync hooks
    /// run inline.
    pub async fn resolve_async(
        &self,
        node: &Node,
        pipeline: &Arc<Pipeline>,
    ) -> Result<Resolution, DispatchError> {
        let el = match node {
            Node::Text(_) => return Ok(Resolution::text(node)),
            Node::Element(el) => el,
        };

        for (position, hook) in self.hooks.iter().enumerate() {
            let outcome = match hook {
                Hook::Sync(f) => f(el, pipeline),
                Hook::Async(h) => h.call(el, pipeline).await,
            }
            .map_err(|source| hook_failed(position, el, source))?;
            if let Some(resolution) = settle(outcome, position, el) {
                return Ok(resolution);
            }
        }

        trace!(tag = %el.tag_name, "no hook claimed node, using element component");
        Ok(Resolution::element(node, pipeline))
    }
}

fn settle(outcome: Outcome, position: usize, el: &Element) -> Option<Resolution> {
    match outcome {
        Outcome::Continue => None,
        Outcome::Skip => {
            debug!(position, tag = %el.tag_name, "hook skipped node");
            Some(Resolution::void())
        }
        Outcome::Use(component) => {
            debug!(position, tag = %el.tag_name, component = %component.name, "hook selected component");
            Some(Resolution {
                component: component.name,
                state: component.state,
            })
        }
    }
}

fn hook_failed(position: usize, el: &Element, source: HookError) -> DispatchError {
    DispatchError::Hook {
        position,
        tag: el.tag_name.clone(),
        source,
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let async_count = self
            .hooks
            .iter()
            .filter(|h| matches!(h, Hook::Async(_)))
            .count();
        f.debug_struct("Pipeline")
            .field("hook_count", &self.hooks.len())
            .field("async_hook_count", &async_count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn pre() -> Node {
        Element::new("pre")
            .with_child(Element::new("code").with_child(Node::text("let a = 1;")).into())
            .into()
    }

    #[test]
    fn text_nodes_never_reach_hooks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let pipeline = Arc::new(Pipeline::new().hook(move |_, _| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(Outcome::Skip)
        }));

        let resolved = pipeline.resolve(&Node::text("hello"), &pipeline).unwrap();

        assert_eq!(resolved.component, TEXT_COMPONENT);
        assert_eq!(resolved.state.node, Some(Node::text("hello")));
        assert!(resolved.state.pipeline.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn empty_pipeline_falls_back_to_element() {
        let pipeline = Arc::new(Pipeline::new());
        let node = pre();

        let resolved = pipeline.resolve(&node, &pipeline).unwrap();

        assert_eq!(resolved.component, ELEMENT_COMPONENT);
        assert_eq!(resolved.state.node.as_ref(), Some(&node));
        assert!(Arc::ptr_eq(resolved.state.pipeline.as_ref().unwrap(), &pipeline));
        assert!(resolved.state.extra.is_empty());
    }

    #[test]
    fn all_continue_falls_back_to_element() {
        let pipeline = Arc::new(
            Pipeline::new()
                .hook(|_, _| Ok(Outcome::Continue))
                .hook(|_, _| Ok(Outcome::Continue)),
        );
        let resolved = pipeline.resolve(&pre(), &pipeline).unwrap();
        assert_eq!(resolved.component, ELEMENT_COMPONENT);
    }

    #[test]
    fn skip_resolves_to_void_with_empty_state() {
        let pipeline = Arc::new(Pipeline::new().hook(|node, _| {
            Ok(if node.tag_name == "pre" { Outcome::Skip } else { Outcome::Continue })
        }));

        let resolved = pipeline.resolve(&pre(), &pipeline).unwrap();
        assert!(resolved.is_void());
        assert!(resolved.state.is_empty());

        let other = pipeline.resolve(&Node::element("p"), &pipeline).unwrap();
        assert_eq!(other.component, ELEMENT_COMPONENT);
    }

    #[test]
    fn use_state_is_returned_verbatim() {
        let pipeline = Arc::new(Pipeline::new().hook(|_, _| {
            Ok(Outcome::Use(Component::new(
                "badge",
                ComponentState::new().with("label", "new"),
            )))
        }));

        let resolved = pipeline.resolve(&pre(), &pipeline).unwrap();

        assert_eq!(resolved.component, "badge");
        assert!(resolved.state.node.is_none());
        assert!(resolved.state.pipeline.is_none());
        assert_eq!(resolved.state.extra["label"], "new");
    }

    #[test]
    fn first_registered_hook_wins() {
        let first = |_: &Element, _: &Arc<Pipeline>| {
            Ok::<_, HookError>(Outcome::Use(Component::new("first", ComponentState::new())))
        };
        let second = |_: &Element, _: &Arc<Pipeline>| {
            Ok::<_, HookError>(Outcome::Use(Component::new("second", ComponentState::new())))
        };

        let forward = Arc::new(Pipeline::new().hook(first).hook(second));
        let reverse = Arc::new(Pipeline::new().hook(second).hook(first));

        assert_eq!(forward.resolve(&pre(), &forward).unwrap().component, "first");
        assert_eq!(reverse.resolve(&pre(), &reverse).unwrap().component, "second");
    }

    #[test]
    fn later_hooks_are_not_called_after_a_decision() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let pipeline = Arc::new(Pipeline::new().hook(|_, _| Ok(Outcome::Skip)).hook(
            move |_, _| {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(Outcome::Continue)
            },
        ));

        pipeline.resolve(&pre(), &pipeline).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn hooks_receive_the_pipeline_passed_in() {
        let secondary = Arc::new(Pipeline::new());
        let expected = secondary.clone();
        let primary = Arc::new(Pipeline::new().hook(move |_, pipeline| {
            assert!(Arc::ptr_eq(pipeline, &expected));
            Ok(Outcome::Continue)
        }));

        let resolved = primary.resolve(&pre(), &secondary).unwrap();
        assert!(Arc::ptr_eq(resolved.state.pipeline.as_ref().unwrap(), &secondary));
    }

    #[test]
    fn component_injects_back_reference() {
        let pipeline = Arc::new(Pipeline::new().hook(|node, pipeline| {
            Ok(pipeline.component("pre", ComponentState::for_node(node.clone())))
        }));

        let resolved = pipeline.resolve(&pre(), &pipeline).unwrap();

        assert_eq!(resolved.component, "pre");
        assert_eq!(resolved.state.node, Some(pre()));
        assert!(Arc::ptr_eq(resolved.state.pipeline.as_ref().unwrap(), &pipeline));
    }

    #[test]
    fn component_keeps_explicit_pipeline() {
        let other = Arc::new(Pipeline::new());
        let pipeline = Arc::new(Pipeline::new());

        let outcome = pipeline.component("pre", ComponentState::new().with_pipeline(other.clone()));

        match outcome {
            Outcome::Use(c) => assert!(Arc::ptr_eq(c.state.pipeline.as_ref().unwrap(), &other)),
            unexpected => panic!("expected Use, got {:?}", unexpected),
        }
    }

    #[test]
    fn hook_error_aborts_resolution() {
        let pipeline = Arc::new(
            Pipeline::new()
                .hook(|_, _| Ok(Outcome::Continue))
                .hook(|_, _| Err(HookError::new("highlighter crashed")))
                .hook(|_, _| panic!("should not be called")),
        );

        let err = pipeline.resolve(&pre(), &pipeline).unwrap_err();
        match err {
            DispatchError::Hook { position, tag, source } => {
                assert_eq!(position, 1);
                assert_eq!(tag, "pre");
                assert_eq!(source.message, "highlighter crashed");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    struct AsyncSkip;

    #[async_trait]
    impl AsyncHook for AsyncSkip {
        async fn call(&self, _: &Element, _: &Arc<Pipeline>) -> Result<Outcome, HookError> {
            Ok(Outcome::Skip)
        }
    }

    #[test]
    fn sync_resolve_rejects_async_hooks() {
        let pipeline = Arc::new(
            Pipeline::new()
                .hook(|_, _| Ok(Outcome::Continue))
                .async_hook(AsyncSkip),
        );
        assert!(pipeline.has_async_hooks());

        let err = pipeline.resolve(&pre(), &pipeline).unwrap_err();
        assert!(matches!(err, DispatchError::AsyncHook { position: 1 }));

        // Text nodes still resolve, hooks are never consulted for them
        let text = pipeline.resolve(&Node::text("x"), &pipeline).unwrap();
        assert_eq!(text.component, TEXT_COMPONENT);
    }

    #[test]
    fn sync_decision_before_async_hook_is_fine() {
        let pipeline = Arc::new(Pipeline::new().hook(|_, _| Ok(Outcome::Skip)).async_hook(AsyncSkip));
        assert!(pipeline.resolve(&pre(), &pipeline).unwrap().is_void());
    }

    #[test]
    fn resolve_async_runs_both_kinds() {
        let pipeline = Arc::new(
            Pipeline::new()
                .hook(|node, _| {
                    Ok(if node.tag_name == "p" {
                        Outcome::Use(Component::new("para", ComponentState::new()))
                    } else {
                        Outcome::Continue
                    })
                })
                .async_hook(AsyncSkip),
        );

        let p = futures::executor::block_on(pipeline.resolve_async(&Node::element("p"), &pipeline)).unwrap();
        assert_eq!(p.component, "para");

        let pre = futures::executor::block_on(pipeline.resolve_async(&pre(), &pipeline)).unwrap();
        assert!(pre.is_void());
    }

    #[test]
    fn state_values_that_cannot_serialize_are_errors() {
        use std::collections::BTreeMap;

        let state = ComponentState::new().try_with("spans", vec![1, 2]).unwrap();
        assert_eq!(state.extra["spans"], serde_json::json!([1, 2]));

        let tuple_keys = BTreeMap::from([((1, 2), "cell")]);
        assert!(ComponentState::new().try_with("cells", tuple_keys).is_err());
    }

    #[test]
    fn pipeline_debug_shows_counts() {
        let pipeline = Pipeline::new().hook(|_, _| Ok(Outcome::Continue)).async_hook(AsyncSkip);
        let debug = format!("{:?}", pipeline);
        assert!(debug.contains("hook_count: 2"));
        assert!(debug.contains("async_hook_count: 1"));
        assert_eq!(pipeline.len(), 2);
        assert!(!Pipeline::new().has_async_hooks());
        assert!(Pipeline::new().is_empty());
    }
}
