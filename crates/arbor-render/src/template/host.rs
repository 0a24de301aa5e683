//! The minijinja host that renders trees.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use arbor_dispatch::{Node, Pipeline};
use minijinja::{AutoEscape, Environment};
use serde::Serialize;
use tracing::debug;

use super::components::register_builtins;
use super::contents::render_nodes;
use super::loader::component_loader;
use crate::context::{ambient_props, pipeline_value};
use crate::error::RenderError;

/// Renders node trees through a pipeline and minijinja components.
///
/// A host owns the component templates. Pipelines are not stored in it:
/// every render call names the pipeline to use, so one host can serve any
/// number of rule sets.
///
/// Auto-escaping is off for all templates. Component output is markup, and
/// text is escaped explicitly with the `escape_html` filter.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use arbor_dispatch::{ComponentState, Element, Node, Pipeline};
/// use arbor_render::Host;
///
/// let mut host = Host::new().unwrap();
/// host.add_component("shout", "<strong>{{ contents(node.children) }}!</strong>").unwrap();
///
/// let pipeline = Arc::new(Pipeline::new().hook(|el, pipeline| {
///     if el.tag_name == "em" {
///         return Ok(pipeline.component("shout", ComponentState::for_node(el.clone())));
///     }
///     Ok(arbor_dispatch::Outcome::Continue)
/// }));
///
/// let nodes = vec![Element::new("p")
///     .with_child(Node::text("Stop "))
///     .with_child(Element::new("em").with_child(Node::text("now")).into())
///     .into()];
///
/// let html = host.render(&nodes, &pipeline).unwrap();
/// assert_eq!(html, "<p>Stop <strong>now!</strong></p>");
/// ```
pub struct Host {
    env: Environment<'static>,
}

impl Host {
    /// Creates a host with the built-in components registered.
    pub fn new() -> Result<Self, RenderError> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::None);
        register_builtins(&mut env)?;
        Ok(Self { env })
    }

    /// Registers a component template under `name`.
    ///
    /// Registering a built-in name (`arbor_element`, ...) replaces the
    /// built-in.
    pub fn add_component(
        &mut self,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<(), RenderError> {
        self.env.add_template_owned(name.into(), source.into())?;
        Ok(())
    }

    /// Loads components on demand from a directory.
    ///
    /// Components added with [`add_component`](Self::add_component) take
    /// precedence over files. See
    /// [`COMPONENT_EXTENSIONS`](crate::template::COMPONENT_EXTENSIONS) for
    /// the recognized file names.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory doesn't exist.
    pub fn set_component_dir(&mut self, dir: impl AsRef<Path>) -> Result<(), RenderError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(RenderError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("component directory not found: {}", dir.display()),
            )));
        }
        debug!(dir = %dir.display(), "using component directory");
        self.env.set_loader(component_loader(dir.to_path_buf()));
        Ok(())
    }

    /// Returns true if a component with this name can be rendered.
    pub fn has_component(&self, name: &str) -> bool {
        self.env.get_template(name).is_ok()
    }

    /// Makes a pipeline available to all templates under `name`.
    ///
    /// Page templates use it to render a subtree with a specific rule set:
    /// `{{ contents(toc, pipeline=toc_pipeline) }}`.
    pub fn add_pipeline_global(&mut self, name: impl Into<String>, pipeline: &Arc<Pipeline>) {
        self.env.add_global(name.into(), pipeline_value(pipeline));
    }

    /// Returns a reference to the underlying MiniJinja environment.
    pub fn environment(&self) -> &Environment<'static> {
        &self.env
    }

    /// Returns a mutable reference to the underlying MiniJinja environment.
    ///
    /// This allows registering extra filters and functions for components.
    pub fn environment_mut(&mut self) -> &mut Environment<'static> {
        &mut self.env
    }

    /// Renders `nodes` with `pipeline` and no ambient props.
    pub fn render(&self, nodes: &[Node], pipeline: &Arc<Pipeline>) -> Result<String, RenderError> {
        self.render_with_props(nodes, pipeline, &())
    }

    /// Renders `nodes` with `pipeline`, exposing `props` to every component.
    ///
    /// `props` must serialize to a map. Its entries are visible in all
    /// components of the tree, except where a component's own state uses
    /// the same name.
    ///
    /// # Errors
    ///
    /// Fails on the first hook error, missing component or template error.
    /// No partial output is returned.
    pub fn render_with_props<P: Serialize>(
        &self,
        nodes: &[Node],
        pipeline: &Arc<Pipeline>,
        props: &P,
    ) -> Result<String, RenderError> {
        let props = ambient_props(props)?;
        debug!(nodes = nodes.len(), hooks = pipeline.len(), "rendering tree");
        Ok(render_nodes(&self.env, nodes, pipeline, &props)?)
    }

    /// Renders a named page template with an arbitrary context.
    ///
    /// The template can call `contents(...)` with node lists from the
    /// context and pipelines from [`pipeline_value`] or
    /// [`add_pipeline_global`](Self::add_pipeline_global).
    pub fn render_template<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, RenderError> {
        let template = self.env.get_template(name)?;
        Ok(template.render(ctx)?)
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let components: Vec<&str> = self.env.templates().map(|(name, _)| name).collect();
        f.debug_struct("Host").field("components", &components).finish()
    }
}
