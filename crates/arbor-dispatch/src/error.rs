//! Errors raised by hooks and by resolution.

use thiserror::Error;

/// Error returned by a hook.
///
/// Hooks fail fast: the first error aborts resolution of the node and,
/// through the render loop, the whole render pass.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HookError {
    /// Human-readable error message
    pub message: String,
    /// The underlying error source, if any
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl HookError {
    /// Creates a new hook error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Sets the source error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        self.source = Some(source.into());
        self
    }
}

/// Error returned by [`Pipeline::resolve`](crate::Pipeline::resolve).
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A hook returned an error.
    #[error("hook #{position} failed on <{tag}>: {source}")]
    Hook {
        /// Registration index of the failing hook
        position: usize,
        /// Tag name of the node being resolved
        tag: String,
        #[source]
        source: HookError,
    },

    /// The synchronous resolver reached an async hook.
    ///
    /// Pipelines holding async hooks must be driven with
    /// [`Pipeline::resolve_async`](crate::Pipeline::resolve_async).
    #[error("hook #{position} is async and cannot run during synchronous resolution")]
    AsyncHook {
        /// Registration index of the async hook
        position: usize,
    },
}
