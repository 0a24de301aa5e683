//! Error types for tree rendering.
//!
//! This module provides [`RenderError`], the error type of every render entry
//! point. It abstracts over minijinja's errors and over dispatch failures
//! raised by hooks deep inside a recursive render.

use std::fmt;

use arbor_dispatch::DispatchError;

/// Error type for rendering operations.
///
/// A render call is all-or-nothing: when any of these is returned, no partial
/// output is handed back.
#[derive(Debug)]
pub enum RenderError {
    /// Component template syntax error or evaluation failure.
    TemplateError(String),

    /// A resolved component name has no registered template.
    ComponentNotFound(String),

    /// A hook failed, or the pipeline could not resolve a node.
    Dispatch(String),

    /// Data serialization error.
    SerializationError(String),

    /// Error while building the render context (props, reserved names).
    ContextError(String),

    /// I/O error (e.g., reading a component directory).
    IoError(std::io::Error),

    /// Other operational error.
    OperationError(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::TemplateError(msg) => write!(f, "template error: {}", msg),
            RenderError::ComponentNotFound(name) => write!(f, "component not found: {}", name),
            RenderError::Dispatch(msg) => write!(f, "dispatch error: {}", msg),
            RenderError::SerializationError(msg) => write!(f, "serialization error: {}", msg),
            RenderError::ContextError(msg) => write!(f, "context error: {}", msg),
            RenderError::IoError(err) => write!(f, "I/O error: {}", err),
            RenderError::OperationError(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        RenderError::IoError(err)
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::SerializationError(err.to_string())
    }
}

impl From<DispatchError> for RenderError {
    fn from(err: DispatchError) -> Self {
        RenderError::Dispatch(err.to_string())
    }
}

/// Finds a dispatch failure carried as the source of an engine error.
fn dispatch_source(err: &minijinja::Error) -> Option<&DispatchError> {
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        if let Some(dispatch) = inner.downcast_ref::<DispatchError>() {
            return Some(dispatch);
        }
        source = inner.source();
    }
    None
}

impl From<minijinja::Error> for RenderError {
    fn from(err: minijinja::Error) -> Self {
        use minijinja::ErrorKind;

        if let Some(dispatch) = dispatch_source(&err) {
            return RenderError::Dispatch(dispatch.to_string());
        }

        match err.kind() {
            ErrorKind::TemplateNotFound => RenderError::ComponentNotFound(err.to_string()),
            ErrorKind::SyntaxError
            | ErrorKind::BadEscape
            | ErrorKind::UndefinedError
            | ErrorKind::UnknownTest
            | ErrorKind::UnknownFunction
            | ErrorKind::UnknownFilter
            | ErrorKind::UnknownMethod
            | ErrorKind::MissingArgument
            | ErrorKind::TooManyArguments => RenderError::TemplateError(err.to_string()),
            ErrorKind::BadSerialization | ErrorKind::CannotDeserialize => {
                RenderError::SerializationError(err.to_string())
            }
            _ => RenderError::OperationError(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_dispatch::HookError;

    #[test]
    fn test_error_display() {
        let err = RenderError::ComponentNotFound("pre".to_string());
        assert!(err.to_string().contains("component not found"));
        assert!(err.to_string().contains("pre"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let render_err: RenderError = io_err.into();
        assert!(matches!(render_err, RenderError::IoError(_)));
    }

    #[test]
    fn test_from_minijinja_template_not_found() {
        let mj_err = minijinja::Error::new(
            minijinja::ErrorKind::TemplateNotFound,
            "template 'pre' not found",
        );
        let render_err: RenderError = mj_err.into();
        assert!(matches!(render_err, RenderError::ComponentNotFound(_)));
    }

    #[test]
    fn test_from_minijinja_carrying_dispatch_error() {
        let dispatch = DispatchError::Hook {
            position: 0,
            tag: "pre".into(),
            source: HookError::new("boom"),
        };
        let mj_err = minijinja::Error::new(minijinja::ErrorKind::InvalidOperation, "hook failed")
            .with_source(dispatch);
        let render_err: RenderError = mj_err.into();
        match render_err {
            RenderError::Dispatch(msg) => assert!(msg.contains("boom")),
            other => panic!("expected dispatch error, got {other:?}"),
        }
    }
}
