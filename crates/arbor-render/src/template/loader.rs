//! Component directory loading.
//!
//! Components are looked up by name relative to the directory. A name may
//! contain `/` to reach nested folders (`docs/alert` → `docs/alert.jinja`).
//! When several files share a name, the earlier extension in
//! [`COMPONENT_EXTENSIONS`] wins.

use std::path::{Path, PathBuf};

use minijinja::{Error, ErrorKind};
use tracing::debug;

/// Recognized component file extensions in priority order.
///
/// 1. `.jinja` - Standard Jinja extension
/// 2. `.jinja2` - Full Jinja2 extension
/// 3. `.j2` - Short Jinja2 extension
/// 4. `.html` - Plain markup components
pub const COMPONENT_EXTENSIONS: &[&str] = &[".jinja", ".jinja2", ".j2", ".html"];

/// Returns the file a component name resolves to inside `dir`, if any.
///
/// Names that would escape the directory (`..`, absolute paths, empty
/// segments) never resolve.
pub fn component_path(dir: &Path, name: &str) -> Option<PathBuf> {
    if !is_safe_name(name) {
        return None;
    }
    COMPONENT_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{name}{ext}")))
        .find(|path| path.is_file())
}

fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('\\')
        && name
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}

/// Builds a minijinja loader reading components from `dir` on demand.
pub(crate) fn component_loader(
    dir: PathBuf,
) -> impl Fn(&str) -> Result<Option<String>, Error> + Send + Sync + 'static {
    move |name| {
        let Some(path) = component_path(&dir, name) else {
            return Ok(None);
        };
        debug!(component = name, path = %path.display(), "loading component file");
        std::fs::read_to_string(&path).map(Some).map_err(|err| {
            Error::new(
                ErrorKind::InvalidOperation,
                format!("could not read component file {}", path.display()),
            )
            .with_source(err)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn extension_priority() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("pre.html"), "html").unwrap();
        fs::write(dir.path().join("pre.j2"), "j2").unwrap();

        let path = component_path(dir.path(), "pre").unwrap();
        assert!(path.ends_with("pre.j2"));

        fs::write(dir.path().join("pre.jinja"), "jinja").unwrap();
        let path = component_path(dir.path(), "pre").unwrap();
        assert!(path.ends_with("pre.jinja"));
    }

    #[test]
    fn nested_names() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs/alert.jinja"), "!").unwrap();

        assert!(component_path(dir.path(), "docs/alert").is_some());
        assert!(component_path(dir.path(), "alert").is_none());
    }

    #[test]
    fn unsafe_names_never_resolve() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("ok.jinja"), "").unwrap();

        for name in ["", "../ok", "./ok", "docs//ok", "a\\ok", "/ok"] {
            assert!(component_path(dir.path(), name).is_none(), "{name:?}");
        }
    }

    #[test]
    fn loader_reads_on_demand() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("note.jinja"), "<aside></aside>").unwrap();
        let loader = component_loader(dir.path().to_path_buf());

        assert_eq!(loader("note").unwrap().as_deref(), Some("<aside></aside>"));
        assert_eq!(loader("missing").unwrap(), None);
    }
}
