//! Loading the tree to render.
//!
//! Three JSON shapes are accepted:
//!
//! - a bare array of nodes
//! - a hast root: `{"type": "root", "children": [...]}`
//! - a page document: `{"ast": <root or array>, "toc": <root or array>}`
//!
//! Only page documents carry a table of contents.

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context};
use arbor_dispatch::Node;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RootKind {
    Root,
}

#[derive(Debug, Deserialize)]
struct Root {
    #[serde(rename = "type")]
    _kind: RootKind,
    #[serde(default)]
    children: Vec<Node>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Tree {
    Nodes(Vec<Node>),
    Root(Root),
}

impl Tree {
    fn into_nodes(self) -> Vec<Node> {
        match self {
            Tree::Nodes(nodes) => nodes,
            Tree::Root(root) => root.children,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Document {
    Page { ast: Tree, toc: Option<Tree> },
    Tree(Tree),
}

/// Which part of the document to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Content,
    Toc,
}

/// Parses a document and returns the nodes of the requested section.
pub fn parse(source: &str, section: Section) -> anyhow::Result<Vec<Node>> {
    let document: Document = serde_json::from_str(source)
        .context("expected a node array, a root node or an {\"ast\", \"toc\"} document")?;

    match (document, section) {
        (Document::Tree(tree), Section::Content) => Ok(tree.into_nodes()),
        (Document::Page { ast, .. }, Section::Content) => Ok(ast.into_nodes()),
        (Document::Page { toc: Some(toc), .. }, Section::Toc) => Ok(toc.into_nodes()),
        (Document::Page { toc: None, .. }, Section::Toc) => bail!("document has no `toc`"),
        (Document::Tree(_), Section::Toc) => {
            bail!("a table of contents needs an {{\"ast\", \"toc\"}} document")
        }
    }
}

/// Reads a document from a file, or from stdin when `path` is `-`.
pub fn load(path: &Path, section: Section) -> anyhow::Result<Vec<Node>> {
    let source = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("could not read stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("could not read {}", path.display()))?
    };
    parse(&source, section).with_context(|| format!("invalid document {}", path.display()))
}
