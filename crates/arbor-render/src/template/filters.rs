//! MiniJinja filter and test registration.

use arbor_dispatch::{Node, Properties};
use minijinja::value::ViaDeserialize;
use minijinja::{Environment, Value};

use crate::attributes::stringify_attributes;
use crate::util::{escape_html, is_void_element};

/// Registers the markup filters and tests on a minijinja environment.
///
/// | Name | Kind | Usage |
/// |------|------|-------|
/// | `attributes` | filter | `{{ node.properties \| attributes }}` |
/// | `escape_html` | filter | `{{ node.value \| escape_html }}` |
/// | `classes` | filter | `{% for c in node \| classes %}` |
/// | `has_class` | filter | `{% if node \| has_class("note") %}` |
/// | `text_content` | filter | `{{ node \| text_content }}` |
/// | `void_element` | test | `{% if node.tagName is void_element %}` |
///
/// Filters that produce markup return safe strings, so they are not escaped
/// a second time when a component enables auto-escaping.
pub fn register_filters(env: &mut Environment<'static>) {
    env.add_filter("attributes", |properties: ViaDeserialize<Properties>| {
        Value::from_safe_string(stringify_attributes(&properties.0))
    });

    env.add_filter("escape_html", |value: Value| {
        let text = match value.as_str() {
            Some(s) => escape_html(s),
            None => escape_html(&value.to_string()),
        };
        Value::from_safe_string(text)
    });

    env.add_filter("classes", |node: ViaDeserialize<Node>| -> Vec<String> {
        node.0
            .as_element()
            .map(|el| el.classes().into_iter().map(String::from).collect())
            .unwrap_or_default()
    });

    env.add_filter("has_class", |node: ViaDeserialize<Node>, name: &str| -> bool {
        node.0.as_element().is_some_and(|el| el.has_class(name))
    });

    env.add_filter("text_content", |node: ViaDeserialize<Node>| -> String {
        node.0.text_content()
    });

    env.add_test("void_element", |tag_name: &str| is_void_element(tag_name));
}
