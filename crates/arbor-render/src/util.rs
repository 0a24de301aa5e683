//! Markup helpers shared by the host and the async walker.

/// Elements that never have children or a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "menuitem", "meta",
    "param", "source", "track", "wbr",
];

/// Returns true for void elements (`br`, `img`, ...).
///
/// The table is fixed; custom elements are never void.
///
/// ```rust
/// use arbor_render::is_void_element;
///
/// assert!(is_void_element("img"));
/// assert!(!is_void_element("p"));
/// ```
pub fn is_void_element(tag_name: &str) -> bool {
    VOID_ELEMENTS.contains(&tag_name)
}

/// Escapes text for use in HTML content and quoted attribute values.
///
/// ```rust
/// use arbor_render::escape_html;
///
/// assert_eq!(escape_html(r#"a < "b""#), "a &lt; &quot;b&quot;");
/// ```
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
