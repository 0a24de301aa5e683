//! Element properties to HTML attribute text.
//!
//! hast trees carry DOM-style property names (`className`, `tabIndex`,
//! `ariaHidden`). [`stringify_attributes`] maps them back to attribute names
//! through a fixed HTML table and formats each value by the attribute's kind:
//!
//! | Kind | `true` | `false` | other values |
//! |------|--------|---------|--------------|
//! | Boolean | bare name | omitted | quoted |
//! | Booleanish | `name=true` | `name=false` | unquoted when a safe token |
//! | Number | bare name | omitted | unquoted when a safe token |
//! | everything else | bare name | omitted | quoted, escaped |
//!
//! Lists join with `,` for comma-separated attributes and a space otherwise.
//! Property names that are not HTML attributes (unknown names, SVG-only
//! names like `viewBox`) are dropped.

use std::borrow::Cow;

use arbor_dispatch::{Properties, PropertyValue};
use tracing::trace;

use crate::util::escape_html;

/// How an attribute's value is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// Free-form string.
    Plain,
    /// Presence means true (`hidden`, `disabled`).
    Boolean,
    /// Literal `true`/`false` values (`draggable`, `aria-hidden`).
    Booleanish,
    /// Numeric value (`tabindex`, `colspan`).
    Number,
    /// List joined with spaces (`class`, `rel`).
    SpaceSeparated,
    /// List joined with commas (`accept`, `srcset`).
    CommaSeparated,
}

/// The attribute a property maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyInfo {
    /// HTML attribute name.
    pub attribute: Cow<'static, str>,
    /// How values are written.
    pub kind: PropertyKind,
}

use PropertyKind::{Boolean, Booleanish, CommaSeparated, Number, Plain, SpaceSeparated};

/// hast property name, attribute name, kind.
const HTML_PROPERTIES: &[(&str, &str, PropertyKind)] = &[
    ("abbr", "abbr", Plain),
    ("accept", "accept", CommaSeparated),
    ("acceptCharset", "accept-charset", SpaceSeparated),
    ("accessKey", "accesskey", SpaceSeparated),
    ("action", "action", Plain),
    ("align", "align", Plain),
    ("aLink", "alink", Plain),
    ("allow", "allow", Plain),
    ("allowFullScreen", "allowfullscreen", Boolean),
    ("alt", "alt", Plain),
    ("as", "as", Plain),
    ("async", "async", Boolean),
    ("autoCapitalize", "autocapitalize", Plain),
    ("autoComplete", "autocomplete", SpaceSeparated),
    ("autoFocus", "autofocus", Boolean),
    ("autoPlay", "autoplay", Boolean),
    ("axis", "axis", CommaSeparated),
    ("background", "background", Plain),
    ("bgColor", "bgcolor", Plain),
    ("border", "border", Number),
    ("borderColor", "bordercolor", Plain),
    ("cellPadding", "cellpadding", Plain),
    ("cellSpacing", "cellspacing", Plain),
    ("char", "char", Plain),
    ("charOff", "charoff", Plain),
    ("charSet", "charset", Plain),
    ("checked", "checked", Boolean),
    ("cite", "cite", Plain),
    ("className", "class", SpaceSeparated),
    ("clear", "clear", Plain),
    ("color", "color", Plain),
    ("cols", "cols", Number),
    ("colSpan", "colspan", Number),
    ("compact", "compact", Boolean),
    ("content", "content", Plain),
    ("contentEditable", "contenteditable", Booleanish),
    ("controls", "controls", Boolean),
    ("coords", "coords", CommaSeparated),
    ("crossOrigin", "crossorigin", Plain),
    ("data", "data", Plain),
    ("dateTime", "datetime", Plain),
    ("decoding", "decoding", Plain),
    ("default", "default", Boolean),
    ("defer", "defer", Boolean),
    ("dir", "dir", Plain),
    ("dirName", "dirname", Plain),
    ("disabled", "disabled", Boolean),
    ("download", "download", Boolean),
    ("draggable", "draggable", Booleanish),
    ("encType", "enctype", Plain),
    ("enterKeyHint", "enterkeyhint", Plain),
    ("face", "face", Plain),
    ("form", "form", Plain),
    ("formAction", "formaction", Plain),
    ("formEncType", "formenctype", Plain),
    ("formMethod", "formmethod", Plain),
    ("formNoValidate", "formnovalidate", Boolean),
    ("formTarget", "formtarget", Plain),
    ("frame", "frame", Plain),
    ("frameBorder", "frameborder", Plain),
    ("headers", "headers", SpaceSeparated),
    ("height", "height", Number),
    ("hidden", "hidden", Boolean),
    ("high", "high", Number),
    ("href", "href", Plain),
    ("hrefLang", "hreflang", Plain),
    ("hSpace", "hspace", Number),
    ("htmlFor", "for", SpaceSeparated),
    ("httpEquiv", "http-equiv", SpaceSeparated),
    ("id", "id", Plain),
    ("inert", "inert", Boolean),
    ("inputMode", "inputmode", Plain),
    ("integrity", "integrity", Plain),
    ("is", "is", Plain),
    ("isMap", "ismap", Boolean),
    ("itemId", "itemid", Plain),
    ("itemProp", "itemprop", SpaceSeparated),
    ("itemRef", "itemref", SpaceSeparated),
    ("itemScope", "itemscope", Boolean),
    ("itemType", "itemtype", SpaceSeparated),
    ("kind", "kind", Plain),
    ("label", "label", Plain),
    ("lang", "lang", Plain),
    ("list", "list", Plain),
    ("loading", "loading", Plain),
    ("longDesc", "longdesc", Plain),
    ("loop", "loop", Boolean),
    ("low", "low", Number),
    ("marginHeight", "marginheight", Number),
    ("marginWidth", "marginwidth", Number),
    ("max", "max", Plain),
    ("maxLength", "maxlength", Number),
    ("media", "media", Plain),
    ("method", "method", Plain),
    ("min", "min", Plain),
    ("minLength", "minlength", Number),
    ("multiple", "multiple", Boolean),
    ("muted", "muted", Boolean),
    ("name", "name", Plain),
    ("noHref", "nohref", Boolean),
    ("noModule", "nomodule", Boolean),
    ("nonce", "nonce", Plain),
    ("noResize", "noresize", Boolean),
    ("noShade", "noshade", Boolean),
    ("noValidate", "novalidate", Boolean),
    ("noWrap", "nowrap", Boolean),
    ("open", "open", Boolean),
    ("optimum", "optimum", Number),
    ("pattern", "pattern", Plain),
    ("ping", "ping", SpaceSeparated),
    ("placeholder", "placeholder", Plain),
    ("playsInline", "playsinline", Boolean),
    ("poster", "poster", Plain),
    ("preload", "preload", Plain),
    ("readOnly", "readonly", Boolean),
    ("referrerPolicy", "referrerpolicy", Plain),
    ("rel", "rel", SpaceSeparated),
    ("required", "required", Boolean),
    ("rev", "rev", Plain),
    ("reversed", "reversed", Boolean),
    ("role", "role", Plain),
    ("rows", "rows", Number),
    ("rowSpan", "rowspan", Number),
    ("rules", "rules", Plain),
    ("sandbox", "sandbox", SpaceSeparated),
    ("scope", "scope", Plain),
    ("scrolling", "scrolling", Booleanish),
    ("selected", "selected", Boolean),
    ("shape", "shape", Plain),
    ("size", "size", Number),
    ("sizes", "sizes", Plain),
    ("slot", "slot", Plain),
    ("span", "span", Number),
    ("spellCheck", "spellcheck", Booleanish),
    ("src", "src", Plain),
    ("srcDoc", "srcdoc", Plain),
    ("srcLang", "srclang", Plain),
    ("srcSet", "srcset", CommaSeparated),
    ("start", "start", Number),
    ("step", "step", Plain),
    ("style", "style", Plain),
    ("summary", "summary", Plain),
    ("tabIndex", "tabindex", Number),
    ("target", "target", Plain),
    ("text", "text", Plain),
    ("title", "title", Plain),
    ("translate", "translate", Plain),
    ("type", "type", Plain),
    ("typeMustMatch", "typemustmatch", Boolean),
    ("useMap", "usemap", Plain),
    ("vAlign", "valign", Plain),
    ("value", "value", Plain),
    ("vLink", "vlink", Plain),
    ("vSpace", "vspace", Number),
    ("width", "width", Number),
    ("wrap", "wrap", Plain),
];

const ARIA_BOOLEANISH: &[&str] = &[
    "atomic", "busy", "checked", "disabled", "expanded", "grabbed", "hidden", "modal",
    "multiline", "multiselectable", "pressed", "readonly", "required", "selected",
];

const ARIA_NUMBER: &[&str] = &[
    "colcount", "colindex", "colspan", "level", "posinset", "rowcount", "rowindex", "rowspan",
    "setsize", "valuemax", "valuemin", "valuenow",
];

const ARIA_SPACE_SEPARATED: &[&str] = &[
    "controls", "describedby", "dropeffect", "flowto", "labelledby", "owns", "relevant",
];

/// Looks up the HTML attribute for a hast property name.
///
/// Returns `None` for names that are not HTML attributes.
///
/// ```rust
/// use arbor_render::attributes::{find_property, PropertyKind};
///
/// let info = find_property("tabIndex").unwrap();
/// assert_eq!(info.attribute, "tabindex");
/// assert_eq!(info.kind, PropertyKind::Number);
///
/// assert_eq!(find_property("dataLineNumber").unwrap().attribute, "data-line-number");
/// assert!(find_property("viewBox").is_none());
/// ```
pub fn find_property(name: &str) -> Option<PropertyInfo> {
    if let Some((_, attribute, kind)) = HTML_PROPERTIES.iter().find(|(p, _, _)| *p == name) {
        return Some(PropertyInfo {
            attribute: Cow::Borrowed(*attribute),
            kind: *kind,
        });
    }

    if let Some(rest) = name.strip_prefix("aria") {
        return aria_property(rest);
    }

    if name.starts_with("data") {
        return data_property(name);
    }

    None
}

fn aria_property(rest: &str) -> Option<PropertyInfo> {
    // `ariaHidden` and `aria-hidden` are both accepted
    let rest = rest.strip_prefix('-').unwrap_or(rest);
    if rest.is_empty() || !rest.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let suffix = rest.to_ascii_lowercase();
    let kind = if ARIA_BOOLEANISH.contains(&suffix.as_str()) {
        Booleanish
    } else if ARIA_NUMBER.contains(&suffix.as_str()) {
        Number
    } else if ARIA_SPACE_SEPARATED.contains(&suffix.as_str()) {
        SpaceSeparated
    } else {
        Plain
    };
    Some(PropertyInfo {
        attribute: Cow::Owned(format!("aria-{suffix}")),
        kind,
    })
}

fn data_property(name: &str) -> Option<PropertyInfo> {
    let rest = &name["data".len()..];
    if rest.starts_with('-') && rest.len() > 1 {
        return Some(PropertyInfo {
            attribute: Cow::Owned(name.to_ascii_lowercase()),
            kind: Plain,
        });
    }
    if !rest.starts_with(|c: char| c.is_ascii_uppercase()) {
        return None;
    }

    let mut attribute = String::from("data");
    for c in rest.chars() {
        if c.is_ascii_uppercase() {
            attribute.push('-');
            attribute.push(c.to_ascii_lowercase());
        } else {
            attribute.push(c);
        }
    }
    Some(PropertyInfo {
        attribute: Cow::Owned(attribute),
        kind: Plain,
    })
}

/// Serializes element properties to attribute text.
///
/// The result is empty or starts with a single space, so it can be written
/// straight after the tag name. Attributes keep the properties' order.
///
/// ```rust
/// use arbor_dispatch::Element;
/// use arbor_render::stringify_attributes;
///
/// let link = Element::new("a")
///     .with_property("href", "#hello-world")
///     .with_property("ariaHidden", "true")
///     .with_property("tabIndex", -1);
/// assert_eq!(
///     stringify_attributes(&link.properties),
///     r##" href="#hello-world" aria-hidden=true tabindex=-1"##
/// );
/// ```
pub fn stringify_attributes(properties: &Properties) -> String {
    let pairs: Vec<String> = properties
        .iter()
        .filter_map(|(name, value)| {
            let Some(info) = find_property(name) else {
                trace!(property = %name, "dropping property without an HTML attribute");
                return None;
            };
            format_attribute(&info, value)
        })
        .collect();

    if pairs.is_empty() {
        String::new()
    } else {
        format!(" {}", pairs.join(" "))
    }
}

fn format_attribute(info: &PropertyInfo, value: &PropertyValue) -> Option<String> {
    let attribute = &info.attribute;
    let raw = match value {
        PropertyValue::Bool(flag) if info.kind == Booleanish => {
            return Some(format!("{attribute}={flag}"));
        }
        PropertyValue::Bool(true) => return Some(attribute.to_string()),
        PropertyValue::Bool(false) => return None,
        PropertyValue::Number(n) => n.to_string(),
        PropertyValue::String(s) => s.clone(),
        PropertyValue::List(items) => {
            let separator = if info.kind == CommaSeparated { "," } else { " " };
            items.join(separator)
        }
    };

    let unquoted = matches!(info.kind, Booleanish | Number) && is_safe_token(&raw);
    if unquoted {
        Some(format!("{attribute}={raw}"))
    } else {
        Some(format!("{attribute}=\"{}\"", escape_html(&raw)))
    }
}

/// True when a value can be written without quotes.
fn is_safe_token(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| !c.is_whitespace() && !matches!(c, '"' | '\'' | '=' | '<' | '>' | '`'))
}
