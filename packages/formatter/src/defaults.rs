//! Default tag classification tables
//!
//! Data-driven defaults merged into [`Options`](crate::options::Options);
//! every set can be overridden independently through the configuration
//! record.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Elements that do not force a line break before or after themselves.
///
/// Block vs inline split follows the HTML phrasing-content categories:
/// <https://developer.mozilla.org/en-US/docs/Web/HTML/Inline_elements>
pub static INLINE_ELEMENTS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "abbr", "area", "audio", "b", "bdi", "bdo", "br", "button", "canvas", "cite",
        "code", "data", "datalist", "del", "dfn", "em", "embed", "i", "iframe", "img", "input",
        "ins", "kbd", "keygen", "label", "map", "mark", "math", "meter", "noscript", "object",
        "output", "progress", "q", "ruby", "s", "samp", "select", "small", "span", "strong",
        "sub", "sup", "svg", "template", "textarea", "time", "u", "var", "video", "wbr", "text",
        // obsolete inline tags
        "acronym", "big", "strike", "tt",
    ]
    .into_iter()
    .collect()
});

/// Void elements: no content, no end tag.
///
/// <https://html.spec.whatwg.org/multipage/syntax.html#void-elements>
/// The doctype and xml declarations are treated the same way, as are the
/// obsolete `basefont` and `isindex` tags.
pub static VOID_ELEMENTS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link",
        "menuitem", "meta", "param", "source", "track", "wbr", "!doctype", "?xml", "basefont",
        "isindex",
    ]
    .into_iter()
    .collect()
});

/// Elements whose children are reproduced verbatim.
pub static CONTENT_UNFORMATTED: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["pre", "textarea"].into_iter().collect());

/// Tags that get an extra blank line before them.
pub static EXTRA_LINERS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["head", "body", "/html"].into_iter().collect());

/// Block-level start tags that implicitly close an open `<p>`.
pub static P_CLOSERS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "address", "article", "aside", "blockquote", "details", "div", "dl", "fieldset",
        "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
        "hr", "main", "menu", "nav", "ol", "p", "pre", "section", "table", "ul",
    ]
    .into_iter()
    .collect()
});

/// Parent tags under which an open `<p>` is never implicitly closed.
pub const P_PARENT_EXCLUDES: &[&str] = &["a", "audio", "del", "ins", "map", "noscript", "video"];

/// Owned copy of a default set, for merging into an options record.
pub(crate) fn owned(set: &HashSet<&'static str>) -> HashSet<String> {
    set.iter().map(|s| (*s).to_string()).collect()
}
