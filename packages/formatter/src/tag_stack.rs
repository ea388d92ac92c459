//! Tag stack
//!
//! Open-tag frames serve two jobs: pairing closing tags with their openers,
//! and implementing the HTML5 optional-end-tag elision rules. Each frame
//! records the printer's indent level at the moment the tag opened, so
//! popping a frame restores exactly that level.
//!
//! [`ParsedTag`]s are transient, scoped to one formatting call, and live in a
//! [`TagArena`]; the parent chain is index-based, never shared pointers.

use crate::printer::Printer;

pub type TagId = usize;

/// Sub-language detected for an embedded content region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddedLanguage {
    Script,
    Style,
    /// Nested markup, formatted by recursing into this same formatter.
    Markup,
}

/// Derived classification of a tag-open or comment token, decorated while
/// its element is being printed.
#[derive(Debug, Clone)]
pub struct ParsedTag {
    pub parent: Option<TagId>,
    pub text: String,
    pub tag_name: String,
    /// The raw name as written, `/`-prefixed for end tags (`/html`), used
    /// for the configuration set lookups.
    pub tag_check: String,
    /// `<` for element tags, `{` for mustache tags, NUL for the root.
    pub tag_start_char: char,
    pub is_inline_element: bool,
    pub is_unformatted: bool,
    pub is_content_unformatted: bool,
    pub is_empty_element: bool,
    pub is_start_tag: bool,
    pub is_end_tag: bool,
    pub indent_content: bool,
    /// Set when any descendant caused a line break; the matching end tag
    /// then always starts on its own line.
    pub multiline_content: bool,
    pub embedded_language: Option<EmbeddedLanguage>,
    pub start_tag: Option<TagId>,
    pub attr_count: usize,
    pub has_wrapped_attrs: bool,
    pub alignment_size: usize,
    pub tag_complete: bool,
}

impl ParsedTag {
    /// The sentinel tag that is "open" before any real tag has been seen.
    pub fn root() -> Self {
        ParsedTag {
            parent: None,
            text: String::new(),
            tag_name: String::new(),
            tag_check: String::new(),
            tag_start_char: '\0',
            is_inline_element: false,
            is_unformatted: false,
            is_content_unformatted: false,
            is_empty_element: false,
            is_start_tag: false,
            is_end_tag: false,
            indent_content: false,
            multiline_content: false,
            embedded_language: None,
            start_tag: None,
            attr_count: 0,
            has_wrapped_attrs: false,
            alignment_size: 0,
            tag_complete: true,
        }
    }
}

/// Growable arena of ParsedTags for one formatting call.
#[derive(Debug, Default)]
pub struct TagArena {
    tags: Vec<ParsedTag>,
}

impl TagArena {
    pub fn new() -> Self {
        TagArena::default()
    }

    pub fn alloc(&mut self, tag: ParsedTag) -> TagId {
        let id = self.tags.len();
        self.tags.push(tag);
        id
    }
}

impl std::ops::Index<TagId> for TagArena {
    type Output = ParsedTag;

    fn index(&self, id: TagId) -> &ParsedTag {
        &self.tags[id]
    }
}

impl std::ops::IndexMut<TagId> for TagArena {
    fn index_mut(&mut self, id: TagId) -> &mut ParsedTag {
        &mut self.tags[id]
    }
}

#[derive(Debug)]
struct TagFrame {
    tag: TagId,
    tag_name: String,
    indent_level: usize,
}

/// Stack of open-tag frames; the stack order is the ancestor chain.
#[derive(Debug, Default)]
pub struct TagStack {
    frames: Vec<TagFrame>,
}

impl TagStack {
    pub fn new() -> Self {
        TagStack::default()
    }

    /// The innermost open tag, if any.
    pub fn current(&self) -> Option<TagId> {
        self.frames.last().map(|frame| frame.tag)
    }

    /// Push a frame for a freshly opened tag at the printer's current level.
    pub fn record(&mut self, tag: TagId, tag_name: &str, printer: &Printer) {
        self.frames.push(TagFrame {
            tag,
            tag_name: tag_name.to_string(),
            indent_level: printer.indent_level,
        });
    }

    /// Frame index of the nearest enclosing tag named `name`, searching from
    /// the innermost outwards. A frame named in `stop_names` bounds the
    /// search: hitting one aborts with no match.
    fn find(&self, name: &str, stop_names: &[&str]) -> Option<usize> {
        for (index, frame) in self.frames.iter().enumerate().rev() {
            if frame.tag_name == name {
                return Some(index);
            }
            if stop_names.contains(&frame.tag_name.as_str()) {
                return None;
            }
        }
        None
    }

    /// Pop every frame above and including the nearest one named `name`,
    /// restoring the printer's indent level to the one recorded when that
    /// tag opened. Returns the matched tag, or `None` (and pops nothing)
    /// when no match exists within the `stop_names` bound.
    pub fn try_pop(
        &mut self,
        name: &str,
        stop_names: &[&str],
        printer: &mut Printer,
    ) -> Option<TagId> {
        let index = self.find(name, stop_names)?;
        let frame = self.frames.drain(index..).next().expect("frame exists");
        printer.indent_level = frame.indent_level;
        Some(frame.tag)
    }

    /// Reset the printer's indent to the nearest enclosing frame named in
    /// `names`, without popping anything.
    pub fn indent_to(&mut self, names: &[&str], printer: &mut Printer) {
        for frame in self.frames.iter().rev() {
            if names.contains(&frame.tag_name.as_str()) {
                printer.indent_level = frame.indent_level;
                return;
            }
        }
    }
}
