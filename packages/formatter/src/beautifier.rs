//! Beautifier driver
//!
//! The per-token-kind state machine. It classifies tag-open and comment
//! tokens into [`ParsedTag`]s, consults the [`TagStack`] for pairing and for
//! the HTML5 optional-end-tag rules, decides spacing / newline insertion /
//! indentation changes / attribute wrapping, and delegates embedded script,
//! style and nested-markup regions to their sub-formatters. The
//! [`Printer`] is the only thing that ever writes output.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::defaults;
use crate::error::FormatError;
use crate::options::{IndentScripts, Options, WrapAttributes};
use crate::printer::Printer;
use crate::tag_stack::{EmbeddedLanguage, ParsedTag, TagArena, TagId, TagStack};
use crate::tokenizer::tokenize;
use crate::tokens::{Token, TokenId, TokenKind, TokenStream};

static EOL_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r\n|\r").unwrap());
static BASE_INDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\t ]*").unwrap());

static TAG_CHECK_ANGLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^<([^\s>]*)").unwrap());
static TAG_CHECK_MUSTACHE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\{\{~?(?:\^|#\*?)?([^\s}]+)").unwrap());

// Embedded-language detection from a type attribute value.
static CSS_TYPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"text/css").unwrap());
static SCRIPT_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"module|((text|application|dojo)/(x-)?(javascript|ecmascript|jscript|livescript|(ld\+)?json|method|aspect))",
    )
    .unwrap()
});
static MARKUP_TYPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(text|application|dojo)/(x-)?(html)").unwrap());

static TRAILING_BLANK_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*$").unwrap());
static ENVELOPE_TEST: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(<!--|<!\[CDATA\[)").unwrap());
static ENVELOPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^(<!--[^\n]*|<!\[CDATA\[)(\n?)([ \t\n]*)(.*)(-->|\]\]>)\n?$").unwrap()
});
static TRAILING_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+$").unwrap());

/// A caller-supplied text → text sub-formatter for embedded content.
pub type EmbeddedFormatter<'a> = Box<dyn Fn(&str, &Options) -> Result<String, FormatError> + 'a>;

/// Format a markup fragment with the given options.
pub fn beautify(source: &str, options: &Options) -> Result<String, FormatError> {
    Beautifier::new(options).beautify(source)
}

/// A reusable formatter: options plus the optional embedded-content
/// callbacks. One [`beautify`](Beautifier::beautify) call is one
/// independent formatting pass; no state crosses calls.
pub struct Beautifier<'a> {
    options: &'a Options,
    script_formatter: Option<EmbeddedFormatter<'a>>,
    style_formatter: Option<EmbeddedFormatter<'a>>,
}

impl<'a> Beautifier<'a> {
    pub fn new(options: &'a Options) -> Self {
        Beautifier {
            options,
            script_formatter: None,
            style_formatter: None,
        }
    }

    pub fn with_script_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&str, &Options) -> Result<String, FormatError> + 'a,
    {
        self.script_formatter = Some(Box::new(formatter));
        self
    }

    pub fn with_style_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&str, &Options) -> Result<String, FormatError> + 'a,
    {
        self.style_formatter = Some(Box::new(formatter));
        self
    }

    /// Format one fragment. Input newlines are normalized to `\n`; the first
    /// line's leading whitespace becomes the base indent of the whole
    /// output.
    pub fn beautify(&self, source: &str) -> Result<String, FormatError> {
        self.options.validate()?;
        if self.options.disabled {
            return Ok(source.to_string());
        }

        let source = EOL_PATTERN.replace_all(source, "\n");
        let base_indent = BASE_INDENT.find(&source).map_or("", |m| m.as_str());

        let stream = tokenize(&source, self.options);
        let mut arena = TagArena::new();
        let root = arena.alloc(ParsedTag::root());

        let session = Session {
            fmt: self,
            options: self.options,
            printer: Printer::new(self.options, base_indent),
            stream,
            arena,
            stack: TagStack::new(),
            last: Processed::Start,
            last_tag: root,
        };
        session.run()
    }
}

/// What the previous dispatch step produced; drives the spacing decisions
/// that look one step back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Processed {
    Start,
    Token(TokenKind),
    /// Ordinary element content handled by the text rule.
    Content,
}

struct Session<'s, 'a> {
    fmt: &'s Beautifier<'a>,
    options: &'a Options,
    printer: Printer,
    stream: TokenStream,
    arena: TagArena,
    stack: TagStack,
    last: Processed,
    last_tag: TagId,
}

impl<'s, 'a> Session<'s, 'a> {
    fn run(mut self) -> Result<String, FormatError> {
        let mut id = self.stream.next();
        while self.stream[id].kind != TokenKind::Eof {
            match self.stream[id].kind {
                TokenKind::TagOpen | TokenKind::Comment => {
                    let tag = self.handle_tag_open(id);
                    self.last_tag = tag;
                    self.last = Processed::Token(TokenKind::TagOpen);
                }
                TokenKind::Attribute | TokenKind::Equals | TokenKind::Value => {
                    let kind = self.stream[id].kind;
                    self.handle_inside_tag(id);
                    self.last = Processed::Token(kind);
                }
                TokenKind::Text if !self.arena[self.last_tag].tag_complete => {
                    self.handle_inside_tag(id);
                    self.last = Processed::Token(TokenKind::Text);
                }
                TokenKind::TagClose => {
                    self.handle_tag_close(id);
                    self.last = Processed::Token(TokenKind::TagClose);
                }
                TokenKind::Text => {
                    self.handle_text(id)?;
                    self.last = Processed::Content;
                }
                TokenKind::ControlFlowOpen => {
                    self.handle_control_flow_open(id);
                    self.last = Processed::Token(TokenKind::ControlFlowOpen);
                }
                TokenKind::ControlFlowClose => {
                    self.handle_control_flow_close(id);
                    self.last = Processed::Token(TokenKind::ControlFlowClose);
                }
                TokenKind::Unknown | TokenKind::Eof => {
                    // no rule claimed it: reproduce verbatim, leave `last` be
                    let token = self.stream[id].clone();
                    self.printer.add_raw_token(&token);
                }
            }
            id = self.stream.next();
        }
        Ok(self.printer.finish())
    }

    fn previous_kind(&self, token: &Token) -> Option<TokenKind> {
        self.stream.kind_of(token.previous)
    }

    fn handle_tag_open(&mut self, id: TokenId) -> TagId {
        let token = self.stream[id].clone();
        let tag = self.classify_tag(&token);

        let last_tag_verbatim = {
            let last_tag = &self.arena[self.last_tag];
            (last_tag.is_unformatted || last_tag.is_content_unformatted)
                && !last_tag.is_empty_element
        };

        if last_tag_verbatim && token.kind == TokenKind::TagOpen && !self.arena[tag].is_start_tag {
            // end tags of verbatim elements are printed raw so the newlines
            // inside them stay exactly as written
            self.printer.add_raw_token(&token);
            let name = self.arena[tag].tag_name.clone();
            let popped = self.stack.try_pop(&name, &[], &mut self.printer);
            self.arena[tag].start_tag = popped;
        } else {
            let previous_kind = self.previous_kind(&token);
            self.printer.traverse_whitespace(&token, previous_kind);
            self.set_tag_position(tag, &token);
            if !self.arena[tag].is_inline_element {
                self.printer.set_wrap_point();
            }
            self.printer.print_token(&token);
        }

        // the force wrap modes need the attribute count up front
        if self.arena[tag].is_start_tag && self.options.wrap_attributes.is_force() {
            let mut peek_index = 0;
            loop {
                let peeked = self.stream.peek(peek_index);
                if peeked.kind == TokenKind::Attribute {
                    self.arena[tag].attr_count += 1;
                }
                if peeked.kind == TokenKind::Eof || peeked.kind == TokenKind::TagClose {
                    break;
                }
                peek_index += 1;
            }
        }

        if self.options.wrap_attributes.is_aligned() {
            self.arena[tag].alignment_size = token.text.chars().count() + 1;
        }

        if !self.arena[tag].tag_complete && !self.arena[tag].is_unformatted {
            self.printer.alignment_size = self.arena[tag].alignment_size;
        }

        tag
    }

    /// Classify a tag-open or comment token into a ParsedTag.
    fn classify_tag(&mut self, token: &Token) -> TagId {
        let mut tag = ParsedTag::root();
        tag.tag_complete = false;
        tag.parent = self.stack.current();
        tag.text = token.text.clone();
        tag.tag_start_char = token.text.chars().next().unwrap_or('\0');

        let tag_check = if tag.tag_start_char == '<' {
            TAG_CHECK_ANGLE
                .captures(&token.text)
                .map_or(String::new(), |c| c[1].to_string())
        } else {
            let mut check = TAG_CHECK_MUSTACHE
                .captures(&token.text)
                .map_or(String::new(), |c| c[1].to_string());
            // {{#> partial}} takes its name from what follows
            if (token.text.starts_with("{{#>") || token.text.starts_with("{{~#>"))
                && check.starts_with('>')
            {
                if check == ">" {
                    if let Some(next_id) = token.next {
                        check = self.stream[next_id]
                            .text
                            .split(' ')
                            .next()
                            .unwrap_or("")
                            .to_string();
                    }
                } else {
                    check = token.text.splitn(2, '>').nth(1).unwrap_or("").to_string();
                }
            }
            check
        };
        tag.tag_check = tag_check.to_lowercase();

        if token.kind == TokenKind::Comment {
            tag.tag_complete = true;
        }

        tag.is_start_tag = !tag.tag_check.starts_with('/');
        tag.tag_name = if tag.is_start_tag {
            tag.tag_check.clone()
        } else {
            tag.tag_check[1..].to_string()
        };
        tag.is_end_tag = !tag.is_start_tag
            || token
                .closed
                .map_or(false, |closed| self.stream[closed].text == "/>");

        // a {{~ whitespace-trimmed tag carries its marker one position later
        let text = token.text.as_bytes();
        let mustache_starts = if tag.tag_start_char == '{' && text.len() >= 3 && text[2] == b'~' {
            3
        } else {
            2
        };
        // mustache tags not opening a block (# or ^) are single tags, and so
        // are all of them when mustache indenting is off
        tag.is_end_tag = tag.is_end_tag
            || (tag.tag_start_char == '{'
                && (!self.options.indent_mustache
                    || text.len() < 3
                    || matches!(text.get(mustache_starts), Some(b) if *b != b'#' && *b != b'^')));

        tag.alignment_size = self.options.wrap_indent_size();
        tag.is_end_tag = tag.is_end_tag || self.options.void_elements.contains(&tag.tag_check);
        tag.is_empty_element = tag.tag_complete || (tag.is_start_tag && tag.is_end_tag);
        tag.is_unformatted = !tag.tag_complete && self.options.unformatted.contains(&tag.tag_check);
        tag.is_content_unformatted =
            !tag.is_empty_element && self.options.content_unformatted.contains(&tag.tag_check);
        tag.is_inline_element = self.options.inline.contains(&tag.tag_name)
            || (self.options.inline_custom_elements && tag.tag_name.contains('-'))
            || tag.tag_start_char == '{';

        self.arena.alloc(tag)
    }

    fn set_tag_position(&mut self, tag: TagId, token: &Token) {
        if !self.arena[tag].is_empty_element {
            if self.arena[tag].is_end_tag {
                // pair with the opener, popping it and everything above it
                let name = self.arena[tag].tag_name.clone();
                let popped = self.stack.try_pop(&name, &[], &mut self.printer);
                self.arena[tag].start_tag = popped;
            } else {
                // a start tag may require an inferred end tag first
                if self.do_optional_end_element(tag) && !self.arena[tag].is_inline_element {
                    self.printer.print_newline(false);
                }

                let name = self.arena[tag].tag_name.clone();
                self.stack.record(tag, &name, &self.printer);

                if (name == "script" || name == "style")
                    && !(self.arena[tag].is_unformatted || self.arena[tag].is_content_unformatted)
                {
                    let tag_check = self.arena[tag].tag_check.clone();
                    let language = self.embedded_language_for(&tag_check, token);
                    self.arena[tag].embedded_language = language;
                }
            }
        }

        if self.options.extra_liners.contains(&self.arena[tag].tag_check) {
            self.printer.print_newline(false);
            if !self.printer.just_added_blankline() {
                self.printer.print_newline(true);
            }
        }

        if self.arena[tag].is_empty_element {
            // an {{else}} realigns to the block it belongs to
            if self.arena[tag].tag_start_char == '{' && self.arena[tag].tag_check == "else" {
                self.stack
                    .indent_to(&["if", "unless", "each"], &mut self.printer);
                self.arena[tag].indent_content = true;
                // keep it inline when the opening {{#if}} is on this line
                if !self.printer.current_line_has("{{#if") {
                    self.printer.print_newline(false);
                }
            }

            let comment_stays_inline = self.arena[tag].tag_name == "!--"
                && self.last == Processed::Token(TokenKind::TagClose)
                && self.arena[self.last_tag].is_end_tag
                && self.arena[tag].text.contains('\n');
            if !comment_stays_inline {
                if !(self.arena[tag].is_inline_element || self.arena[tag].is_unformatted) {
                    self.printer.print_newline(false);
                }
                self.mark_parent_multiline(tag);
            }
        } else if self.arena[tag].is_end_tag {
            // deciding whether a block is multiline should not be this hard
            let mut do_end_expand = self.arena[tag]
                .start_tag
                .map_or(false, |start| self.arena[start].multiline_content);
            do_end_expand = do_end_expand
                || (!self.arena[tag].is_inline_element
                    && !(self.arena[self.last_tag].is_inline_element
                        || self.arena[self.last_tag].is_unformatted)
                    && !(self.last == Processed::Token(TokenKind::TagClose)
                        && self.arena[tag].start_tag == Some(self.last_tag))
                    && self.last != Processed::Content);
            if self.arena[tag].is_content_unformatted || self.arena[tag].is_unformatted {
                do_end_expand = false;
            }
            if do_end_expand {
                self.printer.print_newline(false);
            }
        } else {
            // start tag
            let has_embedded = self.arena[tag].embedded_language.is_some();
            self.arena[tag].indent_content = !has_embedded;

            if self.arena[tag].tag_start_char == '<' {
                match self.arena[tag].tag_name.as_str() {
                    "html" => self.arena[tag].indent_content = self.options.indent_inner_html,
                    "head" => self.arena[tag].indent_content = self.options.indent_head_inner_html,
                    "body" => self.arena[tag].indent_content = self.options.indent_body_inner_html,
                    _ => {}
                }
            }

            if !(self.arena[tag].is_inline_element || self.arena[tag].is_unformatted)
                && (self.last != Processed::Content || self.arena[tag].is_content_unformatted)
            {
                self.printer.print_newline(false);
            }

            self.mark_parent_multiline(tag);
        }
    }

    fn mark_parent_multiline(&mut self, tag: TagId) {
        let Some(parent) = self.arena[tag].parent else {
            return;
        };
        if self.printer.just_added_newline()
            && !((self.arena[tag].is_inline_element || self.arena[tag].is_unformatted)
                && self.arena[parent].is_inline_element)
        {
            self.arena[parent].multiline_content = true;
        }
    }

    /// The HTML5 optional-end-tag table. A start tag for certain elements
    /// implicitly closes a still-open sibling or ancestor; the stop lists
    /// bound how far up the chain the inferred close may reach.
    /// <https://html.spec.whatwg.org/multipage/syntax.html#optional-tags>
    fn do_optional_end_element(&mut self, tag: TagId) -> bool {
        if self.arena[tag].is_empty_element
            || !self.arena[tag].is_start_tag
            || self.arena[tag].parent.is_none()
        {
            return false;
        }

        let tag_name = self.arena[tag].tag_name.clone();
        let parent_is_p = self.arena[tag]
            .parent
            .map_or(false, |p| self.arena[p].tag_name == "p");
        let mut result = None;

        if tag_name == "body" {
            result = self.stack.try_pop("head", &[], &mut self.printer);
        } else if tag_name == "li" {
            result = self
                .stack
                .try_pop("li", &["ol", "ul", "menu"], &mut self.printer);
        } else if tag_name == "dd" || tag_name == "dt" {
            result = self.stack.try_pop("dt", &["dl"], &mut self.printer);
            if result.is_none() {
                result = self.stack.try_pop("dd", &["dl"], &mut self.printer);
            }
        } else if parent_is_p && defaults::P_CLOSERS.contains(tag_name.as_str()) {
            // this branch works because P_CLOSERS overlaps no other name
            // handled here; the <p> must not sit in one of the wrapper
            // elements that keep it open
            let p_parent = self.arena[tag].parent.and_then(|p| self.arena[p].parent);
            let excluded = p_parent.map_or(false, |pp| {
                defaults::P_PARENT_EXCLUDES.contains(&self.arena[pp].tag_name.as_str())
            });
            if !excluded {
                result = self.stack.try_pop("p", &[], &mut self.printer);
            }
        } else if tag_name == "rp" || tag_name == "rt" {
            result = self
                .stack
                .try_pop("rt", &["ruby", "rtc"], &mut self.printer);
            if result.is_none() {
                result = self
                    .stack
                    .try_pop("rp", &["ruby", "rtc"], &mut self.printer);
            }
        } else if tag_name == "optgroup" {
            result = self.stack.try_pop("optgroup", &["select"], &mut self.printer);
        } else if tag_name == "option" {
            result = self.stack.try_pop(
                "option",
                &["select", "datalist", "optgroup"],
                &mut self.printer,
            );
        } else if tag_name == "colgroup" {
            result = self.stack.try_pop("caption", &["table"], &mut self.printer);
        } else if tag_name == "thead" {
            result = self.stack.try_pop("caption", &["table"], &mut self.printer);
            if result.is_none() {
                result = self.stack.try_pop("colgroup", &["table"], &mut self.printer);
            }
        } else if tag_name == "tbody" || tag_name == "tfoot" {
            for name in ["caption", "colgroup", "thead", "tbody"] {
                if result.is_none() {
                    result = self.stack.try_pop(name, &["table"], &mut self.printer);
                }
            }
        } else if tag_name == "tr" {
            result = self.stack.try_pop("caption", &["table"], &mut self.printer);
            if result.is_none() {
                result = self.stack.try_pop("colgroup", &["table"], &mut self.printer);
            }
            if result.is_none() {
                result = self.stack.try_pop(
                    "tr",
                    &["table", "thead", "tbody", "tfoot"],
                    &mut self.printer,
                );
            }
        } else if tag_name == "th" || tag_name == "td" {
            result = self.stack.try_pop(
                "td",
                &["table", "thead", "tbody", "tfoot", "tr"],
                &mut self.printer,
            );
            if result.is_none() {
                result = self.stack.try_pop(
                    "th",
                    &["table", "thead", "tbody", "tfoot", "tr"],
                    &mut self.printer,
                );
            }
        }

        // reparent under whatever is the innermost open tag now
        self.arena[tag].parent = self.stack.current();
        result.is_some()
    }

    fn handle_tag_close(&mut self, id: TokenId) {
        let token = self.stream[id].clone();
        self.printer.alignment_size = 0;
        self.arena[self.last_tag].tag_complete = true;

        let has_whitespace = token.newlines > 0 || !token.whitespace_before.is_empty();
        self.printer.set_space_before_token(has_whitespace, true);

        if self.arena[self.last_tag].is_unformatted {
            self.printer.add_raw_token(&token);
        } else {
            if self.arena[self.last_tag].tag_start_char == '<' {
                // space before />, none before >
                self.printer
                    .set_space_before_token(token.text.starts_with('/'), true);
                if self.options.wrap_attributes == WrapAttributes::ForceExpandMultiline
                    && self.arena[self.last_tag].has_wrapped_attrs
                {
                    self.printer.print_newline(false);
                }
            }
            self.printer.print_token(&token);
        }

        if self.arena[self.last_tag].indent_content
            && !(self.arena[self.last_tag].is_unformatted
                || self.arena[self.last_tag].is_content_unformatted)
        {
            self.printer.indent();
            // only indent once per opened tag
            self.arena[self.last_tag].indent_content = false;
        }

        if !self.arena[self.last_tag].is_inline_element
            && !(self.arena[self.last_tag].is_unformatted
                || self.arena[self.last_tag].is_content_unformatted)
        {
            self.printer.set_wrap_point();
        }
    }

    fn handle_inside_tag(&mut self, id: TokenId) {
        let token = self.stream[id].clone();
        let mut wrapped = self.arena[self.last_tag].has_wrapped_attrs;

        let has_whitespace = token.newlines > 0 || !token.whitespace_before.is_empty();
        self.printer.set_space_before_token(has_whitespace, true);

        if self.arena[self.last_tag].is_unformatted {
            self.printer.add_raw_token(&token);
        } else if self.arena[self.last_tag].tag_start_char == '{' && token.kind == TokenKind::Text {
            // mustache interiors allow newlines or a single space between
            // the open marker and the contents
            let previous_kind = self.previous_kind(&token);
            if self.printer.print_preserved_newlines(&token, previous_kind) {
                self.printer.add_raw(0, &token.whitespace_before, &token.text);
            } else {
                self.printer.print_token(&token);
            }
        } else {
            match token.kind {
                TokenKind::Attribute => self.printer.set_space_before_token(true, false),
                // no space before = and none between = and the value
                TokenKind::Equals => self.printer.set_space_before_token(false, false),
                TokenKind::Value if self.previous_kind(&token) == Some(TokenKind::Equals) => {
                    self.printer.set_space_before_token(false, false);
                }
                _ => {}
            }

            if token.kind == TokenKind::Attribute
                && self.arena[self.last_tag].tag_start_char == '<'
            {
                if self.options.wrap_attributes.is_preserve() {
                    let previous_kind = self.previous_kind(&token);
                    self.printer.traverse_whitespace(&token, previous_kind);
                    wrapped = wrapped || token.newlines != 0;
                }
                // under force, wrap the second attribute and beyond once the
                // count reaches the minimum; force-expand-multiline wraps
                // the first one as well
                if self.options.wrap_attributes.is_force()
                    && self.arena[self.last_tag].attr_count
                        >= self.options.wrap_attributes_min_attrs
                    && (self.last != Processed::Token(TokenKind::TagOpen)
                        || self.options.wrap_attributes == WrapAttributes::ForceExpandMultiline)
                {
                    self.printer.print_newline(false);
                    wrapped = true;
                }
            }

            self.printer.print_token(&token);
            wrapped = wrapped || self.printer.previous_token_wrapped();
            self.arena[self.last_tag].has_wrapped_attrs = wrapped;
        }
    }

    fn handle_text(&mut self, id: TokenId) -> Result<(), FormatError> {
        let token = self.stream[id].clone();
        if let Some(language) = self.arena[self.last_tag].embedded_language {
            self.print_embedded_text(&token, language)?;
        } else if self.arena[self.last_tag].is_unformatted
            || self.arena[self.last_tag].is_content_unformatted
        {
            self.printer.add_raw_token(&token);
        } else {
            let previous_kind = self.previous_kind(&token);
            self.printer.traverse_whitespace(&token, previous_kind);
            self.printer.print_token(&token);
        }
        Ok(())
    }

    /// Delegate an embedded script/style/markup region, preserving a
    /// comment or CDATA envelope around it. An envelope that starts but
    /// fails to match is printed verbatim; a sub-formatter error
    /// propagates.
    fn print_embedded_text(
        &mut self,
        token: &Token,
        language: EmbeddedLanguage,
    ) -> Result<(), FormatError> {
        if token.text.is_empty() {
            return Ok(());
        }

        let script_indent_level: i32 = match self.options.indent_scripts {
            IndentScripts::Normal => 1,
            IndentScripts::Keep => 0,
            IndentScripts::Separate => -(self.printer.indent_level as i32),
        };
        let indentation = self.printer.get_full_indent(script_indent_level);

        // strip one trailing blank line; one is added back after the
        // content but before the containing tag
        let mut text = TRAILING_BLANK_LINE.replace(&token.text, "").into_owned();
        let mut white = token.whitespace_before.clone();
        let mut pre = String::new();
        let mut post = String::new();

        if language != EmbeddedLanguage::Markup
            && text.starts_with('<')
            && ENVELOPE_TEST.is_match(&text)
        {
            let captured = ENVELOPE.captures(&text).map(|m| {
                (
                    m[1].to_string(),
                    m[2].to_string(),
                    m[3].to_string(),
                    m[4].to_string(),
                    m[5].to_string(),
                )
            });
            match captured {
                None => {
                    // starts to wrap but never finishes: print raw
                    self.printer.add_raw_token(token);
                    return Ok(());
                }
                Some((open_marker, opening_newline, leading, body, close_marker)) => {
                    pre = format!("{}{}\n", indentation, open_marker);
                    post = format!("{}{}", indentation, close_marker);
                    text = TRAILING_BLANK_LINE.replace(&body, "").into_owned();
                    if !opening_newline.is_empty() || leading.contains('\n') {
                        // the first content line's own spacing becomes the
                        // basis for re-indenting when no sub-formatter runs
                        if let Some(ws) = TRAILING_WHITESPACE.find(&leading) {
                            white = ws.as_str().to_string();
                        }
                    }
                }
            }
        }

        if !text.is_empty() {
            let padded = format!("{}{}", indentation, text);
            let formatter = match language {
                EmbeddedLanguage::Script => self.fmt.script_formatter.as_ref(),
                EmbeddedLanguage::Style => self.fmt.style_formatter.as_ref(),
                EmbeddedLanguage::Markup => None,
            };
            text = if language == EmbeddedLanguage::Markup {
                self.fmt.beautify(&padded)?
            } else if let Some(run) = formatter {
                run(&padded, self.options)?
            } else {
                // no sub-formatter: re-indent the lines as they are
                let mut lines = text.split('\n');
                let mut result = String::new();
                if let Some(first) = lines.next() {
                    result.push_str(&indentation);
                    result.push_str(first);
                }
                for line in lines {
                    result.push('\n');
                    result.push_str(&indentation);
                    result.push_str(line.strip_prefix(white.as_str()).unwrap_or(line));
                }
                result
            };
        }

        if !pre.is_empty() {
            if text.is_empty() {
                text = format!("{}{}", pre, post);
            } else {
                text = format!("{}{}\n{}", pre, text, post);
            }
        }

        self.printer.print_newline(false);
        if !text.is_empty() {
            self.printer.add_raw(0, "", &text);
            self.printer.print_newline(true);
        }
        Ok(())
    }

    /// Which embedded language a `script`/`style` start tag selects. A
    /// `type` attribute narrows the category; without one the tag name
    /// decides.
    fn embedded_language_for(&self, tag_check: &str, token: &Token) -> Option<EmbeddedLanguage> {
        if token.closed.is_none() {
            return None;
        }
        let fallback = match tag_check {
            "script" => Some("text/javascript".to_string()),
            "style" => Some("text/css".to_string()),
            _ => None,
        };
        let type_attribute = self.type_attribute_value(token).or(fallback)?;

        if CSS_TYPE.is_match(&type_attribute) {
            Some(EmbeddedLanguage::Style)
        } else if SCRIPT_TYPE.is_match(&type_attribute) {
            Some(EmbeddedLanguage::Script)
        } else if MARKUP_TYPE.is_match(&type_attribute) {
            Some(EmbeddedLanguage::Markup)
        } else {
            None
        }
    }

    /// The value of a `type` attribute between a start tag and its closer.
    fn type_attribute_value(&self, start: &Token) -> Option<String> {
        let mut cursor = start.next;
        while let Some(id) = cursor {
            let token = &self.stream[id];
            if token.kind == TokenKind::Eof || Some(id) == start.closed {
                break;
            }
            if token.kind == TokenKind::Attribute && token.text == "type" {
                let equals = token.next?;
                if self.stream[equals].kind != TokenKind::Equals {
                    return None;
                }
                let value = self.stream[equals].next?;
                if self.stream[value].kind != TokenKind::Value {
                    return None;
                }
                return Some(self.stream[value].text.clone());
            }
            cursor = token.next;
        }
        None
    }

    fn handle_control_flow_open(&mut self, id: TokenId) {
        let token = self.stream[id].clone();
        let has_whitespace = token.newlines > 0 || !token.whitespace_before.is_empty();
        self.printer.set_space_before_token(has_whitespace, true);
        if token.newlines > 0 {
            let previous_kind = self.previous_kind(&token);
            self.printer.print_preserved_newlines(&token, previous_kind);
        } else {
            self.printer.set_space_before_token(has_whitespace, true);
        }
        self.printer.print_token(&token);
        self.printer.indent();
    }

    fn handle_control_flow_close(&mut self, id: TokenId) {
        let token = self.stream[id].clone();
        self.printer.deindent();
        if token.newlines > 0 {
            let previous_kind = self.previous_kind(&token);
            self.printer.print_preserved_newlines(&token, previous_kind);
        } else {
            let has_whitespace = token.newlines > 0 || !token.whitespace_before.is_empty();
            self.printer.set_space_before_token(has_whitespace, true);
        }
        self.printer.print_token(&token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(source: &str) -> String {
        beautify(source, &Options::default()).unwrap()
    }

    #[test]
    fn test_nested_elements_indent() {
        assert_eq!(
            format("<div><p>hi</p></div>"),
            "<div>\n    <p>hi</p>\n</div>"
        );
    }

    #[test]
    fn test_inline_elements_stay_inline() {
        assert_eq!(format("<span>a</span>"), "<span>a</span>");
    }

    #[test]
    fn test_disabled_returns_input() {
        let options = Options {
            disabled: true,
            ..Options::default()
        };
        let source = "<div>   <p>x\r\n</div>";
        assert_eq!(beautify(source, &options).unwrap(), source);
    }

    #[test]
    fn test_invalid_options_rejected_before_formatting() {
        let options = Options {
            indent_size: 0,
            ..Options::default()
        };
        assert!(matches!(
            beautify("<div></div>", &options),
            Err(FormatError::Options(_))
        ));
    }

    #[test]
    fn test_crlf_normalized() {
        assert_eq!(format("<div>\r\n<p>x</p>\r\n</div>"), "<div>\n    <p>x</p>\n</div>");
    }

    #[test]
    fn test_base_indent_detected() {
        assert_eq!(format("  <span>a</span>"), "  <span>a</span>");
    }
}
