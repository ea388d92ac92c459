//! Printer and output composer
//!
//! The sole writer of the output buffer. [`Output`] owns the buffered lines,
//! the pending-space flag and the wrap-point bookkeeping; [`Printer`] layers
//! the indent level, alignment column and newline-preservation policy on top
//! of it. Alignment columns are always spaces; indent levels use the
//! configured indent string.

use smallvec::SmallVec;

use crate::options::Options;
use crate::tokens::{Token, TokenKind};

/// Precomputed indent strings for (level, alignment column) pairs.
struct IndentCache {
    base: String,
    indent_string: String,
    /// Characters per indent level.
    indent_size: usize,
}

impl IndentCache {
    fn new(options: &Options, base_indent_string: &str) -> Self {
        let (indent_string, indent_size) = if options.indent_with_tabs {
            ("\t".to_string(), 1)
        } else {
            (
                options.indent_char.to_string().repeat(options.indent_size),
                options.indent_size,
            )
        };
        let base = if options.indent_level > 0 {
            indent_string.repeat(options.indent_level)
        } else {
            base_indent_string.to_string()
        };
        IndentCache {
            base,
            indent_string,
            indent_size,
        }
    }

    /// Character count of the prefix for a line at `indent`/`column`. A
    /// negative indent means a raw line with no prefix at all.
    fn indent_width(&self, indent: i32, column: usize) -> usize {
        if indent < 0 {
            return 0;
        }
        self.base.len() + indent as usize * self.indent_size + column
    }

    fn indent_string(&self, indent: i32, column: usize) -> String {
        if indent < 0 {
            return String::new();
        }
        let mut result =
            String::with_capacity(self.base.len() + indent as usize * self.indent_size + column);
        result.push_str(&self.base);
        for _ in 0..indent {
            result.push_str(&self.indent_string);
        }
        for _ in 0..column {
            result.push(' ');
        }
        result
    }
}

#[derive(Debug)]
struct OutputLine {
    items: SmallVec<[String; 8]>,
    character_count: usize,
    indent_count: i32,
    alignment_count: usize,
    wrap_point_index: usize,
    wrap_point_character_count: usize,
    wrap_point_indent_count: i32,
    wrap_point_alignment_count: usize,
}

impl OutputLine {
    fn new() -> Self {
        OutputLine {
            items: SmallVec::new(),
            character_count: 0,
            indent_count: 0,
            alignment_count: 0,
            wrap_point_index: 0,
            wrap_point_character_count: 0,
            wrap_point_indent_count: 0,
            wrap_point_alignment_count: 0,
        }
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Indentation can only change while the line is still empty.
    fn set_indent(&mut self, indent: i32, alignment: usize, width: usize) {
        if self.is_empty() {
            self.indent_count = indent;
            self.alignment_count = alignment;
            self.character_count = width;
        }
    }

    fn push(&mut self, item: &str) {
        if item.is_empty() {
            return;
        }
        self.character_count += item.chars().count();
        self.items.push(item.to_string());
    }

    fn trim_trailing_spaces(&mut self) {
        while self.items.last().map(String::as_str) == Some(" ") {
            self.items.pop();
            self.character_count -= 1;
        }
    }

    fn render(&self, cache: &IndentCache) -> String {
        if self.is_empty() {
            return String::new();
        }
        let mut result = cache.indent_string(self.indent_count, self.alignment_count);
        for item in &self.items {
            result.push_str(item);
        }
        result
    }

    fn text(&self) -> String {
        self.items.concat()
    }
}

/// The buffered output: a list of lines plus the token-spacing flags.
pub struct Output {
    cache: IndentCache,
    lines: Vec<OutputLine>,
    /// Indent applied to lines opened from here on (wrap continuations
    /// included).
    pending_indent: i32,
    pending_alignment: usize,
    pub space_before_token: bool,
    pub non_breaking_space: bool,
    pub previous_token_wrapped: bool,
    wrap_line_length: usize,
    end_with_newline: bool,
}

impl Output {
    pub fn new(options: &Options, base_indent_string: &str) -> Self {
        let mut output = Output {
            cache: IndentCache::new(options, base_indent_string),
            lines: Vec::new(),
            pending_indent: 0,
            pending_alignment: 0,
            space_before_token: false,
            non_breaking_space: false,
            previous_token_wrapped: false,
            wrap_line_length: options.wrap_line_length,
            end_with_newline: options.end_with_newline,
        };
        output.open_line();
        output
    }

    fn open_line(&mut self) {
        let mut line = OutputLine::new();
        let width = self
            .cache
            .indent_width(self.pending_indent, self.pending_alignment);
        line.set_indent(self.pending_indent, self.pending_alignment, width);
        self.lines.push(line);
    }

    fn current(&mut self) -> &mut OutputLine {
        self.lines.last_mut().expect("output always has a line")
    }

    /// True while nothing has been written at all.
    pub fn is_empty(&self) -> bool {
        self.lines.len() == 1 && self.lines[0].is_empty()
    }

    pub fn just_added_newline(&self) -> bool {
        self.lines.last().map_or(true, OutputLine::is_empty)
    }

    pub fn just_added_blankline(&self) -> bool {
        self.is_empty()
            || (self.just_added_newline()
                && self.lines.len() > 1
                && self.lines[self.lines.len() - 2].is_empty())
    }

    pub fn current_line_has(&self, needle: &str) -> bool {
        self.lines
            .last()
            .map_or(false, |line| line.text().contains(needle))
    }

    /// Never adds a newline at the very start of the output; unforced
    /// newlines collapse onto an already fresh line.
    pub fn add_new_line(&mut self, force: bool) -> bool {
        if self.is_empty() || (!force && self.just_added_newline()) {
            return false;
        }
        self.open_line();
        true
    }

    pub fn set_indent(&mut self, indent: i32, alignment: usize) {
        self.pending_indent = indent;
        self.pending_alignment = alignment;
        if self.lines.len() > 1 {
            let width = self.cache.indent_width(indent, alignment);
            self.current().set_indent(indent, alignment, width);
        } else {
            // the first line of output is never indented
            let width = self.cache.indent_width(0, 0);
            self.current().set_indent(0, 0, width);
        }
    }

    /// Mark the current position as a permissible line break.
    pub fn set_wrap_point(&mut self) {
        if self.wrap_line_length == 0 {
            return;
        }
        let pending_indent = self.pending_indent;
        let pending_alignment = self.pending_alignment;
        let line = self.current();
        line.wrap_point_index = line.items.len();
        line.wrap_point_character_count = line.character_count;
        line.wrap_point_indent_count = pending_indent;
        line.wrap_point_alignment_count = pending_alignment;
    }

    pub fn add_token(&mut self, text: &str) {
        self.add_space_before_token();
        self.current().push(text);
        self.space_before_token = false;
        self.non_breaking_space = false;
        self.previous_token_wrapped = self.allow_wrap();
    }

    fn add_space_before_token(&mut self) {
        if self.space_before_token && !self.just_added_newline() {
            if !self.non_breaking_space {
                self.set_wrap_point();
            }
            self.current().push(" ");
        }
    }

    fn allow_wrap(&mut self) -> bool {
        if self.wrap_line_length == 0 {
            return false;
        }
        let next_width = self
            .cache
            .indent_width(self.pending_indent, self.pending_alignment);
        let line = self.lines.last().expect("output always has a line");
        let should_wrap = line.wrap_point_index > 0
            && line.character_count > self.wrap_line_length
            && line.wrap_point_character_count > next_width;
        if !should_wrap {
            return false;
        }

        self.open_line();
        let source_index = self.lines.len() - 2;
        let (head, tail) = self.lines.split_at_mut(source_index + 1);
        let source = &mut head[source_index];
        let target = &mut tail[0];

        let width = self
            .cache
            .indent_width(source.wrap_point_indent_count, source.wrap_point_alignment_count);
        target.set_indent(
            source.wrap_point_indent_count,
            source.wrap_point_alignment_count,
            width,
        );

        let moved: Vec<String> = source.items.drain(source.wrap_point_index..).collect();
        target.character_count += source.character_count - source.wrap_point_character_count;
        source.character_count = source.wrap_point_character_count;
        source.wrap_point_index = 0;
        for (i, item) in moved.into_iter().enumerate() {
            if i == 0 && item == " " {
                target.character_count -= 1;
                continue;
            }
            target.items.push(item);
        }
        true
    }

    /// Verbatim text: `newlines` raw line breaks, then the original
    /// whitespace and text with no indent normalization.
    pub fn add_raw(&mut self, newlines: u32, whitespace: &str, text: &str) {
        for _ in 0..newlines {
            self.open_line();
        }
        self.current().set_indent(-1, 0, 0);
        self.current().push(whitespace);
        self.current().push(text);
        self.space_before_token = false;
        self.non_breaking_space = false;
        self.previous_token_wrapped = false;
    }

    fn trim(&mut self, eat_newlines: bool) {
        self.current().trim_trailing_spaces();
        while eat_newlines && self.lines.len() > 1 && self.current().is_empty() {
            self.lines.pop();
            self.current().trim_trailing_spaces();
        }
    }

    pub fn get_code(&mut self) -> String {
        self.trim(true);
        // raw tokens may carry trailing newlines of their own
        if let Some(last_item) = self.current().items.pop() {
            let trimmed = last_item.trim_end_matches('\n');
            let removed = last_item.len() - trimmed.len();
            let trimmed = trimmed.to_string();
            let line = self.current();
            line.character_count -= removed;
            line.items.push(trimmed);
        }
        if self.end_with_newline {
            self.open_line();
        }
        let rendered: Vec<String> = self.lines.iter().map(|line| line.render(&self.cache)).collect();
        rendered.join("\n")
    }
}

/// Indentation, alignment and newline policy layered over [`Output`].
pub struct Printer {
    pub indent_level: usize,
    pub alignment_size: usize,
    max_preserve_newlines: u32,
    preserve_newlines: bool,
    output: Output,
}

impl Printer {
    pub fn new(options: &Options, base_indent_string: &str) -> Self {
        Printer {
            indent_level: 0,
            alignment_size: 0,
            max_preserve_newlines: options.max_preserve_newlines,
            preserve_newlines: options.preserve_newlines,
            output: Output::new(options, base_indent_string),
        }
    }

    pub fn set_space_before_token(&mut self, value: bool, non_breaking: bool) {
        self.output.space_before_token = value;
        self.output.non_breaking_space = non_breaking;
    }

    pub fn set_wrap_point(&mut self) {
        self.output
            .set_indent(self.indent_level as i32, self.alignment_size);
        self.output.set_wrap_point();
    }

    pub fn add_raw_token(&mut self, token: &Token) {
        self.output
            .add_raw(token.newlines, &token.whitespace_before, &token.text);
    }

    pub fn add_raw(&mut self, newlines: u32, whitespace: &str, text: &str) {
        self.output.add_raw(newlines, whitespace, text);
    }

    /// Reproduce the newlines a token carried in the source, capped by the
    /// preservation policy. Returns whether any newline was printed.
    pub fn print_preserved_newlines(
        &mut self,
        token: &Token,
        previous_kind: Option<TokenKind>,
    ) -> bool {
        let mut newlines = 0;
        if token.kind != TokenKind::Text
            && previous_kind.map_or(false, |kind| kind != TokenKind::Text)
        {
            newlines = u32::from(token.newlines > 0);
        }
        if self.preserve_newlines {
            newlines = token.newlines.min(self.max_preserve_newlines + 1);
        }
        for n in 0..newlines {
            self.print_newline(n > 0);
        }
        newlines != 0
    }

    /// A token that carried whitespace gets either its preserved newlines or
    /// a single breakable space.
    pub fn traverse_whitespace(&mut self, token: &Token, previous_kind: Option<TokenKind>) -> bool {
        if token.whitespace_before.is_empty() && token.newlines == 0 {
            return false;
        }
        if !self.print_preserved_newlines(token, previous_kind) {
            self.output.space_before_token = true;
        }
        true
    }

    pub fn previous_token_wrapped(&self) -> bool {
        self.output.previous_token_wrapped
    }

    pub fn print_newline(&mut self, force: bool) {
        self.output.add_new_line(force);
    }

    pub fn print_token(&mut self, token: &Token) {
        self.print_text(&token.text);
    }

    pub fn print_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.output
            .set_indent(self.indent_level as i32, self.alignment_size);
        self.output.add_token(text);
    }

    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    pub fn deindent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
            self.output
                .set_indent(self.indent_level as i32, self.alignment_size);
        }
    }

    /// Indent string `delta` levels away from the current one; never less
    /// than nothing.
    pub fn get_full_indent(&self, delta: i32) -> String {
        let level = self.indent_level as i32 + delta;
        if level < 1 {
            return String::new();
        }
        self.output.cache.indent_string(level, 0)
    }

    pub fn current_line_has(&self, needle: &str) -> bool {
        self.output.current_line_has(needle)
    }

    pub fn just_added_newline(&self) -> bool {
        self.output.just_added_newline()
    }

    pub fn just_added_blankline(&self) -> bool {
        self.output.just_added_blankline()
    }

    pub fn finish(mut self) -> String {
        self.output.get_code()
    }
}
