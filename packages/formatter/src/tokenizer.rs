//! Tokenizer
//!
//! Single-pass scanner that turns raw markup into a [`TokenStream`]. At each
//! position a fixed, ordered set of match rules is tried and the first rule
//! producing non-empty text wins; the final fallback consumes one
//! unrecognized character as an [`TokenKind::Unknown`] token, so forward
//! progress is guaranteed on any input. The scanner never fails: unterminated
//! constructs simply read to end-of-input.
//!
//! Raw-text regions (`script`/`style` bodies, `unformatted` and
//! `content_unformatted` elements, comments, CDATA) are read as single
//! tokens and never re-tokenized. Mustache spans inside words and attribute
//! values are consumed atomically so that delimiter characters inside
//! `{{ ... }}` cannot split a token.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::directives;
use crate::input::InputScanner;
use crate::options::{Options, TemplateDialect};
use crate::tokens::{Token, TokenId, TokenKind, TokenStream};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\n\r\t ]+").unwrap());

// Words end at whitespace or when a tag starts; inside a control-flow block
// the closing brace ends them as well.
static WORD_STOP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\n\r\t <]").unwrap());
static WORD_STOP_TMPL: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\n\r\t <]|\{\{").unwrap());
static WORD_CF_STOP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\n\r\t <}]").unwrap());
static WORD_CF_STOP_TMPL: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\n\r\t <}]|\{\{").unwrap());

static SINGLE_QUOTE_STOP: Lazy<Regex> = Lazy::new(|| Regex::new(r"'").unwrap());
static SINGLE_QUOTE_STOP_TMPL: Lazy<Regex> = Lazy::new(|| Regex::new(r"'|\{\{").unwrap());
static DOUBLE_QUOTE_STOP: Lazy<Regex> = Lazy::new(|| Regex::new(r#"""#).unwrap());
static DOUBLE_QUOTE_STOP_TMPL: Lazy<Regex> = Lazy::new(|| Regex::new(r#""|\{\{"#).unwrap());

static ATTRIBUTE_STOP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\n\r\t =>]|/>").unwrap());
static ATTRIBUTE_STOP_TMPL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\n\r\t =>]|/>|\{\{").unwrap());
static ELEMENT_NAME_STOP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\n\r\t >/]").unwrap());
static ELEMENT_NAME_STOP_TMPL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\n\r\t >/]|\{\{").unwrap());

static MUSTACHE_OPEN_STOP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\n\r\t }]").unwrap());
static MUSTACHE_RAW_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\}\}").unwrap());
static MUSTACHE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"\}\}").unwrap());
static MUSTACHE_UNESCAPED_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"\}\}\}").unwrap());
static MUSTACHE_COMMENT_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"--\}\}").unwrap());

static COMMENT_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"-->").unwrap());
static CDATA_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"\]\]>").unwrap());
// https://en.wikipedia.org/wiki/Conditional_comment
static CONDITIONAL_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"\]>").unwrap());
static PROCESSING_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"\?>").unwrap());

static CONTROL_FLOW_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"@[a-zA-Z]+[^({]*[({]").unwrap());

/// Tokenize a markup fragment. Pure function of its inputs; never fails.
pub fn tokenize(source: &str, options: &Options) -> TokenStream {
    Tokenizer::new(source, options).tokenize()
}

pub struct Tokenizer<'a> {
    input: InputScanner<'a>,
    options: &'a Options,
    mustache_enabled: bool,
    mustache_as_tags: bool,
    control_flow_enabled: bool,
    delimiter: Option<(String, Regex)>,
    newline_count: u32,
    whitespace_before: String,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str, options: &'a Options) -> Self {
        let delimiter = if options.unformatted_content_delimiter.is_empty() {
            None
        } else {
            let literal = regex::escape(&options.unformatted_content_delimiter);
            Some((
                options.unformatted_content_delimiter.clone(),
                Regex::new(&literal).unwrap(),
            ))
        };

        Tokenizer {
            input: InputScanner::new(source),
            options,
            mustache_enabled: options.dialect_enabled(TemplateDialect::Mustache),
            mustache_as_tags: options.indent_mustache,
            control_flow_enabled: options.dialect_enabled(TemplateDialect::ControlFlow),
            delimiter,
            newline_count: 0,
            whitespace_before: String::new(),
        }
    }

    /// Run the scanner to end-of-input, linking `previous`/`next` in document
    /// order and `opened`/`closed`/`parent` through an open-token stack.
    pub fn tokenize(mut self) -> TokenStream {
        let mut stream = TokenStream::new();
        let mut open_token: Option<TokenId> = None;
        let mut open_stack: Vec<Option<TokenId>> = Vec::new();
        let mut previous: Option<TokenId> = None;

        loop {
            let token = self.next_token(&stream, previous, open_token);
            let kind = token.kind;
            let id = stream.push(token);

            stream.get_mut(id).parent = open_token;
            if matches!(kind, TokenKind::TagOpen | TokenKind::ControlFlowOpen) {
                open_stack.push(open_token);
                open_token = Some(id);
            } else if let Some(open_id) = open_token {
                if is_closing(&stream, id, open_id) {
                    stream.get_mut(id).opened = Some(open_id);
                    stream.get_mut(open_id).closed = Some(id);
                    open_token = open_stack.pop().flatten();
                    stream.get_mut(id).parent = open_token;
                }
            }

            stream.get_mut(id).previous = previous;
            if let Some(prev) = previous {
                stream.get_mut(prev).next = Some(id);
            }
            previous = Some(id);

            if kind == TokenKind::Eof {
                break;
            }
        }
        stream
    }

    fn next_token(
        &mut self,
        stream: &TokenStream,
        previous: Option<TokenId>,
        open: Option<TokenId>,
    ) -> Token {
        self.read_whitespace();
        let c = match self.input.peek(0) {
            Some(c) => c,
            None => return self.create_token(TokenKind::Eof, String::new()),
        };
        let previous = previous.map(|id| &stream[id]);
        let open = open.map(|id| &stream[id]);

        if let Some(token) = self.read_open_mustache(c, open) {
            return token;
        }
        if let Some(token) = self.read_attribute(c, previous, open) {
            return token;
        }
        if let Some(token) = self.read_close(c, open) {
            return token;
        }
        if let Some(token) = self.read_script_and_style(c, previous, stream) {
            return token;
        }
        if let Some(token) = self.read_control_flows(c, open) {
            return token;
        }
        if let Some(token) = self.read_raw_content(previous, open, stream) {
            return token;
        }
        if let Some(token) = self.read_content_word(c, open) {
            return token;
        }
        if let Some(token) = self.read_comment_or_cdata(c) {
            return token;
        }
        if let Some(token) = self.read_processing(c) {
            return token;
        }
        if let Some(token) = self.read_open(c, open) {
            return token;
        }
        // guaranteed progress on anything the rules above reject
        let unknown = self.input.next().map(|ch| ch.to_string()).unwrap_or_default();
        self.create_token(TokenKind::Unknown, unknown)
    }

    /// Leading whitespace is captured on the following token rather than
    /// emitted as its own token.
    fn read_whitespace(&mut self) {
        if let Some(ws) = self.input.match_at(&WHITESPACE) {
            self.newline_count = ws.matches('\n').count() as u32;
            let after_last_newline = match ws.rfind('\n') {
                Some(i) => &ws[i + 1..],
                None => ws,
            };
            self.whitespace_before = after_last_newline.to_string();
        }
    }

    fn create_token(&mut self, kind: TokenKind, text: String) -> Token {
        let token = Token::new(
            kind,
            text,
            self.newline_count,
            std::mem::take(&mut self.whitespace_before),
        );
        self.newline_count = 0;
        token
    }

    fn read_open_mustache(&mut self, c: char, open: Option<&Token>) -> Option<Token> {
        if open.map_or(false, |t| t.kind != TokenKind::ControlFlowOpen) {
            return None;
        }
        if !(self.control_flow_enabled || self.mustache_as_tags) {
            return None;
        }
        if c != '{' || self.input.peek(1) != Some('{') {
            return None;
        }
        if self.mustache_as_tags && self.input.peek(2) == Some('!') {
            let text = if self.input.rest().starts_with("{{!--") {
                self.input.read_until_after(&MUSTACHE_COMMENT_END)
            } else {
                self.input.read_until_after(&MUSTACHE_END)
            };
            let text = text.to_string();
            return Some(self.create_token(TokenKind::Comment, text));
        }
        let text = self.input.read_until(&MUSTACHE_OPEN_STOP).to_string();
        Some(self.create_token(TokenKind::TagOpen, text))
    }

    fn read_attribute(
        &mut self,
        c: char,
        previous: Option<&Token>,
        open: Option<&Token>,
    ) -> Option<Token> {
        if !open.map_or(false, |t| t.text.starts_with('<')) {
            return None;
        }
        if c == '=' {
            self.input.next();
            return Some(self.create_token(TokenKind::Equals, "=".to_string()));
        }
        if c == '"' || c == '\'' {
            let mut content = String::new();
            self.input.next();
            content.push(c);
            let (plain, templatable) = if c == '"' {
                (&*DOUBLE_QUOTE_STOP, &*DOUBLE_QUOTE_STOP_TMPL)
            } else {
                (&*SINGLE_QUOTE_STOP, &*SINGLE_QUOTE_STOP_TMPL)
            };
            content.push_str(&self.read_templatable(plain, templatable, true, false));
            return Some(self.create_token(TokenKind::Value, content));
        }
        let text = self.read_templatable(&ATTRIBUTE_STOP, &ATTRIBUTE_STOP_TMPL, false, false);
        if text.is_empty() {
            return None;
        }
        let kind = if previous.map_or(false, |p| p.kind == TokenKind::Equals) {
            TokenKind::Value
        } else {
            TokenKind::Attribute
        };
        Some(self.create_token(kind, text))
    }

    fn read_close(&mut self, c: char, open: Option<&Token>) -> Option<Token> {
        let open = open?;
        if open.kind != TokenKind::TagOpen {
            return None;
        }
        if open.text.starts_with('<') {
            if c == '>' {
                self.input.next();
                return Some(self.create_token(TokenKind::TagClose, ">".to_string()));
            }
            if c == '/' && self.input.peek(1) == Some('>') {
                self.input.next();
                self.input.next();
                return Some(self.create_token(TokenKind::TagClose, "/>".to_string()));
            }
        } else if open.text.starts_with('{') && c == '}' && self.input.peek(1) == Some('}') {
            self.input.next();
            self.input.next();
            return Some(self.create_token(TokenKind::TagClose, "}}".to_string()));
        }
        None
    }

    /// Script and style bodies are read whole, optionally recognizing a
    /// comment/CDATA envelope as the content token.
    fn read_script_and_style(
        &mut self,
        c: char,
        previous: Option<&Token>,
        stream: &TokenStream,
    ) -> Option<Token> {
        let previous = previous?;
        if previous.kind != TokenKind::TagClose || previous.text.starts_with('/') {
            return None;
        }
        let opened = &stream[previous.opened?];
        if !opened.text.starts_with('<') {
            return None;
        }
        let tag_name = opened.text[1..].to_lowercase();
        if tag_name != "script" && tag_name != "style" {
            return None;
        }
        if let Some(mut token) = self.read_comment_or_cdata(c) {
            token.kind = TokenKind::Text;
            return Some(token);
        }
        let end_tag = end_tag_pattern(&tag_name);
        let text = self.input.read_until(&end_tag).to_string();
        if text.is_empty() {
            return None;
        }
        Some(self.create_token(TokenKind::Text, text))
    }

    fn read_control_flows(&mut self, c: char, open: Option<&Token>) -> Option<Token> {
        if !self.control_flow_enabled {
            return None;
        }
        if c == '@' {
            let start = self.input.match_at(&CONTROL_FLOW_START)?;
            let mut text = start.to_string();
            let mut opening_parentheses: u32 = if text.ends_with('(') { 1 } else { 0 };
            let mut closing_parentheses: u32 = 0;
            // the block brace is where open and closed parentheses balance,
            // e.g. @if ({value: true} !== null) {
            while !(text.ends_with('{') && opening_parentheses == closing_parentheses) {
                match self.input.next() {
                    None => break,
                    Some(next) => {
                        if next == '(' {
                            opening_parentheses += 1;
                        } else if next == ')' {
                            closing_parentheses += 1;
                        }
                        text.push(next);
                    }
                }
            }
            return Some(self.create_token(TokenKind::ControlFlowOpen, text));
        }
        if c == '}' && open.map_or(false, |t| t.kind == TokenKind::ControlFlowOpen) {
            self.input.next();
            return Some(self.create_token(TokenKind::ControlFlowClose, "}".to_string()));
        }
        None
    }

    /// Interiors of mustache tags and of `unformatted`/`content_unformatted`
    /// elements come through as one opaque text token.
    fn read_raw_content(
        &mut self,
        previous: Option<&Token>,
        open: Option<&Token>,
        stream: &TokenStream,
    ) -> Option<Token> {
        let mut text = String::new();
        if open.map_or(false, |t| t.text.starts_with('{')) {
            text = self.input.read_until(&MUSTACHE_RAW_CLOSE).to_string();
        } else if let Some(previous) = previous {
            // a self-closed tag has no content
            if previous.kind == TokenKind::TagClose && !previous.text.starts_with('/') {
                if let Some(opened_id) = previous.opened {
                    let opened = &stream[opened_id];
                    if opened.text.starts_with('<') {
                        let tag_name = opened.text[1..].to_lowercase();
                        if self.is_content_unformatted(&tag_name) {
                            let end_tag = end_tag_pattern(&tag_name);
                            text = self.input.read_until(&end_tag).to_string();
                        }
                    }
                }
            }
        }
        if text.is_empty() {
            return None;
        }
        Some(self.create_token(TokenKind::Text, text))
    }

    /// Void elements have no content; script and style are handled earlier.
    fn is_content_unformatted(&self, tag_name: &str) -> bool {
        !self.options.void_elements.contains(tag_name)
            && (self.options.content_unformatted.contains(tag_name)
                || self.options.unformatted.contains(tag_name))
    }

    fn read_content_word(&mut self, c: char, open: Option<&Token>) -> Option<Token> {
        let mut text = String::new();
        if let Some((delimiter, pattern)) = self.delimiter.clone() {
            if delimiter.starts_with(c) && self.input.rest().starts_with(delimiter.as_str()) {
                for _ in delimiter.chars() {
                    self.input.next();
                }
                let tail = self.input.read_until_after(&pattern);
                text = format!("{}{}", delimiter, tail);
            }
        }
        if text.is_empty() {
            let (plain, templatable) =
                if open.map_or(false, |t| t.kind == TokenKind::ControlFlowOpen) {
                    (&*WORD_CF_STOP, &*WORD_CF_STOP_TMPL)
                } else {
                    (&*WORD_STOP, &*WORD_STOP_TMPL)
                };
            text = self.read_templatable(plain, templatable, false, true);
        }
        if text.is_empty() {
            return None;
        }
        Some(self.create_token(TokenKind::Text, text))
    }

    fn read_comment_or_cdata(&mut self, c: char) -> Option<Token> {
        if c != '<' || self.input.peek(1) != Some('!') {
            return None;
        }
        let rest = self.input.rest();
        let mut parsed_directives = None;
        // comments are treated as literals; only the closing marker matters
        let text = if rest.starts_with("<!--") {
            let mut text = self.input.read_until_after(&COMMENT_END).to_string();
            if let Some(map) = directives::get_directives(&text) {
                if map.get("ignore").map(String::as_str) == Some("start") {
                    text.push_str(directives::read_ignored(&mut self.input));
                }
                parsed_directives = Some(map);
            }
            text
        } else if rest.starts_with("<![CDATA[") {
            self.input.read_until_after(&CDATA_END).to_string()
        } else {
            return None;
        };
        let mut token = self.create_token(TokenKind::Comment, text);
        token.directives = parsed_directives;
        Some(token)
    }

    fn read_processing(&mut self, c: char) -> Option<Token> {
        if c != '<' {
            return None;
        }
        let peek1 = self.input.peek(1);
        if peek1 != Some('!') && peek1 != Some('?') {
            return None;
        }
        let rest = self.input.rest();
        let text = if rest.starts_with("<![") {
            self.input.read_until_after(&CONDITIONAL_END).to_string()
        } else if rest.starts_with("<?") {
            self.input.read_until_after(&PROCESSING_END).to_string()
        } else {
            return None;
        };
        Some(self.create_token(TokenKind::Comment, text))
    }

    fn read_open(&mut self, c: char, open: Option<&Token>) -> Option<Token> {
        if open.map_or(false, |t| t.kind != TokenKind::ControlFlowOpen) {
            return None;
        }
        if c != '<' {
            return None;
        }
        self.input.next();
        let mut text = String::from("<");
        if self.input.peek(0) == Some('/') {
            self.input.next();
            text.push('/');
        }
        text.push_str(&self.read_templatable(
            &ELEMENT_NAME_STOP,
            &ELEMENT_NAME_STOP_TMPL,
            false,
            false,
        ));
        Some(self.create_token(TokenKind::TagOpen, text))
    }

    /// Read up to a stop pattern, consuming mustache spans atomically along
    /// the way. In `word_context`, a mustache span ends the read instead when
    /// mustache tags are structural (`indent_mustache`), so the span becomes
    /// its own tag token.
    fn read_templatable(
        &mut self,
        plain: &Regex,
        templatable: &Regex,
        until_after: bool,
        word_context: bool,
    ) -> String {
        let stop = if self.mustache_enabled { templatable } else { plain };
        let mut out = String::new();
        loop {
            out.push_str(self.input.read_until(stop));
            if !self.input.has_next() {
                break;
            }
            if self.mustache_enabled && self.input.rest().starts_with("{{") {
                if word_context && self.mustache_as_tags {
                    break;
                }
                out.push_str(&self.read_atomic_mustache());
                continue;
            }
            if until_after {
                if let Some(matched) = self.input.match_at(plain) {
                    out.push_str(matched);
                }
            }
            break;
        }
        out
    }

    fn read_atomic_mustache(&mut self) -> String {
        let rest = self.input.rest();
        if rest.starts_with("{{!--") {
            self.input.read_until_after(&MUSTACHE_COMMENT_END).to_string()
        } else if rest.starts_with("{{{") {
            self.input
                .read_until_after(&MUSTACHE_UNESCAPED_END)
                .to_string()
        } else {
            self.input.read_until_after(&MUSTACHE_END).to_string()
        }
    }
}

/// Case-insensitive end-tag marker, e.g. `</script  >`.
fn end_tag_pattern(tag_name: &str) -> Regex {
    Regex::new(&format!(r"(?i)</{}[\n\r\t ]*>", regex::escape(tag_name))).unwrap()
}

fn is_closing(stream: &TokenStream, id: TokenId, open_id: TokenId) -> bool {
    let token = &stream[id];
    let open = &stream[open_id];
    match token.kind {
        TokenKind::TagClose => {
            ((token.text == ">" || token.text == "/>") && open.text.starts_with('<'))
                || (token.text == "}}" && open.text.starts_with("{{"))
        }
        TokenKind::ControlFlowClose => token.text == "}" && open.text.ends_with('{'),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let options = Options::default();
        let stream = tokenize(source, &options);
        (0..stream.len()).map(|id| stream[id].kind).collect()
    }

    #[test]
    fn test_simple_element() {
        assert_eq!(
            kinds("<div>a</div>"),
            vec![
                TokenKind::TagOpen,
                TokenKind::TagClose,
                TokenKind::Text,
                TokenKind::TagOpen,
                TokenKind::TagClose,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_attribute_value_tokens() {
        assert_eq!(
            kinds("<a href=\"x\">"),
            vec![
                TokenKind::TagOpen,
                TokenKind::Attribute,
                TokenKind::Equals,
                TokenKind::Value,
                TokenKind::TagClose,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unknown_character_fallback_makes_progress() {
        // a stray closing brace outside any construct has no rule
        let options = Options::default();
        let stream = tokenize("}", &options);
        assert_eq!(stream[0].kind, TokenKind::Unknown);
        assert_eq!(stream[0].text, "}");
        assert_eq!(stream[1].kind, TokenKind::Eof);
    }

    #[test]
    fn test_open_close_pairing() {
        let options = Options::default();
        let stream = tokenize("<div>", &options);
        assert_eq!(stream[0].closed, Some(1));
        assert_eq!(stream[1].opened, Some(0));
    }

    #[test]
    fn test_whitespace_captured_on_following_token() {
        let options = Options::default();
        let stream = tokenize("<br>\n\n  <br>", &options);
        let second_open = &stream[2];
        assert_eq!(second_open.kind, TokenKind::TagOpen);
        assert_eq!(second_open.newlines, 2);
        assert_eq!(second_open.whitespace_before, "  ");
    }
}
