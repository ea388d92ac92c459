//! Input scanner
//!
//! Position-based scanner over the source text. All pattern operations are
//! anchored at the current position or search forward from it; the position
//! only ever moves forward, which is what guarantees tokenizer progress.

use regex::Regex;

pub struct InputScanner<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> InputScanner<'a> {
    pub fn new(input: &'a str) -> Self {
        InputScanner { input, position: 0 }
    }

    pub fn has_next(&self) -> bool {
        self.position < self.input.len()
    }

    /// Remaining unconsumed text.
    pub fn rest(&self) -> &'a str {
        &self.input[self.position..]
    }

    /// Character `offset` positions ahead, without consuming.
    pub fn peek(&self, offset: usize) -> Option<char> {
        self.rest().chars().nth(offset)
    }

    pub fn next(&mut self) -> Option<char> {
        let c = self.rest().chars().next()?;
        self.position += c.len_utf8();
        Some(c)
    }

    /// Consume a match of `pattern` anchored at the current position.
    pub fn match_at(&mut self, pattern: &Regex) -> Option<&'a str> {
        let m = pattern.find(self.rest())?;
        if m.start() != 0 || m.end() == 0 {
            return None;
        }
        let text = &self.rest()[..m.end()];
        self.position += m.end();
        Some(text)
    }

    /// Anchored test without consuming.
    pub fn test(&self, pattern: &Regex) -> bool {
        pattern.find(self.rest()).map_or(false, |m| m.start() == 0)
    }

    /// Consume up to (excluding) the first match of `pattern`, or everything
    /// left when there is no match.
    pub fn read_until(&mut self, pattern: &Regex) -> &'a str {
        self.read_to(pattern, false)
    }

    /// Consume up to and including the first match of `pattern`, or
    /// everything left when there is no match.
    pub fn read_until_after(&mut self, pattern: &Regex) -> &'a str {
        self.read_to(pattern, true)
    }

    fn read_to(&mut self, pattern: &Regex, include_match: bool) -> &'a str {
        let rest = self.rest();
        let end = match pattern.find(rest) {
            Some(m) if include_match => m.end(),
            Some(m) => m.start(),
            None => rest.len(),
        };
        self.position += end;
        &rest[..end]
    }
}
