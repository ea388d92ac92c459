//! Comment directives
//!
//! A comment of the form `<!-- beautify key:value ... -->` carries
//! instructions for the formatter. The only recognized directive is
//! `ignore:start` / `ignore:end`: everything between the two comments is
//! carried into the start comment's token verbatim and reproduced untouched.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::input::InputScanner;

static DIRECTIVES_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<!--\s*beautify((?:\s+\w+:\w+)+)\s*-->").unwrap());

static DIRECTIVE_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w+):(\w+)").unwrap());

static IGNORE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<!--\s*beautify\s+ignore:end\s*-->").unwrap());

pub type DirectivesMap = HashMap<String, String>;

/// Parse the directives carried by a comment, if any.
pub fn get_directives(text: &str) -> Option<DirectivesMap> {
    let captures = DIRECTIVES_BLOCK.captures(text)?;
    let mut directives = DirectivesMap::new();
    for item in DIRECTIVE_ITEM.captures_iter(&captures[1]) {
        directives.insert(item[1].to_string(), item[2].to_string());
    }
    Some(directives)
}

/// Consume input through the matching `ignore:end` comment (or to the end of
/// input when the closer is missing).
pub fn read_ignored<'a>(input: &mut InputScanner<'a>) -> &'a str {
    input.read_until_after(&IGNORE_END)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ignore_start_directive() {
        let directives = get_directives("<!-- beautify ignore:start -->").unwrap();
        assert_eq!(directives.get("ignore").map(String::as_str), Some("start"));
    }

    #[test]
    fn test_plain_comment_carries_no_directives() {
        assert!(get_directives("<!-- just a comment -->").is_none());
        assert!(get_directives("<!-- beautify -->").is_none());
    }

    #[test]
    fn test_read_ignored() {
        let mut input = InputScanner::new("<b>raw</b><!-- beautify ignore:end --><i>");
        let ignored = read_ignored(&mut input);
        assert!(ignored.ends_with("ignore:end -->"));
        assert_eq!(input.rest(), "<i>");
    }
}
