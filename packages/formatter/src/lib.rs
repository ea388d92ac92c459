//! markup-beautifier
//!
//! Reformats markup fragments that mix static tags with templating syntax —
//! mustache-style `{{ ... }}` tags and `@word(...) { ... }` control-flow
//! blocks — into a canonical, indentation-correct, configurably wrapped
//! form. Embedded `<script>`/`<style>` regions can be delegated to
//! caller-supplied sub-formatters; nested markup regions recurse into this
//! same formatter.
//!
//! The pipeline is a single linear pass: raw text → [`tokenizer`] →
//! [`tokens::TokenStream`] → the beautifier state machine (consulting the
//! tag stack for structural decisions) → the printer, which owns the output
//! buffer. Malformed input is never rejected; it is formatted best-effort.
//!
//! ```
//! use markup_beautifier::{beautify, Options};
//!
//! let options = Options { indent_size: 2, ..Options::default() };
//! let html = beautify("<ul><li>a<li>b</ul>", &options).unwrap();
//! assert_eq!(html, "<ul>\n  <li>a\n  <li>b\n</ul>");
//! ```

pub mod beautifier;
pub mod defaults;
mod directives;
pub mod error;
mod input;
pub mod options;
pub mod printer;
pub mod tag_stack;
pub mod tokenizer;
pub mod tokens;

pub use beautifier::{beautify, Beautifier, EmbeddedFormatter};
pub use error::{FormatError, OptionsError};
pub use options::{IndentScripts, Options, TemplateDialect, WrapAttributes};
