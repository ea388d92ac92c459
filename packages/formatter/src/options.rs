//! Formatting options
//!
//! An immutable configuration record, constructed once per formatting call
//! and read-only afterwards. Records can be built in code (struct literal
//! over [`Options::default`]) or deserialized from a JSON value with
//! [`Options::from_json_value`]. Validation happens eagerly: unknown enum
//! values and non-positive sizes are rejected before any tokenization.

use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::OptionsError;

/// Attribute wrapping policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WrapAttributes {
    #[default]
    Auto,
    Force,
    ForceAligned,
    ForceExpandMultiline,
    AlignedMultiple,
    Preserve,
    PreserveAligned,
}

impl WrapAttributes {
    /// Any of the `force*` modes.
    pub fn is_force(self) -> bool {
        matches!(
            self,
            WrapAttributes::Force
                | WrapAttributes::ForceAligned
                | WrapAttributes::ForceExpandMultiline
        )
    }

    /// Any of the `preserve*` modes.
    pub fn is_preserve(self) -> bool {
        matches!(
            self,
            WrapAttributes::Preserve | WrapAttributes::PreserveAligned
        )
    }

    /// Modes that align wrapped attributes to the tag-open column.
    pub fn is_aligned(self) -> bool {
        matches!(
            self,
            WrapAttributes::ForceAligned
                | WrapAttributes::AlignedMultiple
                | WrapAttributes::PreserveAligned
        )
    }
}

impl FromStr for WrapAttributes {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(WrapAttributes::Auto),
            "force" => Ok(WrapAttributes::Force),
            "force-aligned" => Ok(WrapAttributes::ForceAligned),
            "force-expand-multiline" => Ok(WrapAttributes::ForceExpandMultiline),
            "aligned-multiple" => Ok(WrapAttributes::AlignedMultiple),
            "preserve" => Ok(WrapAttributes::Preserve),
            "preserve-aligned" => Ok(WrapAttributes::PreserveAligned),
            _ => Err(OptionsError::UnknownValue {
                option: "wrap_attributes",
                value: s.to_string(),
            }),
        }
    }
}

/// Indentation handed to embedded script/style sub-formatters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IndentScripts {
    /// One level deeper than the owning tag.
    #[default]
    Normal,
    /// Same level as the owning tag.
    Keep,
    /// Column zero, independent of the owning tag.
    Separate,
}

impl FromStr for IndentScripts {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(IndentScripts::Normal),
            "keep" => Ok(IndentScripts::Keep),
            "separate" => Ok(IndentScripts::Separate),
            _ => Err(OptionsError::UnknownValue {
                option: "indent_scripts",
                value: s.to_string(),
            }),
        }
    }
}

/// Templating dialects the tokenizer recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateDialect {
    /// `{{ ... }}` interpolation and `{{# ... }}` block tags.
    Mustache,
    /// `@word(...) { ... }` block syntax.
    ControlFlow,
}

/// The full option surface. Field names double as the configuration-record
/// keys; every field is optional in a record and falls back to the default
/// shown in the table in SPEC_FULL.md.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub indent_size: usize,
    pub indent_char: char,
    pub indent_with_tabs: bool,
    /// Base indentation levels prepended to every output line.
    pub indent_level: usize,
    pub end_with_newline: bool,
    pub preserve_newlines: bool,
    pub max_preserve_newlines: u32,
    /// 0 disables line wrapping.
    pub wrap_line_length: usize,
    pub wrap_attributes: WrapAttributes,
    pub wrap_attributes_min_attrs: usize,
    /// `None` falls back to `indent_size`.
    pub wrap_attributes_indent_size: Option<usize>,
    pub indent_scripts: IndentScripts,
    pub indent_inner_html: bool,
    pub indent_head_inner_html: bool,
    pub indent_body_inner_html: bool,
    pub templating: HashSet<TemplateDialect>,
    /// Treat `{{#...}}` / `{{/...}}` as structural tags that indent their
    /// content. When off, mustache spans are carried inside text verbatim.
    pub indent_mustache: bool,
    pub inline: HashSet<String>,
    /// Hyphenated (custom element) names count as inline.
    pub inline_custom_elements: bool,
    pub void_elements: HashSet<String>,
    /// Elements reproduced fully verbatim, tags included.
    pub unformatted: HashSet<String>,
    /// Elements whose children are reproduced verbatim.
    pub content_unformatted: HashSet<String>,
    /// Tags preceded by an extra blank line. `/name` entries match end tags.
    pub extra_liners: HashSet<String>,
    /// Text spans between two occurrences of this delimiter are kept verbatim.
    pub unformatted_content_delimiter: String,
    /// Short-circuit: return the input unchanged.
    pub disabled: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            indent_size: 4,
            indent_char: ' ',
            indent_with_tabs: false,
            indent_level: 0,
            end_with_newline: false,
            preserve_newlines: true,
            max_preserve_newlines: 32786,
            wrap_line_length: 0,
            wrap_attributes: WrapAttributes::Auto,
            wrap_attributes_min_attrs: 2,
            wrap_attributes_indent_size: None,
            indent_scripts: IndentScripts::Normal,
            indent_inner_html: false,
            indent_head_inner_html: true,
            indent_body_inner_html: true,
            templating: [TemplateDialect::Mustache, TemplateDialect::ControlFlow]
                .into_iter()
                .collect(),
            indent_mustache: true,
            inline: defaults::owned(&defaults::INLINE_ELEMENTS),
            inline_custom_elements: true,
            void_elements: defaults::owned(&defaults::VOID_ELEMENTS),
            unformatted: HashSet::new(),
            content_unformatted: defaults::owned(&defaults::CONTENT_UNFORMATTED),
            extra_liners: defaults::owned(&defaults::EXTRA_LINERS),
            unformatted_content_delimiter: String::new(),
            disabled: false,
        }
    }
}

impl Options {
    /// Build an options record from a JSON value, falling back to defaults
    /// for missing keys. Unknown enum strings and malformed values are
    /// configuration errors.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, OptionsError> {
        let options: Options = serde_json::from_value(value)
            .map_err(|err| OptionsError::Malformed(err.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Reject non-positive sizes. Enum values are already checked during
    /// deserialization / `FromStr`; this covers records built in code.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.indent_size == 0 {
            return Err(OptionsError::NonPositive {
                option: "indent_size",
            });
        }
        if self.wrap_attributes_indent_size == Some(0) {
            return Err(OptionsError::NonPositive {
                option: "wrap_attributes_indent_size",
            });
        }
        Ok(())
    }

    pub fn wrap_indent_size(&self) -> usize {
        self.wrap_attributes_indent_size.unwrap_or(self.indent_size)
    }

    pub fn dialect_enabled(&self, dialect: TemplateDialect) -> bool {
        self.templating.contains(&dialect)
    }
}
