//! Tokenizer integration tests: token sequences for each rule class.

#[cfg(test)]
mod tokenizer_tests {
    use markup_beautifier::options::{Options, TemplateDialect};
    use markup_beautifier::tokenizer::tokenize;
    use markup_beautifier::tokens::TokenKind;

    fn tokens(source: &str) -> Vec<(TokenKind, String)> {
        tokens_with(source, &Options::default())
    }

    fn tokens_with(source: &str, options: &Options) -> Vec<(TokenKind, String)> {
        let stream = tokenize(source, options);
        (0..stream.len())
            .map(|id| (stream[id].kind, stream[id].text.clone()))
            .collect()
    }

    mod elements {
        use super::*;

        #[test]
        fn should_tokenize_a_simple_element() {
            assert_eq!(
                tokens("<div>a</div>"),
                vec![
                    (TokenKind::TagOpen, "<div".to_string()),
                    (TokenKind::TagClose, ">".to_string()),
                    (TokenKind::Text, "a".to_string()),
                    (TokenKind::TagOpen, "</div".to_string()),
                    (TokenKind::TagClose, ">".to_string()),
                    (TokenKind::Eof, String::new()),
                ]
            );
        }

        #[test]
        fn should_tokenize_attributes_equals_and_values() {
            assert_eq!(
                tokens("<a href=\"x\" disabled>"),
                vec![
                    (TokenKind::TagOpen, "<a".to_string()),
                    (TokenKind::Attribute, "href".to_string()),
                    (TokenKind::Equals, "=".to_string()),
                    (TokenKind::Value, "\"x\"".to_string()),
                    (TokenKind::Attribute, "disabled".to_string()),
                    (TokenKind::TagClose, ">".to_string()),
                    (TokenKind::Eof, String::new()),
                ]
            );
        }

        #[test]
        fn should_tokenize_unquoted_values() {
            assert_eq!(
                tokens("<a href=b/c>"),
                vec![
                    (TokenKind::TagOpen, "<a".to_string()),
                    (TokenKind::Attribute, "href".to_string()),
                    (TokenKind::Equals, "=".to_string()),
                    (TokenKind::Value, "b/c".to_string()),
                    (TokenKind::TagClose, ">".to_string()),
                    (TokenKind::Eof, String::new()),
                ]
            );
        }

        #[test]
        fn should_tokenize_self_closing_tags() {
            let result = tokens("<br/>");
            assert_eq!(result[1], (TokenKind::TagClose, "/>".to_string()));
        }

        #[test]
        fn should_treat_doctype_as_a_tag() {
            let result = tokens("<!doctype html>");
            assert_eq!(result[0], (TokenKind::TagOpen, "<!doctype".to_string()));
            assert_eq!(result[1], (TokenKind::Attribute, "html".to_string()));
        }

        #[test]
        fn should_link_openers_and_closers() {
            let options = Options::default();
            let stream = tokenize("<div>", &options);
            assert_eq!(stream[0].closed, Some(1));
            assert_eq!(stream[1].opened, Some(0));
        }
    }

    mod raw_text {
        use super::*;

        #[test]
        fn should_read_script_bodies_whole() {
            let result = tokens("<script>var x = '<div>';</script>");
            assert_eq!(result[2], (TokenKind::Text, "var x = '<div>';".to_string()));
            assert_eq!(result[3].0, TokenKind::TagOpen);
        }

        #[test]
        fn should_match_end_tags_case_insensitively() {
            let result = tokens("<script>var x;</SCRIPT>");
            assert_eq!(result[2], (TokenKind::Text, "var x;".to_string()));
        }

        #[test]
        fn should_read_content_unformatted_bodies_whole() {
            let result = tokens("<textarea>a<b>c</textarea>");
            assert_eq!(result[2], (TokenKind::Text, "a<b>c".to_string()));
        }

        #[test]
        fn should_read_unterminated_raw_content_to_end_of_input() {
            let result = tokens("<pre>never closed");
            assert_eq!(result[2], (TokenKind::Text, "never closed".to_string()));
            assert_eq!(result[3].0, TokenKind::Eof);
        }

        #[test]
        fn should_keep_delimited_spans_verbatim() {
            let options = Options {
                unformatted_content_delimiter: "~~".to_string(),
                ..Options::default()
            };
            let result = tokens_with("<div>~~keep   this~~</div>", &options);
            assert_eq!(result[2], (TokenKind::Text, "~~keep   this~~".to_string()));
        }
    }

    mod comments {
        use super::*;

        #[test]
        fn should_read_comments_to_the_literal_terminator() {
            let result = tokens("<!-- a <div> b -->");
            assert_eq!(result[0], (TokenKind::Comment, "<!-- a <div> b -->".to_string()));
        }

        #[test]
        fn should_read_cdata_sections() {
            let result = tokens("<![CDATA[ x < y ]]>");
            assert_eq!(result[0], (TokenKind::Comment, "<![CDATA[ x < y ]]>".to_string()));
        }

        #[test]
        fn should_read_conditional_comments() {
            let result = tokens("<![if !IE]>");
            assert_eq!(result[0], (TokenKind::Comment, "<![if !IE]>".to_string()));
        }

        #[test]
        fn should_read_processing_instructions() {
            let result = tokens("<?xml version=\"1.0\"?>");
            assert_eq!(
                result[0],
                (TokenKind::Comment, "<?xml version=\"1.0\"?>".to_string())
            );
        }

        #[test]
        fn should_read_unterminated_comments_to_end_of_input() {
            let result = tokens("<!-- never closed");
            assert_eq!(result[0], (TokenKind::Comment, "<!-- never closed".to_string()));
        }

        #[test]
        fn should_extend_ignore_directive_comments_to_the_end_marker() {
            let source =
                "<!-- beautify ignore:start --><div>  x  </div><!-- beautify ignore:end --><p>";
            let result = tokens(source);
            assert_eq!(
                result[0].1,
                "<!-- beautify ignore:start --><div>  x  </div><!-- beautify ignore:end -->"
            );
            assert_eq!(result[1], (TokenKind::TagOpen, "<p".to_string()));
        }
    }

    mod templating {
        use super::*;

        #[test]
        fn should_tokenize_mustache_tags() {
            assert_eq!(
                tokens("{{#if x}}a{{/if}}"),
                vec![
                    (TokenKind::TagOpen, "{{#if".to_string()),
                    (TokenKind::Text, "x".to_string()),
                    (TokenKind::TagClose, "}}".to_string()),
                    (TokenKind::Text, "a".to_string()),
                    (TokenKind::TagOpen, "{{/if".to_string()),
                    (TokenKind::TagClose, "}}".to_string()),
                    (TokenKind::Eof, String::new()),
                ]
            );
        }

        #[test]
        fn should_tokenize_mustache_comments() {
            let result = tokens("{{!-- hi --}}");
            assert_eq!(result[0], (TokenKind::Comment, "{{!-- hi --}}".to_string()));
            let result = tokens("{{! hi }}");
            assert_eq!(result[0], (TokenKind::Comment, "{{! hi }}".to_string()));
        }

        #[test]
        fn should_consume_mustache_spans_atomically_inside_attribute_values() {
            let result = tokens("<a title=\"{{ a > 'b' }}\">");
            assert_eq!(result[3], (TokenKind::Value, "\"{{ a > 'b' }}\"".to_string()));
        }

        #[test]
        fn should_consume_mustache_spans_atomically_inside_words_when_not_structural() {
            let options = Options {
                templating: [TemplateDialect::Mustache].into_iter().collect(),
                indent_mustache: false,
                ..Options::default()
            };
            let result = tokens_with("a{{ x }}b more", &options);
            assert_eq!(result[0], (TokenKind::Text, "a{{ x }}b".to_string()));
            assert_eq!(result[1], (TokenKind::Text, "more".to_string()));
        }

        #[test]
        fn should_scan_control_flow_openers_with_balanced_parentheses() {
            assert_eq!(
                tokens("@if (foo(1,2)) {x}"),
                vec![
                    (TokenKind::ControlFlowOpen, "@if (foo(1,2)) {".to_string()),
                    (TokenKind::Text, "x".to_string()),
                    (TokenKind::ControlFlowClose, "}".to_string()),
                    (TokenKind::Eof, String::new()),
                ]
            );
        }

        #[test]
        fn should_tokenize_parameterless_control_flow_blocks() {
            let result = tokens("@else {x}");
            assert_eq!(result[0], (TokenKind::ControlFlowOpen, "@else {".to_string()));
        }

        #[test]
        fn should_not_scan_control_flow_when_dialect_is_disabled() {
            let options = Options {
                templating: [TemplateDialect::Mustache].into_iter().collect(),
                ..Options::default()
            };
            let result = tokens_with("@if (a) {x}", &options);
            assert!(result
                .iter()
                .all(|(kind, _)| *kind != TokenKind::ControlFlowOpen));
        }
    }

    mod progress {
        use super::*;

        #[test]
        fn should_fall_back_to_unknown_tokens_for_stray_characters() {
            let result = tokens("}");
            assert_eq!(result[0], (TokenKind::Unknown, "}".to_string()));
            assert_eq!(result[1].0, TokenKind::Eof);
        }

        #[test]
        fn should_always_terminate_on_pathological_input() {
            // nothing here matches any rule cleanly; must still reach EOF
            let result = tokens("}}}}@@@<<{{");
            assert_eq!(result.last().map(|(kind, _)| *kind), Some(TokenKind::Eof));
        }

        #[test]
        fn should_capture_leading_whitespace_on_the_following_token() {
            let options = Options::default();
            let stream = tokenize("<br>\n\n  <br>", &options);
            assert_eq!(stream[2].newlines, 2);
            assert_eq!(stream[2].whitespace_before, "  ");
        }
    }
}
