//! Attribute wrapping policies.

#[cfg(test)]
mod attributes_tests {
    use markup_beautifier::{beautify, Options, WrapAttributes};

    fn fmt(source: &str, options: &Options) -> String {
        beautify(source, options).unwrap()
    }

    fn with_wrap(wrap: WrapAttributes) -> Options {
        Options {
            wrap_attributes: wrap,
            ..Options::default()
        }
    }

    mod auto {
        use super::*;

        #[test]
        fn should_keep_attributes_on_one_line_without_a_wrap_limit() {
            let options = Options::default();
            assert_eq!(
                fmt("<div class=\"a\" data-x=\"b\">", &options),
                "<div class=\"a\" data-x=\"b\">"
            );
        }

        #[test]
        fn should_wrap_at_the_line_limit() {
            let options = Options {
                wrap_line_length: 20,
                ..Options::default()
            };
            assert_eq!(
                fmt("<div class=\"a\" data-x=\"b\">", &options),
                "<div class=\"a\"\n    data-x=\"b\">"
            );
        }
    }

    mod force {
        use super::*;

        #[test]
        fn should_wrap_the_second_attribute_and_beyond() {
            let options = with_wrap(WrapAttributes::Force);
            assert_eq!(
                fmt("<a x=\"1\" y=\"2\">", &options),
                "<a x=\"1\"\n    y=\"2\">"
            );
        }

        #[test]
        fn should_not_wrap_below_the_attribute_minimum() {
            let options = with_wrap(WrapAttributes::Force);
            assert_eq!(fmt("<a x=\"1\">", &options), "<a x=\"1\">");
        }

        #[test]
        fn should_honor_a_raised_attribute_minimum() {
            let options = Options {
                wrap_attributes: WrapAttributes::Force,
                wrap_attributes_min_attrs: 3,
                ..Options::default()
            };
            assert_eq!(
                fmt("<a x=\"1\" y=\"2\">", &options),
                "<a x=\"1\" y=\"2\">"
            );
        }

        #[test]
        fn should_indent_wrapped_attributes_by_wrap_indent_size() {
            let options = Options {
                wrap_attributes: WrapAttributes::Force,
                wrap_attributes_indent_size: Some(8),
                ..Options::default()
            };
            assert_eq!(
                fmt("<a x=\"1\" y=\"2\">", &options),
                "<a x=\"1\"\n        y=\"2\">"
            );
        }
    }

    mod force_aligned {
        use super::*;

        #[test]
        fn should_align_wrapped_attributes_to_the_tag_column() {
            let options = with_wrap(WrapAttributes::ForceAligned);
            // "<div" is four characters, so attributes align at column five
            assert_eq!(
                fmt("<div very=\"1\" long=\"2\">", &options),
                "<div very=\"1\"\n     long=\"2\">"
            );
        }
    }

    mod force_expand_multiline {
        use super::*;

        #[test]
        fn should_wrap_every_attribute_and_expand_the_closer() {
            let options = with_wrap(WrapAttributes::ForceExpandMultiline);
            assert_eq!(
                fmt("<a x=\"1\" y=\"2\">", &options),
                "<a\n    x=\"1\"\n    y=\"2\"\n>"
            );
        }

        #[test]
        fn should_leave_single_attributes_alone() {
            let options = with_wrap(WrapAttributes::ForceExpandMultiline);
            assert_eq!(fmt("<a x=\"1\">", &options), "<a x=\"1\">");
        }
    }

    mod preserve {
        use super::*;

        #[test]
        fn should_reproduce_source_line_breaks() {
            let options = with_wrap(WrapAttributes::Preserve);
            assert_eq!(
                fmt("<input type=\"checkbox\"\n       checked>", &options),
                "<input type=\"checkbox\"\n    checked>"
            );
        }

        #[test]
        fn should_not_introduce_breaks_of_its_own() {
            let options = with_wrap(WrapAttributes::Preserve);
            assert_eq!(
                fmt("<a x=\"1\" y=\"2\" z=\"3\">", &options),
                "<a x=\"1\" y=\"2\" z=\"3\">"
            );
        }

        #[test]
        fn should_align_preserved_breaks_when_asked() {
            let options = with_wrap(WrapAttributes::PreserveAligned);
            assert_eq!(
                fmt("<input type=\"checkbox\"\n       checked>", &options),
                "<input type=\"checkbox\"\n       checked>"
            );
        }
    }

    mod aligned_multiple {
        use super::*;

        #[test]
        fn should_align_to_the_tag_column_at_the_wrap_limit() {
            let options = Options {
                wrap_attributes: WrapAttributes::AlignedMultiple,
                wrap_line_length: 20,
                ..Options::default()
            };
            assert_eq!(
                fmt("<div class=\"a\" data-x=\"b\">", &options),
                "<div class=\"a\"\n     data-x=\"b\">"
            );
        }
    }

    mod spacing {
        use super::*;

        #[test]
        fn should_not_space_around_equals() {
            let options = Options::default();
            assert_eq!(
                fmt("<a href = \"x\">", &options),
                "<a href=\"x\">"
            );
        }

        #[test]
        fn should_space_before_the_self_closing_slash() {
            let options = Options::default();
            assert_eq!(fmt("<br/>", &options), "<br />");
        }
    }
}
