//! HTML5 optional-end-tag elision: a start tag implicitly closes still-open
//! siblings or ancestors, bounded by the structural element that contains
//! them. The formatter infers the close (restoring indentation) but never
//! writes a closing tag the source did not have.

#[cfg(test)]
mod optional_end_tags_tests {
    use markup_beautifier::{beautify, Options};

    fn fmt(source: &str) -> String {
        beautify(source, &Options::default()).unwrap()
    }

    mod lists {
        use super::*;

        #[test]
        fn should_close_li_before_a_sibling_li() {
            assert_eq!(
                fmt("<ul><li>a<li>b</ul>"),
                "<ul>\n    <li>a\n    <li>b\n</ul>"
            );
        }

        #[test]
        fn should_not_reach_li_past_the_enclosing_list() {
            // the inner ol bounds the search: the second li closes nothing
            // outside it, so the nested list stays nested
            assert_eq!(
                fmt("<ul><li>a<ol><li>x</ol></ul>"),
                "<ul>\n    <li>a\n        <ol>\n            <li>x\n        </ol>\n</ul>"
            );
        }

        #[test]
        fn should_close_dt_and_dd_siblings() {
            assert_eq!(
                fmt("<dl><dt>t<dd>d</dl>"),
                "<dl>\n    <dt>t\n    <dd>d\n</dl>"
            );
        }
    }

    mod paragraphs {
        use super::*;

        #[test]
        fn should_close_p_before_a_block_element() {
            assert_eq!(
                fmt("<div><p>a<div>b</div></div>"),
                "<div>\n    <p>a\n    <div>b</div>\n</div>"
            );
        }

        #[test]
        fn should_keep_p_open_inside_excluded_wrappers() {
            // ins is one of the wrappers that keep an open <p> alive
            assert_eq!(
                fmt("<ins><p>a<div>b</div></p></ins>"),
                "<ins>\n    <p>a\n        <div>b</div>\n    </p>\n</ins>"
            );
        }
    }

    mod ruby {
        use super::*;

        #[test]
        fn should_close_rt_before_a_sibling_rt() {
            assert_eq!(
                fmt("<ruby>base<rt>kan<rt>ji</ruby>"),
                "<ruby>base\n    <rt>kan\n    <rt>ji\n</ruby>"
            );
        }
    }

    mod select {
        use super::*;

        #[test]
        fn should_close_option_before_a_sibling_option() {
            assert_eq!(
                fmt("<select><option>a<option>b</select>"),
                "<select>\n    <option>a\n    <option>b\n</select>"
            );
        }

        #[test]
        fn should_close_an_open_optgroup_before_the_next_one() {
            assert_eq!(
                fmt("<select><optgroup label=\"a\"><option>1<optgroup label=\"b\"><option>2</select>"),
                "<select>\n    <optgroup label=\"a\">\n        <option>1\n    <optgroup label=\"b\">\n        <option>2\n</select>"
            );
        }
    }

    mod tables {
        use super::*;

        #[test]
        fn should_close_caption_when_a_section_starts() {
            assert_eq!(
                fmt("<table><caption>c<thead><tr><td>x</table>"),
                "<table>\n    <caption>c\n    <thead>\n        <tr>\n            <td>x\n</table>"
            );
        }

        #[test]
        fn should_close_tr_before_a_sibling_tr() {
            assert_eq!(
                fmt("<table><tr><td>a<td>b<tr><td>c</table>"),
                "<table>\n    <tr>\n        <td>a\n        <td>b\n    <tr>\n        <td>c\n</table>"
            );
        }

        #[test]
        fn should_close_td_and_th_cells() {
            assert_eq!(
                fmt("<table><tr><th>h<td>d</table>"),
                "<table>\n    <tr>\n        <th>h\n        <td>d\n</table>"
            );
        }
    }

    mod head_and_body {
        use super::*;

        #[test]
        fn should_close_head_when_body_starts() {
            assert_eq!(
                fmt("<head><title>t</title><body><p>x"),
                "<head>\n    <title>t</title>\n\n<body>\n    <p>x"
            );
        }
    }
}
