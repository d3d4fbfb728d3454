use pulldown_cmark::{html, Options, Parser};

/// Renders a Markdown note to the HTML stored as post content.
pub fn markdown_to_html(source: &str) -> String {
    if source.trim().is_empty() {
        return String::new();
    }

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(source, options);
    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_basic_markdown() {
        let out = markdown_to_html("# Title\n\nSome *text* and ~~gone~~.");
        assert!(out.contains("<h1>Title</h1>"));
        assert!(out.contains("<em>text</em>"));
        assert!(out.contains("<del>gone</del>"));
    }

    #[test]
    fn empty_input_renders_empty() {
        assert_eq!(markdown_to_html(""), "");
        assert_eq!(markdown_to_html("  \n\n"), "");
    }

    #[test]
    fn renders_tables() {
        let out = markdown_to_html("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(out.contains("<table>"));
    }
}
