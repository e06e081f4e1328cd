use crate::url::map_extension;
use pulldown_cmark::{html, CowStr, Event, LinkType, Options, Parser, Tag};
use std::path::Path;
use url::{ParseError, Url};

/// Converts markdown to HTML, appending the result to `out`. Relative links
/// to other Markdown files are rewritten to point at their rendered `.html`
/// pages.
pub fn to_html(out: &mut String, markdown: &str) {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    html::push_html(out, Parser::new_ext(markdown, options).map(convert));
}

fn convert(ev: Event) -> Event {
    match ev {
        Event::Start(Tag::Link(
            link
            @
            (LinkType::Inline
            | LinkType::Reference
            | LinkType::ReferenceUnknown
            | LinkType::Shortcut
            | LinkType::Collapsed
            | LinkType::CollapsedUnknown),
            dest,
            title,
        )) => Event::Start(Tag::Link(link, convert_link(dest), title)),
        _ => ev,
    }
}

/// Rewrites `foo/bar.md#section` to `foo/bar.html#section`. Absolute URLs
/// (anything with a scheme) and in-page anchors are left alone.
fn convert_link(dest: CowStr) -> CowStr {
    match Url::parse(&dest) {
        Err(ParseError::RelativeUrlWithoutBase) => {}
        _ => return dest,
    }

    let converted = {
        let split = dest
            .find(|c: char| c == '#' || c == '?')
            .unwrap_or_else(|| dest.len());
        let (path, suffix) = dest.split_at(split);
        let mapped = map_extension(Path::new(path));
        match !path.is_empty() && mapped != Path::new(path) {
            true => Some(format!("{}{}", mapped.to_string_lossy(), suffix)),
            false => None,
        }
    };
    match converted {
        Some(converted) => CowStr::Boxed(converted.into_boxed_str()),
        None => dest,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn render(markdown: &str) -> String {
        let mut out = String::new();
        to_html(&mut out, markdown);
        out
    }

    #[test]
    fn test_to_html() {
        assert_eq!(
            "<h1>Hello</h1>\n<p>World</p>\n",
            render("# Hello\n\nWorld\n")
        );
    }

    #[test]
    fn test_relative_markdown_link() {
        assert_eq!(
            "<p><a href=\"../2020/post.html#intro\">post</a></p>\n",
            render("[post](../2020/post.md#intro)\n")
        );
    }

    #[test]
    fn test_untouched_links() {
        assert_eq!(
            concat!(
                "<p><a href=\"https://example.org/post.md\">remote</a> ",
                "<a href=\"#top\">top</a> ",
                "<a href=\"image.png\">image</a></p>\n",
            ),
            render(
                "[remote](https://example.org/post.md) [top](#top) \
                 [image](image.png)\n"
            )
        );
    }
}
