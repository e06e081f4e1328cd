//! Defines the [`Post`] type and the logic for loading posts from Markdown
//! source files and linking them chronologically. See [`Post::to_value`] for
//! how a post is exposed to the post template.

use crate::authoring::{self, PostAuthoringContext};
use crate::frontmatter;
use crate::markdown;
use crate::nav::{path_crumbs, Link};
use crate::url::{self as urls, PathMapper};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use gtmpl::Value;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// The typed view of a post's front matter. Unknown keys are ignored. Both
/// fields accept any YAML scalar; see [`scalar`].
#[derive(Deserialize, Default)]
struct Frontmatter {
    /// The title of the post. Defaults to the source file stem.
    #[serde(default)]
    title: Option<serde_yaml::Value>,

    /// The date of the post, if it should take part in chronological
    /// linking.
    #[serde(default)]
    date: Option<serde_yaml::Value>,
}

/// Reads a front matter scalar as text, so `title: 2021` is the title
/// `"2021"`. Null counts as absent; sequences and mappings are rejected.
fn scalar(
    field: &'static str,
    value: Option<serde_yaml::Value>,
) -> Result<Option<String>> {
    use serde_yaml::Value as Yaml;
    match value {
        None | Some(Yaml::Null) => Ok(None),
        Some(Yaml::String(s)) => Ok(Some(s)),
        Some(Yaml::Number(n)) => Ok(Some(n.to_string())),
        Some(Yaml::Bool(b)) => Ok(Some(b.to_string())),
        Some(_) => Err(Error::InvalidField(field)),
    }
}

/// Parses a front matter date. Accepts `2021-04-16`, `2021-04-16 10:30:00`
/// and RFC 3339 timestamps; the latter are normalized to UTC.
pub fn parse_date(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_hms(0, 0, 0));
    }
    if let Ok(date_time) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(date_time);
    }
    DateTime::parse_from_rfc3339(s)
        .map(|date_time| date_time.naive_utc())
        .map_err(|_| Error::InvalidDate(s.to_owned()))
}

/// Formats a date for templates, omitting the time of day when it's
/// midnight.
pub fn format_date(date: &NaiveDateTime) -> String {
    if date.time() == chrono::NaiveTime::from_hms(0, 0, 0) {
        date.format("%Y-%m-%d").to_string()
    } else {
        date.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Represents a blog post parsed from one Markdown source file.
#[derive(Clone, Debug)]
pub struct Post {
    /// The Markdown file the post was loaded from.
    pub source: PathBuf,

    /// The title of the post.
    pub title: String,

    /// The date of the post, if any. Undated posts never take part in
    /// chronological linking.
    pub date: Option<NaiveDateTime>,

    /// The rendered HTML body.
    pub content: String,

    /// Index (within the same directory batch) of the next post by date.
    pub next_post: Option<usize>,

    /// Index (within the same directory batch) of the previous post by date.
    pub prev_post: Option<usize>,

    url: String,
}

impl Post {
    /// Loads a post from `source`: splits off the front matter, evaluates the
    /// body once with the [`PostAuthoringContext`] bound, renders the result
    /// to HTML, and derives the URL from the source path.
    pub fn load_file(mapper: &PathMapper, source: &Path) -> Result<Post> {
        Post::_load_file(mapper, source)
            .map_err(|e| Error::Annotated(source.to_owned(), Box::new(e)))
    }

    fn _load_file(mapper: &PathMapper, source: &Path) -> Result<Post> {
        let input = std::fs::read_to_string(source)?;
        let (metadata, raw) = frontmatter::parse(&input)?;
        let frontmatter: Frontmatter =
            serde_yaml::from_value(serde_yaml::Value::Mapping(metadata))
                .map_err(frontmatter::Error::from)?;

        let templated = PostAuthoringContext::new(source).evaluate(raw)?;
        let mut content = String::new();
        markdown::to_html(&mut content, &templated);

        let title = match scalar("title", frontmatter.title)? {
            Some(title) => title,
            None => source
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        let date = scalar("date", frontmatter.date)?;

        Ok(Post {
            source: source.to_owned(),
            title,
            date: date.as_deref().map(parse_date).transpose()?,
            content,
            next_post: None,
            prev_post: None,
            url: mapper.source_url(source)?,
        })
    }

    /// The root-relative URL of the rendered post.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The URL of the directory holding the post.
    pub fn directory_url(&self) -> &str {
        match self.url.rfind('/') {
            Some(0) | None => "/",
            Some(i) => &self.url[..i],
        }
    }

    /// A [`Link`] pointing at this post.
    pub fn link(&self) -> Link {
        Link {
            url: self.url.clone(),
            title: Some(self.title.clone()),
            date: self.date,
        }
    }

    /// Converts the post at `posts[i]` into a [`Value`] for the post
    /// template. The result has the fields `title`, `date`, `content`, `url`,
    /// `crumbs`, `next_post` and `prev_post`; the latter two are link objects
    /// (`url`, `title`, `date`) or nil.
    pub fn to_value(posts: &[Post], i: usize) -> Value {
        let post = &posts[i];
        let neighbor = |index: Option<usize>| match index {
            Some(index) => Value::from(&posts[index].link()),
            None => Value::Nil,
        };

        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("title".to_owned(), Value::String(post.title.clone()));
        m.insert(
            "date".to_owned(),
            match &post.date {
                Some(date) => Value::String(format_date(date)),
                None => Value::Nil,
            },
        );
        m.insert("content".to_owned(), Value::String(post.content.clone()));
        m.insert("url".to_owned(), Value::String(post.url.clone()));
        m.insert(
            "crumbs".to_owned(),
            Value::Array(
                path_crumbs(post.directory_url())
                    .into_iter()
                    .map(Value::from)
                    .collect(),
            ),
        );
        m.insert("next_post".to_owned(), neighbor(post.next_post));
        m.insert("prev_post".to_owned(), neighbor(post.prev_post));
        Value::Object(m)
    }
}

/// Links the dated posts of one directory in ascending date order. Posts with
/// equal dates keep their relative order; undated posts are left unlinked.
pub fn link_chronologically(posts: &mut [Post]) {
    let mut dated: Vec<usize> = (0..posts.len())
        .filter(|&i| posts[i].date.is_some())
        .collect();
    dated.sort_by_key(|&i| posts[i].date);

    for pair in dated.windows(2) {
        let (earlier, later) = (pair[0], pair[1]);
        posts[earlier].next_post = Some(later);
        posts[later].prev_post = Some(earlier);
    }
}

/// Represents the result of a [`Post`]-load operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading a [`Post`].
#[derive(Debug)]
pub enum Error {
    /// Returned when the front matter is malformed.
    Format(frontmatter::Error),

    /// Returned when `urlFor` references a file that doesn't exist.
    NotFound(PathBuf),

    /// Returned when the post body fails to evaluate as a template.
    Template(String),

    /// Returned when the `date` field can't be parsed.
    InvalidDate(String),

    /// Returned when a front matter field holds a sequence or mapping where
    /// a scalar is expected.
    InvalidField(&'static str),

    /// Returned when the post's URL can't be derived.
    Url(urls::Error),

    /// Returned for I/O errors reading the source file.
    Io(std::io::Error),

    /// An error annotated with the source file it concerns.
    Annotated(PathBuf, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Format(err) => err.fmt(f),
            Error::NotFound(path) => {
                write!(f, "not found: no file at `{}`", path.display())
            }
            Error::Template(err) => write!(f, "template error: {}", err),
            Error::InvalidDate(date) => {
                write!(f, "format error: invalid date `{}`", date)
            }
            Error::InvalidField(field) => {
                write!(f, "format error: `{}` must be a scalar", field)
            }
            Error::Url(err) => err.fmt(f),
            Error::Io(err) => write!(f, "filesystem error: {}", err),
            Error::Annotated(path, err) => {
                write!(f, "loading post `{}`: {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Format(err) => Some(err),
            Error::Url(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
            _ => None,
        }
    }
}

impl From<frontmatter::Error> for Error {
    fn from(err: frontmatter::Error) -> Error {
        Error::Format(err)
    }
}

impl From<authoring::Error> for Error {
    fn from(err: authoring::Error) -> Error {
        match err {
            authoring::Error::NotFound(path) => Error::NotFound(path),
            authoring::Error::Template(err) => Error::Template(err),
        }
    }
}

impl From<urls::Error> for Error {
    fn from(err: urls::Error) -> Error {
        Error::Url(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    fn post(title: &str, date: Option<&str>) -> Post {
        Post {
            source: PathBuf::from(format!("src/{}.md", title)),
            title: title.to_owned(),
            date: date.map(|d| parse_date(d).unwrap()),
            content: String::new(),
            next_post: None,
            prev_post: None,
            url: format!("/{}.html", title),
        }
    }

    #[test]
    fn test_link_chronologically() {
        let mut posts = vec![
            post("third", Some("2020-03-01")),
            post("undated", None),
            post("first", Some("2020-01-01")),
            post("second", Some("2020-02-01")),
        ];
        link_chronologically(&mut posts);

        // first
        assert_eq!(None, posts[2].prev_post);
        assert_eq!(Some(3), posts[2].next_post);
        // second
        assert_eq!(Some(2), posts[3].prev_post);
        assert_eq!(Some(0), posts[3].next_post);
        // third
        assert_eq!(Some(3), posts[0].prev_post);
        assert_eq!(None, posts[0].next_post);
        // undated
        assert_eq!(None, posts[1].prev_post);
        assert_eq!(None, posts[1].next_post);
    }

    #[test]
    fn test_link_chronologically_equal_dates_keep_order() {
        let mut posts = vec![
            post("b", Some("2020-01-01")),
            post("a", Some("2020-01-01")),
            post("c", Some("2019-12-31")),
        ];
        link_chronologically(&mut posts);

        assert_eq!(Some(0), posts[2].next_post);
        assert_eq!(Some(1), posts[0].next_post);
        assert_eq!(None, posts[1].next_post);
        assert_eq!(Some(0), posts[1].prev_post);
    }

    #[test]
    fn test_link_chronologically_single_post() {
        let mut posts = vec![post("only", Some("2020-01-01"))];
        link_chronologically(&mut posts);
        assert_eq!((None, None), (posts[0].prev_post, posts[0].next_post));
    }

    #[test]
    fn test_parse_date() -> Result<()> {
        assert_eq!("2021-04-16", format_date(&parse_date("2021-04-16")?));
        assert_eq!(
            "2021-04-16 10:30:00",
            format_date(&parse_date("2021-04-16 10:30:00")?)
        );
        assert_eq!(
            "2021-04-16 08:30:00",
            format_date(&parse_date("2021-04-16T10:30:00+02:00")?)
        );
        assert!(matches!(parse_date("April 16"), Err(Error::InvalidDate(_))));
        Ok(())
    }

    #[test]
    fn test_directory_url() {
        let mut p = post("x", None);
        assert_eq!("/", p.directory_url());
        p.url = "/blog/2020/x.html".to_owned();
        assert_eq!("/blog/2020", p.directory_url());
    }

    #[test]
    fn test_load_file() -> TestResult {
        let root = tempfile::tempdir()?;
        let src = root.path().join("src");
        fs::create_dir_all(src.join("blog"))?;
        fs::write(src.join("blog").join("triangle.png"), b"png")?;
        let source = src.join("blog").join("hello.md");
        fs::write(
            &source,
            concat!(
                "---\ntitle: Hello\ndate: 2021-04-16\nextra: ignored\n---\n",
                "# Hi\n\n![t]({{ urlFor \"triangle.png\" }})\n",
            ),
        )?;

        let mapper = PathMapper::new(&src, root.path().join("dist"));
        let post = Post::load_file(&mapper, &source)?;
        assert_eq!("Hello", post.title);
        assert_eq!(Some(parse_date("2021-04-16")?), post.date);
        assert_eq!("/blog/hello.html", post.url());
        assert_eq!(
            "<h1>Hi</h1>\n<p><img src=\"triangle.png\" alt=\"t\" /></p>\n",
            post.content
        );
        Ok(())
    }

    #[test]
    fn test_load_file_defaults_title_to_stem() -> TestResult {
        let root = tempfile::tempdir()?;
        let source = root.path().join("untitled.md");
        fs::write(&source, "---\n---\nbody\n")?;

        let mapper = PathMapper::new(root.path(), "dist");
        let post = Post::load_file(&mapper, &source)?;
        assert_eq!("untitled", post.title);
        assert_eq!(None, post.date);
        Ok(())
    }

    #[test]
    fn test_load_file_scalar_title() -> TestResult {
        let root = tempfile::tempdir()?;
        let mapper = PathMapper::new(root.path(), "dist");
        for (front_matter, title) in &[
            ("title: 2021", "2021"),
            ("title: 1.5", "1.5"),
            ("title: true", "true"),
            ("title: ~", "scalar"),
        ] {
            let source = root.path().join("scalar.md");
            fs::write(&source, format!("---\n{}\n---\nbody\n", front_matter))?;
            assert_eq!(*title, Post::load_file(&mapper, &source)?.title);
        }
        Ok(())
    }

    #[test]
    fn test_load_file_rejects_non_scalar_fields() -> TestResult {
        let root = tempfile::tempdir()?;
        let mapper = PathMapper::new(root.path(), "dist");
        let source = root.path().join("list.md");

        fs::write(&source, "---\ntitle: [a, b]\n---\nbody\n")?;
        match Post::load_file(&mapper, &source) {
            Err(Error::Annotated(_, err)) => {
                assert!(matches!(*err, Error::InvalidField("title")))
            }
            other => panic!("expected an invalid field, got {:?}", other),
        }

        // A bare year is read as text and then fails as a date.
        fs::write(&source, "---\ndate: 2021\n---\nbody\n")?;
        match Post::load_file(&mapper, &source) {
            Err(Error::Annotated(_, err)) => {
                assert!(matches!(*err, Error::InvalidDate(ref d) if d == "2021"))
            }
            other => panic!("expected an invalid date, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_load_file_missing_end_fence() -> TestResult {
        let root = tempfile::tempdir()?;
        let source = root.path().join("broken.md");
        fs::write(&source, "---\ntitle: Broken\n")?;

        let mapper = PathMapper::new(root.path(), "dist");
        match Post::load_file(&mapper, &source) {
            Err(Error::Annotated(path, err)) => {
                assert_eq!(source, path);
                assert!(matches!(
                    *err,
                    Error::Format(frontmatter::Error::MissingEndFence)
                ));
            }
            other => panic!("expected a format error, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_load_file_missing_reference() -> TestResult {
        let root = tempfile::tempdir()?;
        let source = root.path().join("post.md");
        fs::write(
            &source,
            "---\ntitle: Post\n---\n{{ urlFor \"missing.png\" }}\n",
        )?;

        let mapper = PathMapper::new(root.path(), "dist");
        match Post::load_file(&mapper, &source) {
            Err(Error::Annotated(_, err)) => {
                assert!(matches!(*err, Error::NotFound(_)))
            }
            other => panic!("expected a not found error, got {:?}", other),
        }
        Ok(())
    }
}
