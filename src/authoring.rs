//! Defines [`PostAuthoringContext`], the API available to post authors inside
//! their Markdown source. Before a post body is rendered to HTML it is
//! evaluated once as a template in which `urlFor` is the only function:
//!
//! ```md
//! ![triangle]({{ urlFor "triangle.png" }})
//! ```
//!
//! `gtmpl` functions are plain function pointers, so the context for the post
//! currently being evaluated is installed in a thread-local slot for the
//! duration of [`PostAuthoringContext::evaluate`].

use crate::url::map_extension;
use gtmpl::{Context, Template, Value};
use std::cell::RefCell;
use std::fmt;
use std::path::{Path, PathBuf};

const URL_FOR: &str = "urlFor";

thread_local! {
    static ACTIVE: RefCell<Option<Active>> = RefCell::new(None);
}

struct Active {
    context: PostAuthoringContext,
    failure: Option<Error>,
}

/// The capabilities exposed to the pre-render pass of one post.
#[derive(Clone, Debug)]
pub struct PostAuthoringContext {
    source: PathBuf,
}

impl PostAuthoringContext {
    /// Creates the context for the post whose source file is `source`.
    pub fn new<P: Into<PathBuf>>(source: P) -> Self {
        PostAuthoringContext {
            source: source.into(),
        }
    }

    fn source_directory(&self) -> &Path {
        self.source.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Checks that `relative` names an existing file next to (or below) the
    /// post and returns its output path as written by the author, e.g.
    /// `other.md` becomes `other.html` and `image.png` stays `image.png`.
    /// The result is relative to the post, which keeps it a valid link from
    /// the rendered page.
    pub fn url_for(&self, relative: &str) -> Result<PathBuf> {
        let referenced = self.source_directory().join(relative);
        if !referenced.exists() {
            return Err(Error::NotFound(referenced));
        }
        Ok(map_extension(Path::new(relative)))
    }

    /// Evaluates `raw` as a template with `urlFor` bound to this context and
    /// returns the result. Evaluation is a single pass: the output is not
    /// evaluated again.
    pub fn evaluate(&self, raw: &str) -> Result<String> {
        let mut template = Template::default();
        template.add_func(URL_FOR, url_for);
        template.parse(raw).map_err(Error::Template)?;
        let context = Context::from(Value::Nil).map_err(Error::Template)?;

        let mut output = Vec::new();
        let result = {
            let scope = Scope::enter(self.clone());
            let result = template.execute(&mut output, &context);
            (result, scope.take_failure())
        };
        match result {
            (Ok(()), _) => String::from_utf8(output)
                .map_err(|e| Error::Template(e.to_string())),
            (Err(_), Some(failure)) => Err(failure),
            (Err(message), None) => Err(Error::Template(message)),
        }
    }
}

/// Installs a context in the thread-local slot and restores the previous one
/// when dropped.
struct Scope {
    previous: Option<Active>,
}

impl Scope {
    fn enter(context: PostAuthoringContext) -> Self {
        let previous = ACTIVE.with(|active| {
            active.borrow_mut().replace(Active {
                context,
                failure: None,
            })
        });
        Scope { previous }
    }

    fn take_failure(&self) -> Option<Error> {
        ACTIVE.with(|active| {
            active
                .borrow_mut()
                .as_mut()
                .and_then(|active| active.failure.take())
        })
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        let previous = self.previous.take();
        ACTIVE.with(|active| *active.borrow_mut() = previous);
    }
}

/// The `urlFor` template function.
fn url_for(args: &[Value]) -> std::result::Result<Value, String> {
    let relative = match args {
        [Value::String(relative)] => relative,
        _ => return Err(format!("{} expects a single string argument", URL_FOR)),
    };

    ACTIVE.with(|active| {
        let mut active = active.borrow_mut();
        let active = active
            .as_mut()
            .ok_or_else(|| format!("{} called outside of a post", URL_FOR))?;
        match active.context.url_for(relative) {
            Ok(path) => Ok(Value::String(path.to_string_lossy().into_owned())),
            Err(err) => {
                let message = err.to_string();
                active.failure = Some(err);
                Err(message)
            }
        }
    })
}

/// Represents the result of an authoring operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failure while evaluating a post's authoring template.
#[derive(Debug)]
pub enum Error {
    /// Returned by `urlFor` when the referenced file doesn't exist.
    NotFound(PathBuf),

    /// Returned when the post body isn't a valid template or fails to
    /// execute.
    Template(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotFound(path) => {
                write!(f, "not found: no file at `{}`", path.display())
            }
            Error::Template(err) => write!(f, "template error: {}", err),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_url_for_existing_sibling() -> TestResult {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("sibling.png"), b"png")?;
        fs::write(dir.path().join("other.md"), "---\n---\n")?;
        let context = PostAuthoringContext::new(dir.path().join("post.md"));

        assert_eq!(PathBuf::from("sibling.png"), context.url_for("sibling.png")?);
        assert_eq!(PathBuf::from("other.html"), context.url_for("other.md")?);
        Ok(())
    }

    #[test]
    fn test_url_for_missing() -> TestResult {
        let dir = tempfile::tempdir()?;
        let context = PostAuthoringContext::new(dir.path().join("post.md"));
        match context.url_for("missing.png") {
            Err(Error::NotFound(path)) => {
                assert_eq!(dir.path().join("missing.png"), path)
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_evaluate() -> TestResult {
        let dir = tempfile::tempdir()?;
        fs::create_dir(dir.path().join("demo"))?;
        fs::write(dir.path().join("demo").join("main.js"), "")?;
        let context = PostAuthoringContext::new(dir.path().join("post.md"));

        assert_eq!(
            "<script src=\"demo/main.js\"></script>",
            context.evaluate(r#"<script src="{{ urlFor "demo/main.js" }}"></script>"#)?
        );
        Ok(())
    }

    #[test]
    fn test_evaluate_is_single_pass() -> TestResult {
        let dir = tempfile::tempdir()?;
        let context = PostAuthoringContext::new(dir.path().join("post.md"));
        let output = context.evaluate(r#"{{ `{{ urlFor "missing.png" }}` }}"#)?;
        assert_eq!(r#"{{ urlFor "missing.png" }}"#, output);
        Ok(())
    }

    #[test]
    fn test_evaluate_missing_reference() -> TestResult {
        let dir = tempfile::tempdir()?;
        let context = PostAuthoringContext::new(dir.path().join("post.md"));
        assert!(matches!(
            context.evaluate(r#"![x]({{ urlFor "missing.png" }})"#),
            Err(Error::NotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn test_url_for_outside_evaluation() {
        assert!(url_for(&[Value::String("x".to_owned())]).is_err());
    }
}
