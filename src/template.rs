//! Defines [`Templates`], the three page templates injected into the
//! [`crate::walker::SiteWalker`]:
//!
//! * `default` wraps a [`crate::nav::Page`] (`title`, `body`) into a full
//!   HTML document
//! * `post` renders a post (see [`crate::post::Post::to_value`]) into a body
//!   fragment
//! * `index` renders an [`crate::nav::Index`] (`links`, `dirname`, `crumbs`)
//!   into a body fragment

use gtmpl::{Context, Template, Value};
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

pub struct Templates {
    pub default: Template,
    pub post: Template,
    pub index: Template,
}

impl Templates {
    /// Parses the three templates from source text.
    pub fn parse(default: &str, post: &str, index: &str) -> Result<Templates> {
        Ok(Templates {
            default: parse_template("default", default)?,
            post: parse_template("post", post)?,
            index: parse_template("index", index)?,
        })
    }

    /// Loads and parses the three templates from disk.
    pub fn load(default: &Path, post: &Path, index: &Path) -> Result<Templates> {
        Templates::parse(&read(default)?, &read(post)?, &read(index)?)
    }
}

fn read(path: &Path) -> Result<String> {
    use std::io::Read;
    let mut contents = String::new();
    File::open(path)
        .and_then(|mut file| file.read_to_string(&mut contents))
        .map_err(|err| Error::OpenTemplateFile {
            path: path.to_owned(),
            err,
        })?;
    Ok(contents)
}

fn parse_template(name: &'static str, contents: &str) -> Result<Template> {
    let mut template = Template::default();
    template
        .parse(contents)
        .map_err(|err| Error::ParseTemplate { name, err })?;
    Ok(template)
}

/// Executes `template` against `value` and returns the output.
pub fn render<V: Into<Value>>(template: &Template, value: V) -> Result<String> {
    let context = Context::from(value.into()).map_err(Error::Execute)?;
    let mut output = Vec::new();
    template
        .execute(&mut output, &context)
        .map_err(Error::Execute)?;
    String::from_utf8(output).map_err(|err| Error::Execute(err.to_string()))
}

/// The result of a fallible template operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading or executing a template.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O problems while opening template files.
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned for errors parsing template files.
    ParseTemplate { name: &'static str, err: String },

    /// Returned for errors during templating.
    Execute(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::ParseTemplate { name, err } => {
                write!(f, "template error: parsing `{}` template: {}", name, err)
            }
            Error::Execute(err) => write!(f, "template error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::OpenTemplateFile { path: _, err } => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::nav::Page;

    #[test]
    fn test_render_page() -> Result<()> {
        let templates = Templates::parse(
            "<title>{{ .title }}</title>{{ .body }}",
            "{{ .content }}",
            "{{ .dirname }}",
        )?;
        let page = Page {
            title: "Hello".to_owned(),
            body: "<p>World</p>".to_owned(),
        };
        assert_eq!(
            "<title>Hello</title><p>World</p>",
            render(&templates.default, page)?
        );
        Ok(())
    }

    #[test]
    fn test_parse_error_names_template() {
        match Templates::parse("{{ .title }}", "{{ if }}", "") {
            Err(Error::ParseTemplate { name, .. }) => assert_eq!("post", name),
            Err(err) => panic!("unexpected error: {}", err),
            Ok(_) => panic!("expected a parse error"),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let missing = Path::new("does/not/exist.html");
        assert!(matches!(
            Templates::load(missing, missing, missing),
            Err(Error::OpenTemplateFile { .. })
        ));
    }
}
