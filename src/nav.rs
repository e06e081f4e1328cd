//! The navigation types handed to templates: [`Link`]s collected while a
//! directory is processed, the [`Index`] built from them, the breadcrumb
//! [`Crumb`]s for a location and the [`Page`] wrapped by the outer template.

use crate::post::format_date;
use chrono::NaiveDateTime;
use gtmpl::Value;
use gtmpl_derive::Gtmpl;
use std::collections::HashMap;

/// A reference to one emitted artifact: a rendered post, a copied asset or a
/// processed subdirectory.
#[derive(Clone, Debug, PartialEq)]
pub struct Link {
    pub url: String,
    pub title: Option<String>,
    pub date: Option<NaiveDateTime>,
}

impl Link {
    /// A link with only a URL, as used for assets and subdirectories.
    pub fn to(url: String) -> Link {
        Link {
            url,
            title: None,
            date: None,
        }
    }

    /// The link's title, falling back to its URL.
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.url)
    }
}

impl From<&Link> for Value {
    /// Converts a [`Link`] into an object with the fields `url`, `title` and
    /// `date` (nil when absent).
    fn from(link: &Link) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("url".to_owned(), Value::String(link.url.clone()));
        m.insert("title".to_owned(), Value::String(link.title().to_owned()));
        m.insert(
            "date".to_owned(),
            match &link.date {
                Some(date) => Value::String(format_date(date)),
                None => Value::Nil,
            },
        );
        Value::Object(m)
    }
}

/// One step of a breadcrumb trail. `url` is relative to the current
/// location (`.`, `..`, `../..`, ...).
#[derive(Clone, Debug, PartialEq, Gtmpl)]
pub struct Crumb {
    pub url: String,
    pub name: String,
}

/// Builds the breadcrumb trail for a root-relative directory URL, ordered
/// from the outermost directory down to `url` itself. The leaf crumb links
/// to `.`, its parent to `..` and so on. The site root only gets a crumb of
/// its own (named `/`) when `url` is the root.
pub fn path_crumbs(url: &str) -> Vec<Crumb> {
    let segments: Vec<&str> = url.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return vec![Crumb {
            url: ".".to_owned(),
            name: "/".to_owned(),
        }];
    }

    let depth = segments.len();
    segments
        .iter()
        .enumerate()
        .map(|(i, segment)| {
            let up = depth - 1 - i;
            Crumb {
                url: match up {
                    0 => ".".to_owned(),
                    _ => vec![".."; up].join("/"),
                },
                name: (*segment).to_owned(),
            }
        })
        .collect()
}

/// The auto-generated listing for one directory.
#[derive(Clone, Debug)]
pub struct Index {
    /// The links in the order their artifacts were emitted.
    pub links: Vec<Link>,

    /// The root-relative URL of the directory, with a trailing slash.
    pub dirname: String,
}

impl Index {
    pub fn crumbs(&self) -> Vec<Crumb> {
        path_crumbs(&self.dirname)
    }
}

impl From<&Index> for Value {
    /// Converts an [`Index`] into an object with the fields `links`,
    /// `dirname` and `crumbs`.
    fn from(index: &Index) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert(
            "links".to_owned(),
            Value::Array(index.links.iter().map(Value::from).collect()),
        );
        m.insert("dirname".to_owned(), Value::String(index.dirname.clone()));
        m.insert(
            "crumbs".to_owned(),
            Value::Array(index.crumbs().into_iter().map(Value::from).collect()),
        );
        Value::Object(m)
    }
}

/// A complete web page: the rendered body of a post or index and its title.
#[derive(Clone, Debug, Gtmpl)]
pub struct Page {
    pub title: String,
    pub body: String,
}
