//! Defines [`SiteWalker`], which walks the source tree depth-first and writes
//! the mirrored output tree. For each directory it:
//!
//! 1. Creates the mirrored output directory
//! 2. Loads every Markdown file as a [`Post`] and links the dated ones
//!    chronologically
//! 3. Renders each post through the post and default templates
//! 4. Copies every other file verbatim
//! 5. Recurses into each subdirectory
//! 6. Writes an `index.html` listing everything emitted in steps 3-5, unless
//!    the directory already has one (e.g., rendered from a source
//!    `index.md`)
//!
//! The first error aborts the walk; files already written are left in place.

use crate::nav::{Index, Link, Page};
use crate::post::{self, link_chronologically, Post};
use crate::template::{self, render, Templates};
use crate::url::{self as urls, directory_url, is_markdown, PathMapper};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

const INDEX_FILE_NAME: &str = "index.html";

/// The immediate entries of a source directory, each group in lexicographic
/// order by file name.
#[derive(Debug, Default, PartialEq)]
pub struct Entries {
    pub markdown: Vec<PathBuf>,
    pub assets: Vec<PathBuf>,
    pub directories: Vec<PathBuf>,
}

/// Lists the immediate entries of `dir`. Hidden entries (names starting with
/// `.`) are skipped; symlinks are followed.
pub fn entries(dir: &Path) -> Result<Entries> {
    let mut entries = Entries::default();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()));
    for result in walker {
        let entry = result.map_err(|err| Error::ReadDir {
            path: dir.to_owned(),
            err,
        })?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path().to_owned();
        if entry.file_type().is_dir() {
            entries.directories.push(path);
        } else if is_markdown(&path) {
            entries.markdown.push(path);
        } else {
            entries.assets.push(path);
        }
    }
    Ok(entries)
}

/// Walks a source tree and writes the generated site.
pub struct SiteWalker<'a> {
    /// Maps source paths to output paths and URLs.
    pub mapper: &'a PathMapper,

    /// The templates pages are rendered with.
    pub templates: &'a Templates,
}

impl SiteWalker<'_> {
    /// Generates the whole site, starting at the mapper's source root.
    pub fn walk(&self) -> Result<()> {
        self.visit(self.mapper.source_root())
    }

    /// Generates the output for `dir` and everything beneath it.
    pub fn visit(&self, dir: &Path) -> Result<()> {
        let target_dir = self.mapper.target_path(dir);
        info!(
            source = %dir.display(),
            target = %target_dir.display(),
            "visiting directory"
        );
        std::fs::create_dir(&target_dir).map_err(|err| Error::Filesystem {
            op: "creating directory",
            path: target_dir.clone(),
            err,
        })?;

        let entries = entries(dir)?;
        let mut links = Vec::new();

        let mut posts = entries
            .markdown
            .iter()
            .map(|source| Post::load_file(self.mapper, source))
            .collect::<post::Result<Vec<Post>>>()?;
        link_chronologically(&mut posts);

        for i in 0..posts.len() {
            let post = &posts[i];
            let body = render(&self.templates.post, Post::to_value(&posts, i))?;
            let target = self.mapper.target_path(&post.source);
            debug!(
                source = %post.source.display(),
                target = %target.display(),
                "rendering post"
            );
            self.write_page(&target, post.title.clone(), body)?;
            links.push(post.link());
        }

        for source in &entries.assets {
            let target = self.mapper.target_path(source);
            debug!(
                source = %source.display(),
                target = %target.display(),
                "copying file"
            );
            std::fs::copy(source, &target).map_err(|err| Error::Filesystem {
                op: "copying file",
                path: target.clone(),
                err,
            })?;
            links.push(Link::to(file_name(&target)));
        }

        for subdir in &entries.directories {
            self.visit(subdir)?;
            links.push(Link::to(file_name(&self.mapper.target_path(subdir))));
        }

        let index_path = target_dir.join(INDEX_FILE_NAME);
        if index_path.exists() {
            debug!(path = %index_path.display(), "index already exists; skipping");
            return Ok(());
        }
        let index = Index {
            links,
            dirname: directory_url(&self.mapper.target_url(&target_dir)?),
        };
        info!(path = %index_path.display(), links = index.links.len(), "writing index");
        let body = render(&self.templates.index, &index)?;
        self.write_page(&index_path, index.dirname.clone(), body)
    }

    /// Wraps `body` in the default template and writes it to `path`.
    fn write_page(&self, path: &Path, title: String, body: String) -> Result<()> {
        let html = render(&self.templates.default, Page { title, body })?;
        std::fs::write(path, html).map_err(|err| Error::Filesystem {
            op: "writing file",
            path: path.to_owned(),
            err,
        })
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// The result of a fallible walk operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error generating the site.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post fails to load.
    Post(post::Error),

    /// Returned when a page fails to render.
    Template(template::Error),

    /// Returned when an output path can't be mapped to a URL.
    Url(urls::Error),

    /// Returned when creating a directory, copying a file or writing a page
    /// fails.
    Filesystem {
        op: &'static str,
        path: PathBuf,
        err: std::io::Error,
    },

    /// Returned when a source directory can't be listed.
    ReadDir { path: PathBuf, err: walkdir::Error },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Post(err) => err.fmt(f),
            Error::Template(err) => err.fmt(f),
            Error::Url(err) => err.fmt(f),
            Error::Filesystem { op, path, err } => write!(
                f,
                "filesystem error: {} `{}`: {}",
                op,
                path.display(),
                err
            ),
            Error::ReadDir { path, err } => write!(
                f,
                "filesystem error: reading directory `{}`: {}",
                path.display(),
                err
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Post(err) => Some(err),
            Error::Template(err) => Some(err),
            Error::Url(err) => Some(err),
            Error::Filesystem { err, .. } => Some(err),
            Error::ReadDir { err, .. } => Some(err),
        }
    }
}

impl From<post::Error> for Error {
    fn from(err: post::Error) -> Error {
        Error::Post(err)
    }
}

impl From<template::Error> for Error {
    fn from(err: template::Error) -> Error {
        Error::Template(err)
    }
}

impl From<urls::Error> for Error {
    fn from(err: urls::Error) -> Error {
        Error::Url(err)
    }
}
