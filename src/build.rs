//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: optionally cleaning the output
//! directory, loading the templates ([`crate::template`]) and walking the
//! source tree ([`crate::walker`]).

use crate::config::Config;
use crate::template::{Error as TemplateError, Templates};
use crate::url::PathMapper;
use crate::walker::{Error as WalkError, SiteWalker};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

/// Builds the site from a [`Config`] object. Generation expects a fresh
/// output directory; with [`Config::clean`] set, any existing output
/// directory is removed first.
pub fn build_site(config: &Config) -> Result<()> {
    // Templates are parsed before the output directory is touched.
    let templates = Templates::load(
        &config.default_template,
        &config.post_template,
        &config.index_template,
    )?;

    if is_within(&config.output_directory, &config.source_directory) {
        return Err(Error::OutputInsideSource {
            source: config.source_directory.clone(),
            output: config.output_directory.clone(),
        });
    }

    if config.clean {
        rmdir(&config.output_directory)?;
    }

    let mapper = PathMapper::new(&config.source_directory, &config.output_directory);
    SiteWalker {
        mapper: &mapper,
        templates: &templates,
    }
    .walk()?;

    info!(output = %config.output_directory.display(), "site generated");
    Ok(())
}

/// Returns true if `path` is `dir` or lies beneath it. Both are resolved
/// through their closest existing ancestor, so `./src/../src/dist` and a
/// not-yet-created output directory compare as expected.
fn is_within(path: &Path, dir: &Path) -> bool {
    resolve(path).starts_with(resolve(dir))
}

fn resolve(path: &Path) -> PathBuf {
    let mut missing = Vec::new();
    let mut existing = path;
    loop {
        if let Ok(resolved) = existing.canonicalize() {
            return missing.iter().rev().fold(resolved, |p, c| p.join(c));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name);
                existing = parent;
            }
            _ => return path.to_owned(),
        }
    }
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during template loading,
/// cleaning the output directory or walking the source tree.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors loading or parsing template files.
    Template(TemplateError),

    /// Returned for I/O problems while cleaning the output directory.
    Clean { path: PathBuf, err: std::io::Error },

    /// Returned when the output directory is inside the source directory,
    /// where the walk would find its own output.
    OutputInsideSource { source: PathBuf, output: PathBuf },

    /// Returned for errors generating the site.
    Walk(WalkError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => err.fmt(f),
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
            Error::OutputInsideSource { source, output } => write!(
                f,
                "Output directory '{}' is inside source directory '{}'",
                output.display(),
                source.display()
            ),
            Error::Walk(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(err) => Some(err),
            Error::Clean { path: _, err } => Some(err),
            Error::OutputInsideSource { .. } => None,
            Error::Walk(err) => Some(err),
        }
    }
}

impl From<TemplateError> for Error {
    /// Converts [`TemplateError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: TemplateError) -> Error {
        Error::Template(err)
    }
}

impl From<WalkError> for Error {
    /// Converts [`WalkError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WalkError) -> Error {
        Error::Walk(err)
    }
}
