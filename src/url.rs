//! Defines [`PathMapper`], which translates source paths into their mirrored
//! output locations and output locations into root-relative URLs. Every other
//! module asks the mapper (or [`map_extension`]) rather than rewriting paths
//! itself, so `.md` → `.html` handling lives in exactly one place.

use std::fmt;
use std::path::{Component, Path, PathBuf};

pub const MARKDOWN_EXTENSION: &str = "md";
pub const HTML_EXTENSION: &str = "html";

/// Replaces a trailing `.md` extension with `.html`. Any other path is
/// returned unchanged, so applying this twice never yields a double
/// extension.
pub fn map_extension(path: &Path) -> PathBuf {
    if is_markdown(path) {
        path.with_extension(HTML_EXTENSION)
    } else {
        path.to_owned()
    }
}

/// Returns true if `path` names a Markdown source file.
pub fn is_markdown(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == MARKDOWN_EXTENSION)
}

/// Maps paths under a source root onto the matching paths under a
/// destination root.
#[derive(Clone, Debug)]
pub struct PathMapper {
    source_root: PathBuf,
    destination_root: PathBuf,
}

impl PathMapper {
    pub fn new<S: Into<PathBuf>, D: Into<PathBuf>>(
        source_root: S,
        destination_root: D,
    ) -> Self {
        PathMapper {
            source_root: source_root.into(),
            destination_root: destination_root.into(),
        }
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn destination_root(&self) -> &Path {
        &self.destination_root
    }

    /// Returns the output location for `source`: the source-root prefix is
    /// swapped for the destination root and a `.md` extension becomes
    /// `.html`.
    ///
    /// # Panics
    ///
    /// Panics if `source` is not under the source root. Every path handed to
    /// the mapper comes from walking the source root, so this is a bug rather
    /// than bad input.
    pub fn target_path(&self, source: &Path) -> PathBuf {
        let relative = source.strip_prefix(&self.source_root).unwrap_or_else(|_| {
            panic!(
                "`{}` is not under the source root `{}`",
                source.display(),
                self.source_root.display()
            )
        });
        if relative.as_os_str().is_empty() {
            return self.destination_root.clone();
        }
        map_extension(&self.destination_root.join(relative))
    }

    /// Returns the root-relative URL (e.g., `/blog/post.html`) for a path
    /// under the destination root. The destination root itself maps to `/`.
    pub fn target_url(&self, target: &Path) -> Result<String> {
        let relative = target
            .strip_prefix(&self.destination_root)
            .map_err(|_| Error::NotUnderRoot {
                path: target.to_owned(),
                root: self.destination_root.clone(),
            })?;

        let mut url = String::new();
        for component in relative.components() {
            match component {
                Component::Normal(segment) => {
                    url.push('/');
                    url.push_str(&segment.to_string_lossy());
                }
                Component::CurDir => {}
                _ => {
                    return Err(Error::NotUnderRoot {
                        path: target.to_owned(),
                        root: self.destination_root.clone(),
                    })
                }
            }
        }
        if url.is_empty() {
            url.push('/');
        }
        Ok(url)
    }

    /// Shorthand for `target_url(target_path(source))`.
    pub fn source_url(&self, source: &Path) -> Result<String> {
        self.target_url(&self.target_path(source))
    }
}

/// Appends a trailing slash to a directory URL unless it already has one.
pub fn directory_url(url: &str) -> String {
    if url.ends_with('/') {
        url.to_owned()
    } else {
        format!("{}/", url)
    }
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a failure to map a path to a URL.
#[derive(Debug)]
pub enum Error {
    /// Returned when a path isn't inside the destination root.
    NotUnderRoot { path: PathBuf, root: PathBuf },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotUnderRoot { path, root } => write!(
                f,
                "`{}` is not under the destination root `{}`",
                path.display(),
                root.display()
            ),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod test {
    use super::*;

    fn mapper() -> PathMapper {
        PathMapper::new("src", "dist")
    }

    #[test]
    fn test_target_path_markdown() {
        assert_eq!(
            PathBuf::from("dist/blog/post.html"),
            mapper().target_path(Path::new("src/blog/post.md"))
        );
    }

    #[test]
    fn test_target_path_asset() {
        assert_eq!(
            PathBuf::from("dist/blog/image.md.png"),
            mapper().target_path(Path::new("src/blog/image.md.png"))
        );
    }

    #[test]
    fn test_target_path_directory() {
        assert_eq!(PathBuf::from("dist"), mapper().target_path(Path::new("src")));
        assert_eq!(
            PathBuf::from("dist/blog/graphics"),
            mapper().target_path(Path::new("src/blog/graphics"))
        );
    }

    #[test]
    fn test_map_extension_is_idempotent() {
        let once = map_extension(Path::new("dist/post.md"));
        assert_eq!(PathBuf::from("dist/post.html"), once);
        assert_eq!(once, map_extension(&once));
    }

    #[test]
    #[should_panic(expected = "not under the source root")]
    fn test_target_path_outside_source_root() {
        mapper().target_path(Path::new("elsewhere/post.md"));
    }

    #[test]
    fn test_target_url() -> Result<()> {
        let mapper = mapper();
        assert_eq!("/", mapper.target_url(Path::new("dist"))?);
        assert_eq!("/blog", mapper.target_url(Path::new("dist/blog"))?);
        assert_eq!(
            "/blog/post.html",
            mapper.target_url(Path::new("dist/blog/post.html"))?
        );
        Ok(())
    }

    #[test]
    fn test_target_url_outside_destination_root() {
        assert!(matches!(
            mapper().target_url(Path::new("src/blog")),
            Err(Error::NotUnderRoot { .. })
        ));
    }

    #[test]
    fn test_source_url_agrees_with_target_path() -> Result<()> {
        let mapper = mapper();
        let source = Path::new("src/blog/2020/post.md");
        assert_eq!(
            mapper.target_url(&mapper.target_path(source))?,
            mapper.source_url(source)?
        );
        assert_eq!("/blog/2020/post.html", mapper.source_url(source)?);
        Ok(())
    }

    #[test]
    fn test_directory_url() {
        assert_eq!("/", directory_url("/"));
        assert_eq!("/blog/", directory_url("/blog"));
        assert_eq!("/blog/", directory_url("/blog/"));
    }
}
