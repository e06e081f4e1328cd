//! Loads the [`Config`] for a site. A site directory may hold a
//! `sitegen.yaml` project file; every field is optional:
//!
//! ```yaml
//! source_directory: src
//! output_directory: dist
//! templates_directory: templates
//! templates:
//!   default: default.html
//!   post: post.html
//!   index: index.html
//! ```
//!
//! Relative paths are resolved against the directory holding the project
//! file. Without a project file the defaults above are resolved against the
//! directory the generator runs in.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};

pub const PROJECT_FILE_NAME: &str = "sitegen.yaml";

fn default_source_directory() -> PathBuf {
    PathBuf::from("src")
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("dist")
}

fn default_templates_directory() -> PathBuf {
    PathBuf::from("templates")
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Project {
    #[serde(default = "default_source_directory")]
    source_directory: PathBuf,

    #[serde(default = "default_output_directory")]
    output_directory: PathBuf,

    #[serde(default = "default_templates_directory")]
    templates_directory: PathBuf,

    #[serde(default)]
    templates: TemplateFiles,
}

impl Default for Project {
    fn default() -> Self {
        Project {
            source_directory: default_source_directory(),
            output_directory: default_output_directory(),
            templates_directory: default_templates_directory(),
            templates: TemplateFiles::default(),
        }
    }
}

#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TemplateFiles {
    default: PathBuf,
    post: PathBuf,
    index: PathBuf,
}

impl Default for TemplateFiles {
    fn default() -> Self {
        TemplateFiles {
            default: PathBuf::from("default.html"),
            post: PathBuf::from("post.html"),
            index: PathBuf::from("index.html"),
        }
    }
}

/// Everything [`crate::build::build_site`] needs to generate a site.
#[derive(Clone, Debug)]
pub struct Config {
    /// The root of the source tree.
    pub source_directory: PathBuf,

    /// The root of the generated site. Must not exist unless `clean` is set.
    pub output_directory: PathBuf,

    /// The template wrapping every page.
    pub default_template: PathBuf,

    /// The template rendering a post's body.
    pub post_template: PathBuf,

    /// The template rendering a directory index's body.
    pub index_template: PathBuf,

    /// Remove `output_directory` before generating.
    pub clean: bool,
}

impl Config {
    /// Finds `sitegen.yaml` in `dir` or the closest ancestor holding one and
    /// loads it. Falls back to the default layout rooted at `dir` when there
    /// is no project file.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        for ancestor in dir.ancestors() {
            let path = ancestor.join(PROJECT_FILE_NAME);
            if path.exists() {
                return Config::from_project_file(&path).map_err(|e| {
                    anyhow!("Loading configuration `{}`: {}", path.display(), e)
                });
            }
        }
        Ok(Config::with_defaults(dir))
    }

    /// Loads a project file. Paths are resolved relative to its directory.
    pub fn from_project_file(path: &Path) -> Result<Config> {
        let project_root = path.parent().ok_or_else(|| {
            anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )
        })?;
        let file = File::open(path)
            .map_err(|e| anyhow!("Opening project file `{}`: {}", path.display(), e))?;
        let project: Project = serde_yaml::from_reader(file)?;
        Ok(Config::from_project(project_root, project))
    }

    /// The default layout rooted at `dir`: `src/`, `dist/` and
    /// `templates/{default,post,index}.html`.
    pub fn with_defaults(dir: &Path) -> Config {
        Config::from_project(dir, Project::default())
    }

    fn from_project(root: &Path, project: Project) -> Config {
        let templates_directory = root.join(project.templates_directory);
        Config {
            source_directory: root.join(project.source_directory),
            output_directory: root.join(project.output_directory),
            default_template: templates_directory.join(project.templates.default),
            post_template: templates_directory.join(project.templates.post),
            index_template: templates_directory.join(project.templates.index),
            clean: false,
        }
    }
}
