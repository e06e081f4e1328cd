//! The library code for the `sitegen` static site generator. It mirrors a
//! source tree into an output tree: Markdown posts become HTML pages, every
//! other file is copied verbatim, and each directory gets an index page
//! listing what was emitted into it.
//!
//! The work happens in one depth-first walk ([`crate::walker`]). At each
//! directory the walker:
//!
//! 1. Loads the Markdown files as posts ([`crate::post`]). Each post's front
//!    matter is split off ([`crate::frontmatter`]), its body is evaluated once
//!    with the authoring API bound ([`crate::authoring`]) and then rendered to
//!    HTML ([`crate::markdown`]). Dated posts are linked chronologically.
//! 2. Renders the posts, copies the assets and recurses into subdirectories,
//!    collecting a [`crate::nav::Link`] for each, in that order.
//! 3. Writes an index page from the collected links unless the directory
//!    already has an `index.html`.
//!
//! Output locations and URLs all come from [`crate::url::PathMapper`].

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod authoring;
pub mod build;
pub mod config;
pub mod frontmatter;
pub mod markdown;
pub mod nav;
pub mod post;
pub mod template;
pub mod url;
pub mod walker;
