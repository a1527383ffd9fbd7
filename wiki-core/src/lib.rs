//! # wiki-core
//!
//! Core library for the wiki-vault server: vault discovery, frontmatter
//! and markdown parsing, wikilink/hashtag resolution, folder/tag
//! indexing, and the `NotesService` concurrency boundary.

pub mod config;
pub mod explorer;
pub mod frontmatter;
pub mod index;
pub mod linkresolve;
pub mod models;
pub mod notes_service;
pub mod pipeline;
pub mod search;
pub mod slug;
pub mod value;

pub use config::Config;
pub use models::{
    BackReference, Diagnostic, DiagnosticSeverity, EmbeddedFile, FolderDefaults, HeadingMatch,
    Note, TagIndex, TreeNode,
};
pub use notes_service::{NotesService, Snapshot};
pub use pipeline::load_vault;
pub use value::{Scalar, Value};
