//! L3: recursive vault walk. Emits raw `Note`s and aggregates folder-level
//! defaults from `.pluie` sidecar files, in a single filesystem walk.

use crate::frontmatter;
use crate::models::{Diagnostic, FolderDefaults, Note};
use crate::slug;
use crate::value::Value;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

pub struct ExploreResult {
    pub notes: Vec<Note>,
    pub folder_defaults: FolderDefaults,
    pub diagnostics: Vec<Diagnostic>,
}

fn is_skipped(entry: &DirEntry, root: &Path) -> bool {
    if entry.path() == root {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name == "node_modules" || name == ".git" || (name.starts_with('.') && entry.path() != root)
}

/// Walk `vault_root` depth-first, skipping hidden directories (except the
/// root itself), `node_modules`, and `.git`. Reads every `.pluie` sidecar
/// and every `.md` file encountered; unreadable or unparseable files are
/// recorded as diagnostics rather than aborting the load. `public_by_default`
/// is the final fallback in the publish-resolution priority (frontmatter
/// `publish` > folder `.pluie` default > this config default) for notes
/// with no frontmatter flag and no folder default either.
pub fn explore(vault_root: &Path, public_by_default: bool) -> ExploreResult {
    let mut diagnostics = Vec::new();
    let mut pluie_files: Vec<(String, String)> = Vec::new();
    let mut md_files: Vec<(String, String)> = Vec::new();

    let walker = WalkDir::new(vault_root).into_iter().filter_entry(|e| {
        !e.file_type().is_dir() || !is_skipped(e, vault_root)
    });

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                diagnostics.push(Diagnostic::warn("Io", format!("walk error: {err}")));
                continue;
            }
        };
        if entry.file_type().is_dir() {
            continue;
        }
        if is_skipped(&entry, vault_root) {
            continue;
        }
        let path = entry.path();
        let rel = match path.strip_prefix(vault_root) {
            Ok(r) => r.to_string_lossy().replace('\\', "/"),
            Err(_) => continue,
        };

        match path.extension().and_then(|e| e.to_str()) {
            Some("pluie") => match std::fs::read_to_string(path) {
                Ok(contents) => {
                    let folder = rel.rsplit_once('/').map(|(f, _)| f).unwrap_or("").to_string();
                    pluie_files.push((folder, contents));
                }
                Err(err) => diagnostics.push(
                    Diagnostic::warn("Io", format!("failed to read sidecar: {err}")).with_path(rel),
                ),
            },
            Some("md") => match std::fs::read_to_string(path) {
                Ok(contents) => md_files.push((rel, contents)),
                Err(err) => diagnostics
                    .push(Diagnostic::warn("Io", format!("failed to read file: {err}")).with_path(rel)),
            },
            _ => {}
        }
    }

    let mut folder_defaults = FolderDefaults::default();
    for (folder, contents) in pluie_files {
        match frontmatter::split_frontmatter(&contents) {
            Ok((metadata, _)) => {
                folder_defaults
                    .by_folder
                    .entry(folder)
                    .or_default()
                    .extend(metadata);
            }
            Err(err) => {
                diagnostics.push(Diagnostic::warn(
                    "ParseFailure",
                    format!("malformed .pluie frontmatter: {err}"),
                ));
            }
        }
    }

    let mut notes = Vec::with_capacity(md_files.len());
    for (rel_path, raw) in md_files {
        match build_note(&rel_path, &raw, &folder_defaults, public_by_default) {
            Ok(note) => notes.push(note),
            Err(msg) => diagnostics
                .push(Diagnostic::warn("ParseFailure", msg).with_path(rel_path)),
        }
    }

    ExploreResult {
        notes,
        folder_defaults,
        diagnostics,
    }
}

fn build_note(
    rel_path: &str,
    raw: &str,
    folder_defaults: &FolderDefaults,
    public_by_default: bool,
) -> Result<Note, String> {
    let (metadata, body) =
        frontmatter::split_frontmatter(raw).map_err(|e| format!("frontmatter: {e}"))?;
    let (content, h1_title) = frontmatter::strip_comments_and_extract_title(&body);

    let title = h1_title
        .or_else(|| {
            metadata
                .get("title")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| filename_without_ext(rel_path));

    let slug = slug::path_slug(rel_path);
    if slug.is_empty() {
        return Err("derived slug is empty".to_string());
    }

    let is_public = metadata
        .get("publish")
        .and_then(Value::as_bool)
        .or_else(|| {
            let folder = rel_path.rsplit_once('/').map(|(f, _)| f).unwrap_or("");
            folder_defaults.publish_for(folder)
        })
        .unwrap_or(public_by_default);

    Ok(Note {
        title,
        slug,
        path: rel_path.to_string(),
        content,
        metadata,
        is_public,
        referenced_by: Vec::new(),
    })
}

fn filename_without_ext(rel_path: &str) -> String {
    let name = rel_path.rsplit('/').next().unwrap_or(rel_path);
    name.strip_suffix(".md").unwrap_or(name).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_vault(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (path, contents) in files {
            let full = dir.path().join(path);
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(full, contents).unwrap();
        }
        dir
    }

    #[test]
    fn skips_hidden_git_and_node_modules() {
        let dir = write_vault(&[
            (".hidden/a.md", "hidden"),
            ("node_modules/b.md", "nm"),
            (".git/c.md", "git"),
            ("visible.md", "---\npublish: true\n---\nhi"),
        ]);
        let result = explore(dir.path(), false);
        assert_eq!(result.notes.len(), 1);
        assert_eq!(result.notes[0].path, "visible.md");
    }

    #[test]
    fn private_by_default_without_frontmatter() {
        let dir = write_vault(&[("note.md", "just text, no frontmatter")]);
        let result = explore(dir.path(), false);
        assert_eq!(result.notes.len(), 1);
        assert!(!result.notes[0].is_public);
    }

    #[test]
    fn public_by_default_config_applies_without_frontmatter_or_folder_default() {
        let dir = write_vault(&[("note.md", "just text, no frontmatter")]);
        let result = explore(dir.path(), true);
        assert_eq!(result.notes.len(), 1);
        assert!(result.notes[0].is_public);
    }

    #[test]
    fn frontmatter_publish_false_overrides_public_by_default_config() {
        let dir = write_vault(&[("note.md", "---\npublish: false\n---\nbody")]);
        let result = explore(dir.path(), true);
        assert!(!result.notes[0].is_public);
    }

    #[test]
    fn folder_defaults_make_note_public() {
        let dir = write_vault(&[
            ("folder/.pluie", "---\npublish: true\n---"),
            ("folder/a.md", "no frontmatter here"),
        ]);
        let result = explore(dir.path(), false);
        let note = result.notes.iter().find(|n| n.path == "folder/a.md").unwrap();
        assert!(note.is_public);
    }

    #[test]
    fn h1_title_wins_over_frontmatter_title() {
        let dir = write_vault(&[(
            "a.md",
            "---\ntitle: From Frontmatter\npublish: true\n---\n# Real Title\n\nbody",
        )]);
        let result = explore(dir.path(), false);
        assert_eq!(result.notes[0].title, "Real Title");
    }

    #[test]
    fn filename_title_when_nothing_else() {
        let dir = write_vault(&[("My Note.md", "no headings, no frontmatter")]);
        let result = explore(dir.path(), false);
        assert_eq!(result.notes[0].title, "My Note");
    }
}
