//! Ties the content pipeline together: Explorer -> resolver -> tree/tag
//! build -> `Snapshot`. Shared by the CLI's one-shot load and the
//! watcher's debounced reload.

use crate::explorer;
use crate::index;
use crate::linkresolve;
use crate::models::Diagnostic;
use crate::notes_service::Snapshot;
use indexmap::IndexMap;
use std::path::Path;

/// Run a full load over `vault_root` and produce a ready-to-publish
/// snapshot. Slug collisions are detected here: the later note (in
/// explorer-emitted order) is skipped and logged (`I3`). `public_by_default`
/// is `Config::public_by_default`: the last-resort fallback in the
/// publish-resolution priority, behind frontmatter `publish` and the
/// folder's `.pluie` default.
pub fn load_vault(vault_root: &Path, public_by_default: bool) -> Snapshot {
    let explorer::ExploreResult {
        notes,
        diagnostics: mut diagnostics,
        ..
    } = explorer::explore(vault_root, public_by_default);

    let (resolved_notes, resolve_diagnostics) = linkresolve::resolve_all(notes);
    diagnostics.extend(resolve_diagnostics);

    let mut notes_by_slug: IndexMap<String, crate::models::Note> = IndexMap::new();
    let mut deduped_notes = Vec::with_capacity(resolved_notes.len());
    for note in resolved_notes {
        if !note.is_public {
            continue;
        }
        if notes_by_slug.contains_key(&note.slug) {
            diagnostics.push(
                Diagnostic::warn("ConflictingSlug", format!("duplicate slug: {}", note.slug))
                    .with_path(note.path.clone())
                    .with_slug(note.slug.clone()),
            );
            tracing::warn!(slug = %note.slug, path = %note.path, "duplicate slug, skipping note");
            continue;
        }
        notes_by_slug.insert(note.slug.clone(), note.clone());
        deduped_notes.push(note);
    }

    let tree = index::build_tree(&deduped_notes);
    let tag_index = index::build_tag_index(&deduped_notes);

    Snapshot {
        notes_by_slug,
        tree,
        tag_index,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn end_to_end_wikilink_and_backreference() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("A.md"), "---\npublish: true\n---\nSee [[B]].").unwrap();
        fs::write(dir.path().join("B.md"), "---\npublish: true\n---\nHi.").unwrap();

        let snapshot = load_vault(dir.path(), false);
        assert!(snapshot.notes_by_slug.contains_key("a"));
        assert!(snapshot.notes_by_slug.contains_key("b"));
        assert_eq!(snapshot.notes_by_slug["a"].content, "See [B](/b).");
        assert_eq!(snapshot.notes_by_slug["b"].referenced_by.len(), 1);
    }

    #[test]
    fn private_note_excluded_from_every_index() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("note.md"), "no frontmatter").unwrap();

        let snapshot = load_vault(dir.path(), false);
        assert!(snapshot.notes_by_slug.is_empty());
        assert!(snapshot.tree.children.is_empty());
        assert!(snapshot.tag_index.is_empty());
    }

    #[test]
    fn public_by_default_config_publishes_note_with_no_publish_flag() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("note.md"), "no frontmatter at all").unwrap();

        let snapshot = load_vault(dir.path(), true);
        assert!(snapshot.notes_by_slug.contains_key("note"));
    }

    #[test]
    fn duplicate_slugs_keep_the_first_and_log() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Note.md"), "---\npublish: true\n---\nFirst").unwrap();
        fs::write(dir.path().join("note.md"), "---\npublish: true\n---\nSecond").unwrap();

        let snapshot = load_vault(dir.path(), false);
        assert_eq!(snapshot.notes_by_slug.len(), 1);
        assert!(snapshot
            .diagnostics
            .iter()
            .any(|d| d.code == "ConflictingSlug"));
    }
}
