//! L5: folder tree and tag inverted index, built from the set of public
//! notes produced by the resolver.

use crate::models::{Note, TagIndex, TreeNode};
use crate::slug;
use indexmap::IndexMap;
use std::collections::HashSet;

/// Build the folder tree from public notes' vault-relative paths. Each
/// intermediate path segment becomes a folder node (created on first
/// use); the leaf becomes a note node. Children are sorted at every
/// level: folders first, then notes, case-insensitive ascending by name.
pub fn build_tree(notes: &[Note]) -> TreeNode {
    let mut root = TreeNode::root();

    for note in notes {
        if !note.is_public {
            continue;
        }
        let segments: Vec<&str> = note.path.split('/').collect();
        insert_note(&mut root, "", &segments, note);
    }

    sort_children_recursive(&mut root, 0);
    root
}

fn insert_note(parent: &mut TreeNode, parent_path: &str, segments: &[&str], note: &Note) {
    match segments {
        [leaf] => {
            let path = join_path(parent_path, leaf);
            parent.children.push(TreeNode {
                name: leaf.to_string(),
                path,
                is_folder: false,
                note: Some(note.clone()),
                children: Vec::new(),
                is_open: false,
            });
        }
        [head, tail @ ..] => {
            let folder_path = join_path(parent_path, head);
            let idx = parent
                .children
                .iter()
                .position(|c| c.is_folder && c.name == *head);
            let idx = match idx {
                Some(i) => i,
                None => {
                    parent.children.push(TreeNode {
                        name: head.to_string(),
                        path: folder_path.clone(),
                        is_folder: true,
                        note: None,
                        children: Vec::new(),
                        is_open: false,
                    });
                    parent.children.len() - 1
                }
            };
            insert_note(&mut parent.children[idx], &folder_path, tail, note);
        }
        [] => {}
    }
}

fn join_path(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{parent}/{child}")
    }
}

fn sort_children_recursive(node: &mut TreeNode, depth: usize) {
    node.children.sort_by(|a, b| {
        match (a.is_folder, b.is_folder) {
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            _ => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        }
    });
    for child in &mut node.children {
        if child.is_folder {
            child.is_open = depth == 0;
            sort_children_recursive(child, depth + 1);
        }
    }
}

/// Extract a note's hashtags matched by `#[A-Za-z/-]+` from its body. Used
/// alongside frontmatter `tags` to build the tag index.
pub fn extract_body_hashtags(content: &str) -> Vec<String> {
    let chars: Vec<char> = content.chars().collect();
    let len = chars.len();
    let mut tags = Vec::new();
    let mut i = 0;
    while i < len {
        if chars[i] == '#' {
            let preceding_ok = i == 0
                || !(chars[i - 1].is_alphanumeric() || chars[i - 1] == '_' || chars[i - 1] == '#');
            let mut j = i + 1;
            while j < len && (chars[j].is_ascii_alphabetic() || chars[j] == '/' || chars[j] == '-')
            {
                j += 1;
            }
            if preceding_ok && j > i + 1 {
                tags.push(chars[i + 1..j].iter().collect::<String>());
                i = j;
                continue;
            }
        }
        i += 1;
    }
    tags
}

/// Build the tag index: union of frontmatter `tags` and body hashtags,
/// normalized to lowercase-trimmed, mapped to an insertion-ordered
/// sequence of the notes that cite each tag.
pub fn build_tag_index(notes: &[Note]) -> TagIndex {
    let mut index: TagIndex = IndexMap::new();

    for note in notes {
        if !note.is_public {
            continue;
        }
        let mut seen_for_note = HashSet::new();
        let mut tags = note.tags();
        tags.extend(extract_body_hashtags(&note.content));

        for raw_tag in tags {
            let tag = slug::normalize_tag(&raw_tag);
            if tag.is_empty() || !seen_for_note.insert(tag.clone()) {
                continue;
            }
            index.entry(tag).or_default().push(note.clone());
        }
    }

    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap as Map;

    fn note(path: &str, is_public: bool) -> Note {
        Note {
            title: path.to_string(),
            slug: slug::path_slug(path),
            path: path.to_string(),
            content: String::new(),
            metadata: Map::new(),
            is_public,
            referenced_by: Vec::new(),
        }
    }

    #[test]
    fn tree_nests_folders_and_sorts() {
        let notes = vec![
            note("b.md", true),
            note("a.md", true),
            note("folder/c.md", true),
        ];
        let tree = build_tree(&notes);
        assert_eq!(tree.children.len(), 3);
        assert!(tree.children[0].is_folder);
        assert_eq!(tree.children[0].name, "folder");
        assert_eq!(tree.children[1].name, "a.md");
        assert_eq!(tree.children[2].name, "b.md");
    }

    #[test]
    fn private_notes_excluded_from_tree() {
        let notes = vec![note("secret.md", false)];
        let tree = build_tree(&notes);
        assert!(tree.children.is_empty());
    }

    #[test]
    fn extract_hashtags_basic() {
        let tags = extract_body_hashtags("hello #rust and #web-dev, file#anchor");
        assert_eq!(tags, vec!["rust".to_string(), "web-dev".to_string()]);
    }

    #[test]
    fn tag_index_merges_frontmatter_and_body_dedup_per_note() {
        let mut n = note("a.md", true);
        n.metadata.insert(
            "tags".to_string(),
            crate::value::Value::Scalar(crate::value::Scalar::String("Rust".to_string())),
        );
        n.content = "more #rust content".to_string();
        let index = build_tag_index(&[n]);
        assert_eq!(index.get("rust").unwrap().len(), 1);
    }
}
