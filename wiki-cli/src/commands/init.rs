//! Init command implementation.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"vault: vault
home_slug: index
watch: true
public_by_default: false

embedding:
  model_identifier: null
  tracker_path: .wiki-vault/embeddings-tracker.json
  vector_store_endpoint: null
  vector_store_index: null
  chat_model_identifier: null

server:
  port: 8000
  bind: 127.0.0.1
"#;

/// Scaffold a new wiki-vault project in `path` (defaults to the current directory).
pub fn init_vault(path: Option<&Path>) -> Result<()> {
    let root = path.unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(root).with_context(|| format!("failed to create {root:?}"))?;

    write_config(root)?;
    scaffold_vault(root)?;

    println!("initialized wiki-vault project in {root:?}");
    println!("  - edit wiki.yml to point `vault:` at your Obsidian vault");
    println!("  - set `public_by_default` or add `publish: true` frontmatter to notes you want served");
    Ok(())
}

fn write_config(root: &Path) -> Result<()> {
    let config_path = root.join("wiki.yml");
    if config_path.exists() {
        println!("wiki.yml already exists at {config_path:?}");
        return Ok(());
    }

    fs::write(&config_path, DEFAULT_CONFIG).with_context(|| format!("failed to write {config_path:?}"))?;
    println!("created {config_path:?}");
    Ok(())
}

fn scaffold_vault(root: &Path) -> Result<()> {
    let vault_root = root.join("vault");
    fs::create_dir_all(&vault_root).with_context(|| format!("failed to create {vault_root:?}"))?;

    let index = vault_root.join("index.md");
    if !index.exists() {
        fs::write(&index, sample_note())?;
        println!("created {index:?}");
    }

    Ok(())
}

fn sample_note() -> String {
    r#"---
title: Welcome
publish: true
---

# Welcome to your wiki-vault

This note is served at `/index` (and at `/` once it's your `home_slug`).
Edit it, add more `.md` files anywhere under `vault/`, and link between
them with `[[Wiki Links]]` or `[[Other Note|a nicer label]]`.

Run `wiki-vault serve` and the dev server will pick up edits live.
"#
    .to_string()
}
