//! One-shot CLI search command: loads the vault once, runs Phase A
//! lexical search (title + heading matches) and prints the results.
//! The live, streaming semantic search lives in the dev server
//! (`/-/search-stream`) — this command is for scripts and agents that
//! want a single synchronous answer without standing up a server.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use wiki_core::Config;

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub limit: usize,
    pub json: bool,
}

#[derive(Serialize)]
struct JsonResult<'a> {
    kind: &'a str,
    slug: &'a str,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    heading: Option<&'a str>,
}

pub fn search_vault(config_path: &Path, query: &str, opts: SearchOptions) -> Result<()> {
    let config = Config::from_file(config_path).context("failed to load configuration")?;
    let snapshot = wiki_core::load_vault(&config.vault_dir(), config.public_by_default);
    let notes: Vec<wiki_core::Note> = snapshot.notes_by_slug.values().cloned().collect();

    let title_matches = wiki_core::search::search_by_filename(&notes, query, opts.limit);
    let heading_matches = wiki_core::search::search_by_headings(&notes, query, opts.limit);

    if opts.json {
        let mut results = Vec::new();
        for note in &title_matches {
            results.push(JsonResult {
                kind: "title",
                slug: &note.slug,
                title: &note.title,
                heading: None,
            });
        }
        for hm in &heading_matches {
            results.push(JsonResult {
                kind: "heading",
                slug: &hm.note_slug,
                title: &hm.heading,
                heading: Some(&hm.heading),
            });
        }
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if title_matches.is_empty() && heading_matches.is_empty() {
        println!("no results for '{query}'");
        return Ok(());
    }

    if !title_matches.is_empty() {
        println!("titles:");
        for note in &title_matches {
            println!("  /{}  {}", note.slug, note.title);
        }
    }
    if !heading_matches.is_empty() {
        println!("headings:");
        for hm in &heading_matches {
            println!("  /{}#{}  {} — {}", hm.note_slug, hm.line_number, hm.heading, hm.context);
        }
    }

    Ok(())
}
