//! Note commands: add, list, show, edit, rm.

use uuid::Uuid;

use quill_core::{NoteChanges, NoteDraft};

use crate::app::{require_session, unwrap_vault_result, AppContext};
use crate::cli::{AddArgs, EditArgs, ListArgs, RmArgs, ShowArgs};
use crate::helpers::{parse_output_format, read_note_content, OutputFormat};
use crate::output::{note_json, notes_json, notes_table, print_note};

/// Notes shown by `list` when --limit is not given.
const DEFAULT_LIST_LIMIT: usize = 20;

/// Width of the content summary column in the list table.
const TABLE_SUMMARY_MAX: usize = 60;

pub fn handle_add(ctx: &AppContext, args: &AddArgs) -> anyhow::Result<()> {
    let vault = ctx.open_vault()?;
    let token = require_session()?;

    let content = read_note_content(args.no_input, args.content.clone(), None)?;
    let draft = NoteDraft::new(args.title.as_str(), content).with_tags(args.tag.clone());
    let note = unwrap_vault_result(vault.create_note(&token, &draft))?;

    if !ctx.quiet() {
        println!("Added note {}", note.id);
    }
    Ok(())
}

pub fn handle_list(ctx: &AppContext, args: &ListArgs) -> anyhow::Result<()> {
    if args.json && args.format.is_some() {
        return Err(anyhow::anyhow!("--format cannot be used with --json"));
    }

    let vault = ctx.open_vault()?;
    let token = require_session()?;

    let mut notes = unwrap_vault_result(vault.notes(&token))?;
    if let Some(tag) = &args.tag {
        let needle = tag.trim().to_lowercase();
        notes.retain(|note| note.tags.iter().any(|t| t == &needle));
    }
    notes.truncate(args.limit.unwrap_or(DEFAULT_LIST_LIMIT));

    if args.json {
        println!("{}", serde_json::to_string_pretty(&notes_json(&notes))?);
        return Ok(());
    }

    if notes.is_empty() {
        if !ctx.quiet() {
            println!("No notes found.");
        }
        return Ok(());
    }

    match parse_output_format(args.format.as_deref())?.unwrap_or(OutputFormat::Table) {
        OutputFormat::Table => {
            println!("{}", notes_table(&notes, TABLE_SUMMARY_MAX));
        }
        OutputFormat::Plain => {
            for note in &notes {
                println!("{} {} {}", note.id, note.updated_at.to_rfc3339(), note.title);
            }
        }
    }
    Ok(())
}

pub fn handle_show(ctx: &AppContext, args: &ShowArgs) -> anyhow::Result<()> {
    let vault = ctx.open_vault()?;
    let token = require_session()?;
    let id = parse_note_id(&args.id)?;

    let note = unwrap_vault_result(vault.note(&token, &id))?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&note_json(&note))?);
    } else {
        print_note(&note, ctx.quiet());
    }
    Ok(())
}

pub fn handle_edit(ctx: &AppContext, args: &EditArgs) -> anyhow::Result<()> {
    let vault = ctx.open_vault()?;
    let token = require_session()?;
    let id = parse_note_id(&args.id)?;

    let mut changes = NoteChanges::new();
    if let Some(title) = &args.title {
        changes = changes.with_title(title.clone());
    }
    if let Some(content) = &args.content {
        changes = changes.with_content(content.clone());
    }
    if args.clear_tags {
        changes = changes.with_tags(Vec::new());
    } else if !args.tag.is_empty() {
        changes = changes.with_tags(args.tag.clone());
    }

    // No field flags at all means edit the content in $EDITOR, seeded
    // with the current text.
    if changes.is_empty() {
        let existing = unwrap_vault_result(vault.note(&token, &id))?;
        let content = read_note_content(args.no_input, None, Some(&existing.content))?;
        changes = changes.with_content(content);
    }

    let note = unwrap_vault_result(vault.update_note(&token, &id, &changes))?;
    if !ctx.quiet() {
        println!("Updated note {}", note.id);
    }
    Ok(())
}

pub fn handle_rm(ctx: &AppContext, args: &RmArgs) -> anyhow::Result<()> {
    let vault = ctx.open_vault()?;
    let token = require_session()?;
    let id = parse_note_id(&args.id)?;

    unwrap_vault_result(vault.delete_note(&token, &id))?;
    if !ctx.quiet() {
        println!("Deleted note {}", id);
    }
    Ok(())
}

fn parse_note_id(value: &str) -> anyhow::Result<Uuid> {
    Uuid::parse_str(value).map_err(|_| anyhow::anyhow!("Invalid note ID: {}", value))
}
