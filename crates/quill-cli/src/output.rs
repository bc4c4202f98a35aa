//! Output formatting helpers for the CLI.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};

use quill_core::Note;

/// Convert a note to JSON for output.
pub fn note_json(note: &Note) -> serde_json::Value {
    serde_json::json!({
        "id": note.id,
        "title": note.title,
        "content": note.content,
        "tags": note.tags,
        "key_version": note.key_version,
        "created_at": note.created_at,
        "updated_at": note.updated_at,
    })
}

/// Convert multiple notes to JSON array for output.
pub fn notes_json(notes: &[Note]) -> Vec<serde_json::Value> {
    notes.iter().map(note_json).collect()
}

/// Extract a one-line summary of a note's content, truncated to `max` chars.
pub fn note_summary(note: &Note, max: usize) -> String {
    let line = note.content.lines().next().unwrap_or("");
    if line.chars().count() <= max {
        return line.to_string();
    }
    let truncated: String = line.chars().take(max).collect();
    format!("{}...", truncated)
}

/// Build a bordered table of notes for the list command.
pub fn notes_table(notes: &[Note], summary_max: usize) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "Updated", "Title", "Summary"]);

    for note in notes {
        table.add_row(vec![
            note.id.to_string(),
            note.updated_at.format("%Y-%m-%d %H:%M").to_string(),
            note.title.clone(),
            note_summary(note, summary_max),
        ]);
    }

    table
}

/// Print a single note in human-readable format.
pub fn print_note(note: &Note, quiet: bool) {
    if !quiet {
        println!("ID: {}", note.id);
        println!("Title: {}", note.title);
        println!("Created: {}", note.created_at.format("%Y-%m-%d %H:%M UTC"));
        println!("Updated: {}", note.updated_at.format("%Y-%m-%d %H:%M UTC"));
        if !note.tags.is_empty() {
            println!("Tags: {}", note.tags.join(", "));
        }
        println!();
    }
    println!("{}", note.content);
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn sample_note(content: &str) -> Note {
        Note {
            id: Uuid::new_v4(),
            title: "Sample".to_string(),
            content: content.to_string(),
            tags: vec!["work".to_string()],
            key_version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_summary_truncates_long_first_line() {
        let note = sample_note("abcdefghij\nsecond line");
        assert_eq!(note_summary(&note, 5), "abcde...");
        assert_eq!(note_summary(&note, 10), "abcdefghij");
    }

    #[test]
    fn test_summary_of_empty_content() {
        let note = sample_note("");
        assert_eq!(note_summary(&note, 60), "");
    }

    #[test]
    fn test_note_json_shape() {
        let note = sample_note("hello");
        let value = note_json(&note);

        assert_eq!(value["title"], "Sample");
        assert_eq!(value["content"], "hello");
        assert_eq!(value["tags"][0], "work");
        assert_eq!(value["key_version"], 1);
    }
}
