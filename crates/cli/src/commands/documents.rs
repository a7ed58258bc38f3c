//! `folio documents` — Show the retrieval corpus built from the profile.

use super::{Overrides, load_config, load_profile};
use folio_assistant::{ProfileDocument, build_documents};

const PREVIEW_CHARS: usize = 60;

pub fn run(overrides: &Overrides, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(overrides)?;
    let profile = load_profile(&config)?;
    let documents = build_documents(&profile);

    if json {
        println!("{}", serde_json::to_string_pretty(&documents)?);
        return Ok(());
    }

    println!("📄 {} documents for {}\n", documents.len(), profile.basics.name);
    let id_width = documents.iter().map(|d| d.id.len()).max().unwrap_or(2).max(2);
    println!("  {:<id_width$}  {:<13}  CONTENT", "ID", "CATEGORY");
    for doc in &documents {
        println!("{}", row(doc, id_width));
    }
    Ok(())
}

fn row(doc: &ProfileDocument, id_width: usize) -> String {
    format!(
        "  {:<id_width$}  {:<13}  {}",
        doc.id,
        doc.category.as_str(),
        preview(&doc.content, PREVIEW_CHARS)
    )
}

/// First `max` characters of `text`, with an ellipsis when cut.
fn preview(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_cuts_on_char_boundary() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("abcdef", 3), "abc…");
        assert_eq!(preview("héllo wörld", 5), "héllo…");
    }
}
