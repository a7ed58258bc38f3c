//! `folio ask` — Answer one question and exit.

use super::{Overrides, load_config, load_session};

pub async fn run(
    overrides: &Overrides,
    question: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(overrides)?;
    let mut session = load_session(&config)?;

    let outcome = session
        .submit_query(question)
        .await
        .ok_or("The question must not be empty")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!("{}", outcome.text);
    if !outcome.sections.is_empty() {
        println!();
        println!("Sources:");
        for doc in &outcome.sections {
            println!("  {} ({})", doc.anchor(), doc.category);
        }
    }
    Ok(())
}
