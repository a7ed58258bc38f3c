//! `folio chat` — Interactive chat in the terminal.

use super::{Overrides, load_config, load_session};
use folio_assistant::AssistantEvent;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::RecvError};

pub async fn run(overrides: &Overrides) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(overrides)?;
    let mut session = load_session(&config)?;

    println!("💬 Folio — ask me about {}", session.profile().basics.name);
    println!("   Commands: /reset, /quit");
    if !session.has_generator() {
        println!("   Mode: templates (no generative model)");
    }
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        match input {
            "" => continue,
            "/quit" | "/exit" => break,
            "/reset" => {
                session.reset();
                println!("   Conversation cleared.\n");
                continue;
            }
            _ => {}
        }

        let mut rx = session.subscribe();
        let (outcome, ()) = tokio::join!(session.submit_query(input), print_stream(&mut rx));
        if let Some(outcome) = outcome {
            tracing::debug!(strategy = outcome.strategy.as_str(), "Turn finished");
        }
        println!();
    }

    println!("👋 Bye!");
    Ok(())
}

/// Print a turn's text as it streams; loading progress goes to stderr.
async fn print_stream(rx: &mut broadcast::Receiver<AssistantEvent>) {
    let mut printed = String::new();
    loop {
        match rx.recv().await {
            Ok(AssistantEvent::LoadingStateChanged(state)) => {
                if state.loading {
                    eprintln!("   ⏳ {} ({:.0}%)", state.status, state.progress * 100.0);
                } else if !state.status.is_empty() {
                    eprintln!("   {}", state.status);
                }
            }
            Ok(AssistantEvent::StreamingResponse { content, done, .. }) => {
                match delta(&printed, &content) {
                    Delta::Append(suffix) => print!("{suffix}"),
                    Delta::Rewrite(text) => print!("\n{text}"),
                }
                let _ = std::io::stdout().flush();
                printed = content;
                if done {
                    println!();
                    return;
                }
            }
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => return,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Delta<'a> {
    /// The new text extends what is on screen
    Append(&'a str),
    /// The new text replaces what is on screen
    Rewrite(&'a str),
}

/// Work out what to print when the reply text changes from `printed` to `content`.
fn delta<'a>(printed: &str, content: &'a str) -> Delta<'a> {
    if printed.is_empty() {
        return Delta::Append(content);
    }
    match content.strip_prefix(printed) {
        Some(suffix) => Delta::Append(suffix),
        None => Delta::Rewrite(content),
    }
}
