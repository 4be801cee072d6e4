//! `parley chat` — Single-message or interactive terminal chat.

use std::io::Write;

use parley_agent::ChatBot;
use parley_core::message::ThreadId;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(
    message: Option<String>,
    language: Option<String>,
    thread: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let chatbot = ChatBot::from_config(&config).map_err(|e| {
        super::explain_missing_key(&e);
        e
    })?;

    let thread_id = thread
        .filter(|t| !t.trim().is_empty())
        .map(ThreadId::from)
        .unwrap_or_default();
    let language = language.as_deref();

    if let Some(msg) = message {
        eprint!("  Thinking...");
        let response = chatbot
            .generate_response(&msg, language, Some(thread_id.as_str()))
            .await;
        eprint!("\r              \r");
        println!("{response}");
        return Ok(());
    }

    println!();
    println!("  Parley — interactive chat");
    println!();
    println!("  Model:     {}", chatbot.model());
    println!("  Language:  {}", language.unwrap_or(chatbot.default_language()));
    println!("  Thread:    {thread_id}");
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if matches!(line, "exit" | "quit" | "/exit" | "/quit" | ":q") {
            break;
        }
        if line.is_empty() {
            continue;
        }

        eprint!("  ...");
        let response = chatbot
            .generate_response(line, language, Some(thread_id.as_str()))
            .await;
        eprint!("\r     \r");

        println!();
        for text in response.lines() {
            println!("  Assistant > {text}");
        }
        println!();
    }

    println!();
    println!("  Goodbye!");
    println!();

    Ok(())
}
