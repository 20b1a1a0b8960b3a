//! `docent chat` — Interactive or single-question mode.

use docent_agent::{Answer, ConversationLoop, DisplayEntry, Session, display_name, referenced_summary};
use docent_config::AppConfig;
use docent_core::error::Error;
use docent_core::event::{DomainEvent, EventBus};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

pub async fn run(
    config_path: Option<&Path>,
    message: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;

    // Check for API key early — give a clear error
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set the environment variable:");
        eprintln!("    export {}=sk-ant-...", docent_config::API_KEY_ENV);
        eprintln!();
        eprintln!("  Or add it to your config file:");
        let shown = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(AppConfig::config_path);
        eprintln!("    {}", shown.display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let provider = docent_providers::build_from_config(&config)?;
    let tools = Arc::new(docent_tools::build_registry(&config.library)?);
    let tool_count = tools.len();

    let event_bus = Arc::new(EventBus::default());
    let runner = Arc::new(
        ConversationLoop::from_config(&config, provider, tools).with_event_bus(event_bus.clone()),
    );
    let session = Arc::new(Session::new());

    spawn_activity_printer(&event_bus);

    if let Some(msg) = message {
        // Single question mode
        eprintln!("  Searching documentation...");
        let answer = session.submit(&runner, &msg).await?;
        if let Some(caption) = referenced_summary(&answer.tools_used) {
            println!("📚 {caption}");
            println!();
        }
        println!("{}", answer.text);
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        Docent — Documentation Assistant       ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Model:     {}", config.model);
    println!("  Endpoint:  {}", config.base_url);
    println!("  Tools:     {tool_count} documents");
    println!();
    println!("  Type your question and press Enter.");
    println!("  /clear resets the conversation, /history shows it.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = spawn_stdin_reader();
    let mut pending: JoinSet<Result<Answer, Error>> = JoinSet::new();
    let mut input_closed = false;

    prompt()?;

    loop {
        if input_closed && pending.is_empty() {
            break;
        }

        tokio::select! {
            line = lines.recv(), if !input_closed => {
                let Some(line) = line else {
                    input_closed = true;
                    continue;
                };

                match line.as_str() {
                    "exit" | "quit" | "/exit" | "/quit" | ":q" => break,
                    "/clear" => {
                        match session.clear().await {
                            Ok(()) => println!("  Conversation cleared."),
                            Err(e) => eprintln!("  [Error] {e}"),
                        }
                        prompt()?;
                    }
                    "/history" => {
                        if session.is_busy() {
                            eprintln!("  [Error] {}", Error::Busy);
                        } else {
                            print_history(&session.display().await);
                        }
                        prompt()?;
                    }
                    _ => {
                        // A prompt sent while one is in flight fails fast with Busy
                        let session = session.clone();
                        let runner = runner.clone();
                        pending.spawn(async move { session.submit(&runner, &line).await });
                    }
                }
            }
            Some(joined) = pending.join_next(), if !pending.is_empty() => {
                match joined {
                    Ok(Ok(answer)) => print_answer(&answer.text, &answer.tools_used),
                    Ok(Err(e)) => {
                        eprintln!("  [Error] {e}");
                        println!();
                    }
                    Err(e) => eprintln!("  [Error] request task failed: {e}"),
                }
                prompt()?;
            }
        }
    }

    println!();
    println!("  Goodbye! 👋");
    println!();

    Ok(())
}

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}

/// Read trimmed, non-empty stdin lines until EOF.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(32);

    tokio::spawn(async move {
        let mut lines = BufReader::new(io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim().to_string();
                    if line.is_empty() {
                        continue;
                    }
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break, // EOF (Ctrl+D)
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read stdin");
                    break;
                }
            }
        }
    });

    rx
}

/// Show tool activity on stderr while a request runs.
fn spawn_activity_printer(bus: &EventBus) {
    let mut events = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let DomainEvent::ToolExecuted { tool_name, .. } = event.as_ref() {
                        eprintln!("  · reading {}", display_name(tool_name));
                    }
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });
}

fn print_answer(text: &str, tools_used: &[String]) {
    println!();
    if let Some(caption) = referenced_summary(tools_used) {
        println!("  📚 {caption}");
    }
    if text.trim().is_empty() {
        println!("  Assistant > (no answer text)");
    }
    for line in text.lines() {
        println!("  Assistant > {line}");
    }
    println!();
}

/// Answers with no visible text are left out of the replayed history.
fn shown_in_history(entry: &DisplayEntry) -> bool {
    match entry {
        DisplayEntry::User { .. } => true,
        DisplayEntry::Assistant { text, .. } => !text.trim().is_empty(),
    }
}

fn print_history(entries: &[DisplayEntry]) {
    if entries.is_empty() {
        println!("  (no conversation yet)");
        return;
    }
    for entry in entries.iter().filter(|e| shown_in_history(e)) {
        match entry {
            DisplayEntry::User { text } => {
                println!();
                for line in text.lines() {
                    println!("  You > {line}");
                }
            }
            DisplayEntry::Assistant { text, tools_used } => print_answer(text, tools_used),
        }
    }
}
