use std::io::{self, BufRead, Write};
use std::sync::Arc;

use clap::Parser;
use colored::*;
use tracing_subscriber::EnvFilter;

use debate_lens::cli::{self, Args};
use debate_lens::message::{extract_agent_text, DebateRound};
use debate_lens::render::{clean_agent_text, render_transcript};
use debate_lens::session::DebateSession;
use debate_lens::{web, ClientError, DebateClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    cli::validate(&args)?;

    if args.plain {
        colored::control::set_override(false);
    }

    let client = DebateClient::new(&args.api_base);

    if args.sessions {
        let listing = client.list_sessions().await?;
        if listing.sessions.is_empty() {
            println!("No saved sessions.");
        } else {
            for id in listing.sessions {
                println!("{id}");
            }
        }
        return Ok(());
    }

    let mut session = if let Some(id) = &args.load {
        let loaded = client.load_debate(id).await?;
        let session = DebateSession::from_loaded(id, loaded);
        eprintln!(
            "{}",
            format!("Loaded session {id} ({} rounds)", session.round_count()).bright_green()
        );
        session
    } else {
        let topic = args.topic.clone().unwrap_or_default();
        eprintln!("{}", format!("Starting debate: {topic}").bright_green());
        let response = client.start_debate(&topic).await?;
        DebateSession::start(&topic, response)
    };

    if args.serve {
        web::serve(args.port, Arc::new(client), Arc::new(session), args.load.clone()).await?;
        return Ok(());
    }

    for (index, round) in session.history.iter().enumerate() {
        print_round(index, round);
    }

    run_loop(&client, &mut session).await;

    if let Some(path) = &args.export {
        std::fs::write(path, render_transcript(&session))?;
        eprintln!("{}", format!("Transcript written to {path}").bright_green());
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Terminal loop — the continue action is user-gated, one request in flight
// ---------------------------------------------------------------------------

enum Action {
    Continue,
    Quit,
}

async fn run_loop(client: &DebateClient, session: &mut DebateSession) {
    print_help();
    let stdin = io::stdin();

    loop {
        if session.done {
            println!("{}", "Debate concluded.".bright_magenta().bold());
            break;
        }

        print!("{} ", ">".bright_cyan());
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        match dispatch(client, session, line.trim()).await {
            Ok(Action::Quit) => break,
            Ok(Action::Continue) => {}
            // Per-action failure: report and re-prompt, state untouched.
            Err(e) => eprintln!("{}", e.to_string().bright_red()),
        }
    }
}

async fn dispatch(
    client: &DebateClient,
    session: &mut DebateSession,
    line: &str,
) -> Result<Action, ClientError> {
    match line {
        "/quit" | "/exit" => return Ok(Action::Quit),
        "/help" => {
            print_help();
            return Ok(Action::Continue);
        }
        "/prd" => {
            let prd = client.prd_text().await?;
            println!("{}", prd.text);
            return Ok(Action::Continue);
        }
        "/save" => {
            let saved = client.save_debate().await?;
            println!("Debate saved. Session id: {}", saved.session_id.bright_yellow());
            return Ok(Action::Continue);
        }
        _ => {}
    }

    if let Some(rest) = line.strip_prefix("/ask ") {
        // Agent names contain spaces, so the separator is a colon:
        //   /ask UX Designer: why tabs over a sidebar?
        match rest.split_once(':') {
            Some((agent, question)) if !question.trim().is_empty() => {
                let reply = client.agent_chat(agent.trim(), question.trim()).await?;
                println!("{}", agent.trim().bright_yellow().bold());
                println!("{}", reply.answer);
            }
            _ => eprintln!("{}", "usage: /ask <agent>: <question>".bright_red()),
        }
        return Ok(Action::Continue);
    }

    if let Some(question) = line.strip_prefix("/chat ") {
        let reply = client.llm_chat(question.trim()).await?;
        println!("{}", reply.answer);
        return Ok(Action::Continue);
    }

    if let Some(arg) = command_arg(line, "/download") {
        let path = if arg.is_empty() { "Product_PRD.docx" } else { arg };
        let bytes = client.download_prd().await?;
        match std::fs::write(path, bytes) {
            Ok(()) => eprintln!("{}", format!("PRD written to {path}").bright_green()),
            Err(e) => eprintln!("{}", format!("could not write {path}: {e}").bright_red()),
        }
        return Ok(Action::Continue);
    }

    if let Some(arg) = command_arg(line, "/export") {
        let path = if arg.is_empty() { "transcript.html" } else { arg };
        match std::fs::write(path, render_transcript(session)) {
            Ok(()) => eprintln!("{}", format!("Transcript written to {path}").bright_green()),
            Err(e) => eprintln!("{}", format!("could not write {path}: {e}").bright_red()),
        }
        return Ok(Action::Continue);
    }

    if line.starts_with('/') {
        eprintln!("{}", format!("unknown command: {line} (try /help)").bright_red());
        return Ok(Action::Continue);
    }

    // Empty line advances the debate; any other text (with or without a
    // leading "@") is a mention directed at the round.
    let mention = line.strip_prefix('@').unwrap_or(line).trim();
    advance(client, session, mention).await?;
    Ok(Action::Continue)
}

/// Request the next round and print whatever rounds the response added.
async fn advance(
    client: &DebateClient,
    session: &mut DebateSession,
    mention: &str,
) -> Result<(), ClientError> {
    let shown = session.round_count();
    let response = client.continue_debate(mention).await?;
    session.apply_round(mention, response);
    for (index, round) in session.history.iter().enumerate().skip(shown) {
        print_round(index, round);
    }
    Ok(())
}

/// `Some(argument)` when the line is exactly `cmd` or `cmd <argument>`.
/// `/downloadable` is not `/download` with a path.
fn command_arg<'a>(line: &'a str, cmd: &str) -> Option<&'a str> {
    if line == cmd {
        return Some("");
    }
    line.strip_prefix(cmd)
        .filter(|rest| rest.starts_with(' '))
        .map(str::trim)
}

fn print_round(index: usize, round: &DebateRound) {
    println!();
    println!(
        "{}",
        format!("── Round {} {}", index + 1, "─".repeat(40)).bright_blue().bold()
    );
    for (agent, message) in round.agents() {
        let text = clean_agent_text(&extract_agent_text(&message));
        println!("{}", agent.bright_yellow().bold());
        if text.is_empty() {
            println!("{}", "(no content)".dimmed());
        } else {
            println!("{text}");
        }
        println!();
    }
}

fn print_help() {
    eprintln!("{}", "Commands:".bright_white().bold());
    eprintln!("  {}            advance to the next round", "<enter>".bright_cyan());
    eprintln!("  {}            direct a mention at the next round", "@<text>".bright_cyan());
    eprintln!("  {}  ask one agent directly", "/ask <agent>: <q>".bright_cyan());
    eprintln!("  {}         ask the general model", "/chat <q>".bright_cyan());
    eprintln!("  {}              print the PRD markdown", "/prd".bright_cyan());
    eprintln!("  {}             save the session on the backend", "/save".bright_cyan());
    eprintln!("  {}  write the PRD document", "/download [path]".bright_cyan());
    eprintln!("  {}    write the transcript HTML", "/export [path]".bright_cyan());
    eprintln!("  {}              quit", "/quit".bright_cyan());
}
