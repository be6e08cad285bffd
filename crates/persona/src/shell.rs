// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `persona shell` command implementation.
//!
//! Every line is first checked for a switch suggestion against the active
//! persona, then routed. Routed and switched personas are recorded into the
//! in-memory history so later ambiguous queries lean toward recent habits.

use colored::Colorize;
use persona_config::PersonaConfig;
use persona_core::{CategoryId, PersonaError};
use persona_router::{PersonaEvent, RouterContext, SwitchSource};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;

use crate::commands::{format_result, format_suggestion, to_json};
use crate::runtime::Runtime;

const EVENT_BUFFER: usize = 64;

/// A parsed shell line.
#[derive(Debug, PartialEq)]
enum ShellCommand<'a> {
    Quit,
    Help,
    Accept,
    Reject,
    Switch(&'a str),
    Stats,
    Suggestions(bool),
    Query(&'a str),
    Invalid(String),
}

fn parse_line(line: &str) -> Option<ShellCommand<'_>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Some(ShellCommand::Query(line));
    };

    let mut parts = command.split_whitespace();
    let parsed = match (parts.next(), parts.next()) {
        (Some("quit" | "exit"), None) => ShellCommand::Quit,
        (Some("help"), None) => ShellCommand::Help,
        (Some("accept"), None) => ShellCommand::Accept,
        (Some("reject"), None) => ShellCommand::Reject,
        (Some("stats"), None) => ShellCommand::Stats,
        (Some("switch"), Some(category)) => ShellCommand::Switch(category),
        (Some("suggestions"), Some("on")) => ShellCommand::Suggestions(true),
        (Some("suggestions"), Some("off")) => ShellCommand::Suggestions(false),
        _ => ShellCommand::Invalid(format!("unknown command `{line}`, try /help")),
    };
    Some(parsed)
}

/// Runs the `persona shell` interactive REPL.
pub async fn run_shell(config: &PersonaConfig, user: Option<String>) -> Result<(), PersonaError> {
    let runtime = Runtime::build(config)?;
    let user_id = user.unwrap_or_else(|| config.agent.user_id.clone());

    let (tx, mut events) = mpsc::channel(EVENT_BUFFER);
    let ctx = RouterContext::new(runtime.coordinator.clone(), user_id, config.suggestions.clone())
        .with_events(tx);

    let mut rl = DefaultEditor::new()
        .map_err(|e| PersonaError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", "persona shell".bold().green());
    println!("Type {} for commands, {} to exit.\n", "/help".yellow(), "/quit".yellow());

    loop {
        let prompt = format!("{}> ", ctx.active_persona().await.as_str().green());
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        };
        let Some(command) = parse_line(&line) else {
            continue;
        };
        let _ = rl.add_history_entry(line.as_str());

        match command {
            ShellCommand::Quit => break,
            ShellCommand::Help => print_help(),
            ShellCommand::Accept => match pending_suggestion(&ctx).await {
                Some(s) => {
                    ctx.accept_suggestion(&s).await;
                }
                None => println!("{}", "no pending suggestion".dimmed()),
            },
            ShellCommand::Reject => match pending_suggestion(&ctx).await {
                Some(s) => {
                    ctx.reject_suggestion(&s).await;
                    println!("{}", "suggestion dismissed".dimmed());
                }
                None => println!("{}", "no pending suggestion".dimmed()),
            },
            ShellCommand::Switch(category) => {
                if let Err(e) = ctx.switch_persona(&CategoryId::new(category)).await {
                    eprintln!("{}: {e}", "error".red());
                }
            }
            ShellCommand::Stats => print_stats(&ctx).await?,
            ShellCommand::Suggestions(enabled) => {
                ctx.set_suggestions_enabled(enabled);
                let state = if enabled { "on" } else { "off" };
                println!("{}", format!("suggestions {state}").dimmed());
            }
            ShellCommand::Query(query) => {
                let current = ctx.active_persona().await;
                if let Some(s) = ctx.analyze_suggestion(query, &current).await {
                    println!("{} (/accept or /reject)", format_suggestion(&s));
                }
                let result = ctx.route(query).await;
                println!("{}", format_result(&result));
            }
            ShellCommand::Invalid(message) => eprintln!("{}", message.yellow()),
        }

        drain_events(&mut events, &runtime).await;
    }

    Ok(())
}

async fn pending_suggestion(ctx: &RouterContext) -> Option<persona_router::Suggestion> {
    ctx.last_suggestion().await.filter(|s| s.is_pending())
}

/// Show persona switches and feed routed/switched personas into history.
async fn drain_events(events: &mut mpsc::Receiver<PersonaEvent>, runtime: &Runtime) {
    while let Ok(event) = events.try_recv() {
        match event {
            PersonaEvent::Routed { user_id, result } => {
                runtime.history.record(&user_id, &result.category).await;
            }
            PersonaEvent::PersonaSwitched {
                user_id,
                from,
                to,
                source,
            } => {
                let how = match source {
                    SwitchSource::Manual => "switched",
                    SwitchSource::Suggestion => "accepted suggestion",
                };
                println!("{}", format!("{how}: {from} -> {to}").dimmed());
                runtime.history.record(&user_id, &to).await;
            }
            PersonaEvent::SuggestionOffered(_) | PersonaEvent::SuggestionResolved { .. } => {}
        }
    }
}

async fn print_stats(ctx: &RouterContext) -> Result<(), PersonaError> {
    println!("{}", "routing".bold());
    println!("{}", to_json(&ctx.get_stats().await)?);
    println!("{}", "suggestions".bold());
    println!("{}", to_json(&ctx.get_suggestion_stats().await)?);
    Ok(())
}

fn print_help() {
    println!("  <text>               route a query (and maybe suggest a switch)");
    println!("  /accept, /reject     resolve the pending suggestion");
    println!("  /switch <persona>    switch persona manually");
    println!("  /suggestions on|off  toggle suggestions");
    println!("  /stats               show routing and suggestion statistics");
    println!("  /quit                leave the shell");
}
