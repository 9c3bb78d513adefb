use std::pin::pin;

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use uuid::Uuid;

use blueprint::api::{ApiClient, ApiConfig};
use blueprint::auth::{EnvTokenProvider, TokenProvider};
use blueprint::models::envelope::{decode_unicode_escapes, AgentEnvelope};
use blueprint::session::{SessionConfig, SessionState, StreamSession};
use blueprint::snapshot;
use blueprint::store::ChatStore;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Backend host (can also be set via BLUEPRINT_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Maximum agent results accepted per generation
    #[arg(long)]
    max_results: Option<usize>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive generation session (the default)
    Chat,
    /// List chats persisted on the backend
    List,
    /// Delete one persisted chat
    Delete { id: Uuid },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let mut config = ApiConfig::from_env();
    if let Some(host) = &cli.host {
        config.host = host.clone();
    }
    let api = ApiClient::new(config)?;
    let tokens = EnvTokenProvider;

    match &cli.command {
        Some(Command::List) => list_chats(&api, &tokens).await,
        Some(Command::Delete { id }) => delete_chat(&api, &tokens, *id).await,
        Some(Command::Chat) | None => chat_loop(&cli, &api, &tokens).await,
    }
}

async fn chat_loop(cli: &Cli, api: &ApiClient, tokens: &EnvTokenProvider) -> Result<()> {
    let mut store = ChatStore::new();
    let path = snapshot::snapshot_path()?;
    store.replace_all(snapshot::load_snapshot(&path));
    if !store.list_chats().is_empty() {
        println!(
            "{}",
            style(format!("{} chats restored", store.list_chats().len())).dim()
        );
    }

    let mut config = SessionConfig::default();
    if let Some(max) = cli.max_results {
        config.max_agent_results = max;
    }

    println!(
        "Describe a product idea {}",
        style("- type \"exit\" to end the session, ctrl-c to stop a stream").dim()
    );

    let mut editor = DefaultEditor::new()?;
    loop {
        let line = match editor.readline("idea> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };
        let idea = line.trim().to_string();
        if idea.is_empty() {
            continue;
        }
        if idea.eq_ignore_ascii_case("exit") {
            break;
        }
        let _ = editor.add_history_entry(&idea);

        let chat_id = store.create_chat(&idea);
        let mut session = StreamSession::with_config(chat_id, config.clone());
        let handle = session.stop_handle();

        let outcome = {
            let mut run = pin!(session.run(api, tokens, &mut store, &idea));
            loop {
                tokio::select! {
                    outcome = &mut run => break outcome?,
                    _ = tokio::signal::ctrl_c() => {
                        if let Some(handle) = &handle {
                            handle.stop();
                        }
                    }
                }
            }
        };

        render_chat(&store, chat_id);
        match outcome.state {
            SessionState::Completed => println!(
                "{}",
                style(format!("{} agent results", outcome.agent_results)).green()
            ),
            SessionState::Stopped => println!("{}", style("stopped").yellow()),
            SessionState::Errored => println!("{}", style("stream failed").red()),
            _ => {}
        }
        if let Some(err) = outcome.persist_error {
            eprintln!("{}", style(format!("chat not saved: {}", err)).red());
        }

        snapshot::save_snapshot(&path, store.list_chats())?;
    }
    Ok(())
}

fn render_chat(store: &ChatStore, chat_id: Uuid) {
    let Some(chat) = store.chat(chat_id) else {
        return;
    };
    for message in &chat.messages {
        if let Some(envelope) = AgentEnvelope::from_message_content(&message.content) {
            println!("\n{}", style(&envelope.agent_name).bold().cyan());
            println!("{}", decode_unicode_escapes(&envelope.output));
        }
    }
}

async fn list_chats(api: &ApiClient, tokens: &EnvTokenProvider) -> Result<()> {
    let token = tokens.id_token().await?;
    let chats = api.fetch_chats(&token).await?;
    if chats.is_empty() {
        println!("{}", style("no chats saved").dim());
        return Ok(());
    }
    for chat in &chats {
        println!(
            "{}  {}  {}",
            chat.id,
            style(chat.created_at.format("%Y-%m-%d %H:%M").to_string()).dim(),
            chat.title
        );
    }
    Ok(())
}

async fn delete_chat(api: &ApiClient, tokens: &EnvTokenProvider, id: Uuid) -> Result<()> {
    let token = tokens.id_token().await?;
    api.delete_chat(&token, id).await?;
    println!("deleted {}", id);
    Ok(())
}
