use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{ChatSession, ConversationEntry, HttpTransport, DEFAULT_ENDPOINT};
use shared::domain::{EntryId, Role};
use sheet_codec::{PreviewTable, Workbook};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Send spreadsheets to a processing backend and chat about the result")]
struct Cli {
    #[arg(long, env = "SHEET_CHAT_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive chat on stdin (default).
    Chat,
    /// Send one message, print the reply and save any returned file.
    Send {
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long, default_value = "")]
        message: String,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

type Session = ChatSession<HttpTransport>;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let transport = HttpTransport::new(&cli.endpoint)
        .with_context(|| format!("cannot use endpoint '{}'", cli.endpoint))?;
    let session = ChatSession::new(transport);

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => run_chat(&session).await,
        Command::Send { file, message, out } => run_send(&session, file, &message, &out).await,
    }
}

async fn run_send(session: &Session, file: Option<PathBuf>, message: &str, out: &Path) -> Result<()> {
    if let Some(path) = file {
        session
            .attach_path(&path)
            .await
            .with_context(|| format!("cannot attach '{}'", path.display()))?;
    }

    let outcome = session.send(message).await?;
    println!("{}", format_entry(&outcome.reply));
    if outcome.reply.role == Role::Error {
        bail!("request failed");
    }

    if outcome.reply.processed_file.is_some() {
        let artifact = session.download(outcome.reply.id).await?;
        let path = artifact
            .save_in(out)
            .await
            .with_context(|| format!("cannot write into '{}'", out.display()))?;
        println!("saved {}", path.display());
    }
    Ok(())
}

async fn run_chat(session: &Session) -> Result<()> {
    println!(
        "Chatting with {}. Type /help for commands.",
        session.transport().endpoint()
    );
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let line = line.trim();
        let Some(command) = line.strip_prefix('/') else {
            if line.is_empty() && session.attachment_name().await.is_none() {
                continue;
            }
            match session.send(line).await {
                Ok(outcome) => println!("{}", format_entry(&outcome.reply)),
                Err(error) => println!("! {error}"),
            }
            continue;
        };

        let mut parts = command.split_whitespace();
        match parts.next().unwrap_or_default() {
            "attach" => {
                let path = parts.collect::<Vec<_>>().join(" ");
                if path.is_empty() {
                    println!("! usage: /attach <path>");
                    continue;
                }
                match session.attach_path(&path).await {
                    Ok(preview) => {
                        println!("attached {path}");
                        match preview {
                            Some(workbook) => print_workbook(&workbook, None),
                            None => println!("(no local preview available)"),
                        }
                    }
                    Err(error) => println!("! {error}"),
                }
            }
            "detach" => match session.detach().await {
                Some(attachment) => println!("detached {}", attachment.name),
                None => println!("nothing attached"),
            },
            "preview" => {
                let sheet = parts.next();
                match session.current_file().await {
                    Some(file) => match &file.workbook {
                        Some(workbook) => print_workbook(workbook, sheet),
                        None => println!("{} cannot be previewed", file.file_name),
                    },
                    None => println!("no processed file yet"),
                }
            }
            "download" => {
                let mut entry = None;
                let mut dir = PathBuf::from(".");
                for arg in parts {
                    match arg.parse::<u64>() {
                        Ok(id) if entry.is_none() => entry = Some(EntryId(id)),
                        _ => dir = PathBuf::from(arg),
                    }
                }
                let artifact = match entry {
                    Some(id) => session.download(id).await,
                    None => session.download_current().await,
                };
                match artifact {
                    Ok(artifact) => match artifact.save_in(&dir).await {
                        Ok(path) => println!("saved {}", path.display()),
                        Err(error) => println!("! cannot write into '{}': {error}", dir.display()),
                    },
                    Err(error) => println!("! {error}"),
                }
            }
            "log" => {
                for entry in session.entries().await {
                    println!("{}", format_entry(&entry));
                }
            }
            "quit" | "exit" => break,
            "help" => print_help(),
            other => println!("! unknown command /{other}; try /help"),
        }
    }
    Ok(())
}

fn print_help() {
    println!("  <text>                 send a message (with the attached file, if any)");
    println!("  /attach <path>         attach a .xlsx or .xls file and preview it");
    println!("  /detach                drop the pending attachment");
    println!("  /preview [sheet]       show the most recent processed file");
    println!("  /download [id] [dir]   save a processed file (default: most recent)");
    println!("  /log                   list the conversation");
    println!("  /quit                  leave");
}

fn format_entry(entry: &ConversationEntry) -> String {
    let role = match entry.role {
        Role::User => "you",
        Role::Assistant => "assistant",
        Role::Error => "error",
    };
    let mut line = format!("#{} {role}: {}", entry.id, entry.text.as_deref().unwrap_or(""));
    if let Some(name) = &entry.attachment_name {
        line.push_str(&format!(" [attached {name}]"));
    }
    if let Some(name) = &entry.file_name {
        line.push_str(&format!(" [file {name}]"));
    }
    line
}

fn print_workbook(workbook: &Workbook, only: Option<&str>) {
    if workbook.is_empty() {
        println!("(workbook has no sheets)");
        return;
    }
    let sheets = workbook
        .sheets()
        .iter()
        .filter(|sheet| only.map_or(true, |name| sheet.name == name));

    let mut shown = 0;
    for sheet in sheets {
        shown += 1;
        println!("[{}]", sheet.name);
        match PreviewTable::from_sheet(sheet) {
            Some(table) => println!("{}", table.to_text()),
            None => println!("(empty sheet)"),
        }
    }
    if shown == 0 {
        let names = workbook.sheet_names().collect::<Vec<_>>().join(", ");
        println!("no such sheet; available: {names}");
    }
}
