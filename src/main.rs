use std::{io, path::PathBuf};

use clap::{Parser, Subcommand};

use cmd::Context;
use prompt::Prompt;
use settings::Settings;

mod cmd;
mod core;
mod error;
mod integrations;
mod prompt;
mod session;
mod settings;

#[derive(Parser, Debug)]
#[command(name = "ejcdesk")]
#[command(version = "0.1")]
#[command(about = "Registration desk for EJC event participants.", long_about = None)]
struct Args {
    /// JSON settings file. `EJC_API_BASE_URL` and `EJC_DATA_DIR` override its values.
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: RunType,
}

#[derive(Subcommand, Debug)]
enum RunType {
    /// List registered participants.
    List {
        /// Filter by name.
        #[arg(short, long)]
        search: Option<String>,

        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },

    /// Show every detail of a participant.
    Show { id: i64 },

    /// Register a new participant.
    /// Without `--from` the form is filled in interactively.
    Register {
        /// JSON file with the participant's fields.
        #[arg(short, long)]
        from: Option<PathBuf>,
    },

    /// Edit a participant.
    Edit {
        id: i64,

        /// JSON file with the fields to change. Fields not in the file are kept.
        #[arg(short, long)]
        from: Option<PathBuf>,
    },

    /// Delete a participant.
    Delete {
        id: i64,

        /// Skip the confirmation question.
        #[arg(short, long)]
        yes: bool,
    },

    /// Participant photos.
    #[command(subcommand)]
    Photo(PhotoCommand),

    /// Participant registration forms as PDF.
    #[command(subcommand)]
    Pdf(PdfCommand),

    /// The event logo printed on the PDFs.
    #[command(subcommand)]
    Logo(LogoCommand),

    /// Check that the API is reachable.
    Health,
}

#[derive(Subcommand, Debug)]
enum PhotoCommand {
    /// Upload a photo, optionally attaching it to a participant.
    Upload {
        file: PathBuf,

        #[arg(short, long)]
        participant: Option<i64>,
    },

    /// Print the URL a stored photo is served from.
    Url { path: String },
}

#[derive(Subcommand, Debug)]
enum PdfCommand {
    /// Download the form of one participant.
    Participant {
        id: i64,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Download the forms of every participant in one file.
    Complete {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum LogoCommand {
    Upload {
        file: PathBuf,
    },

    Get {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    Delete {
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let settings = Settings::load(args.settings.as_deref())?;
    let ctx = Context::new(settings)?;

    let stdin = io::stdin();
    let mut prompt = Prompt::new(stdin.lock(), io::stdout());

    match args.command {
        RunType::List { search, page } => {
            print!("{}", cmd::list(&ctx, search.as_deref(), page).await?);
        }
        RunType::Show { id } => {
            print!("{}", cmd::show(&ctx, id).await?);
        }
        RunType::Register { from } => {
            let participant = cmd::register(&ctx, &mut prompt, from.as_deref()).await?;
            println!("Participant registered: #{} {}", participant.id, participant.name);
        }
        RunType::Edit { id, from } => {
            let participant = cmd::edit(&ctx, &mut prompt, id, from.as_deref()).await?;
            println!("Participant updated: #{} {}", participant.id, participant.name);
        }
        RunType::Delete { id, yes } => {
            if cmd::delete(&ctx, &mut prompt, id, yes).await? {
                println!("Participant deleted.");
            } else {
                println!("Cancelled.");
            }
        }
        RunType::Photo(PhotoCommand::Upload { file, participant }) => {
            let path = cmd::upload_photo(&ctx, &file, participant).await?;
            println!("Photo stored as {}", path);
            if let Some(url) = ctx.client.photo_url(Some(&path)) {
                println!("{}", url);
            }
        }
        RunType::Photo(PhotoCommand::Url { path }) => match ctx.client.photo_url(Some(&path)) {
            Some(url) => println!("{}", url),
            None => println!("No photo."),
        },
        RunType::Pdf(PdfCommand::Participant { id, output }) => {
            let file = cmd::individual_pdf(&ctx, id, output).await?;
            println!("PDF saved to {}", file.display());
        }
        RunType::Pdf(PdfCommand::Complete { output }) => {
            let file = cmd::complete_pdf(&ctx, output).await?;
            println!("PDF saved to {}", file.display());
        }
        RunType::Logo(LogoCommand::Upload { file }) => {
            let path = cmd::upload_logo(&ctx, &file).await?;
            println!("Logo stored as {}", path);
        }
        RunType::Logo(LogoCommand::Get { output }) => {
            let file = cmd::get_logo(&ctx, output).await?;
            println!("Logo saved to {}", file.display());
        }
        RunType::Logo(LogoCommand::Delete { yes }) => {
            if cmd::delete_logo(&ctx, &mut prompt, yes).await? {
                println!("Logo removed.");
            } else {
                println!("Cancelled.");
            }
        }
        RunType::Health => {
            let status = ctx.client.health().await?;
            println!("API at {} is up: {}", ctx.client.base_url(), status);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Args, LogoCommand, PdfCommand, RunType};

    #[test]
    fn test_parse_commands() {
        let args = Args::parse_from(["ejcdesk", "list", "--search", "maria", "--page", "2"]);
        assert!(matches!(
            args.command,
            RunType::List { search: Some(s), page: 2 } if s == "maria"
        ));

        let args = Args::parse_from(["ejcdesk", "pdf", "complete", "--settings", "s.json"]);
        assert!(matches!(args.command, RunType::Pdf(PdfCommand::Complete { output: None })));
        assert_eq!(args.settings.unwrap().to_str(), Some("s.json"));

        let args = Args::parse_from(["ejcdesk", "logo", "delete", "-y"]);
        assert!(matches!(args.command, RunType::Logo(LogoCommand::Delete { yes: true })));

        assert!(Args::try_parse_from(["ejcdesk", "show"]).is_err());
    }
}
