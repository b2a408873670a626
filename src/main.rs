//! brdedit: section-aware editing of markdown requirements documents.

use anyhow::Context;
use brdedit::{config, edit_plan, model, outline, parser, session, store};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "brdedit")]
#[command(about = "Section-aware editing of markdown requirements documents", long_about = None)]
struct Args {
    /// Configuration file (defaults to ./brdedit.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// SQLite database, overriding the configuration
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Print the sections of a markdown file as JSON
    Parse {
        /// Markdown file
        file: PathBuf,
    },
    /// Print the section tree of a markdown file
    Outline {
        /// Markdown file
        file: PathBuf,
    },
    /// Apply an edit plan JSON file to a markdown file
    Apply {
        /// Markdown file
        file: PathBuf,
        /// Edit plan in the planner's JSON shape
        #[arg(long)]
        plan: PathBuf,
        /// Overwrite the file instead of printing the result
        #[arg(long)]
        write: bool,
    },
    /// Store a document and summarize its sections
    Load {
        /// Markdown file
        file: PathBuf,
    },
    /// Replace a stored document's text
    Update {
        /// Document id
        id: i64,
        /// Markdown file with the new text
        file: PathBuf,
    },
    /// Ask the model to edit a stored document
    Edit {
        /// Document id
        id: i64,
        /// What to change
        #[arg(long, short)]
        prompt: String,
    },
    /// Regenerate the summary of one section
    Summarize {
        /// Document id
        id: i64,
        /// Section title
        #[arg(long)]
        section: String,
    },
    /// Print a stored document's outline with summaries
    Show {
        /// Document id
        id: i64,
    },
    /// Print a stored document's edit history
    History {
        /// Document id
        id: i64,
    },
}

type CliEditor = session::Editor<model::RetryingModel<model::CommandModel>, store::SqliteStore>;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("brdedit=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(editor_err) = e.downcast_ref::<brdedit::EditorError>() {
                eprintln!("{}: {}", editor_err.title(), editor_err.description());
            } else {
                eprintln!("Error: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut cfg = config::Config::load(args.config.as_deref())?;
    if let Some(db) = args.db {
        cfg.database_path = db.to_string_lossy().to_string();
    }

    match args.command {
        Cmd::Parse { file } => {
            let sections = parser::parse(&read(&file)?);
            println!("{}", serde_json::to_string_pretty(&sections)?);
        }
        Cmd::Outline { file } => {
            let sections = parser::parse(&read(&file)?);
            print!("{}", render(&sections, &cfg));
        }
        Cmd::Apply { file, plan, write } => {
            let text = read(&file)?;
            let plan = edit_plan::EditPlan::validate(&read(&plan)?)
                .with_context(|| format!("invalid edit plan {}", plan.display()))?;
            let patched = plan.apply(&text, &parser::parse(&text));
            for title in &patched.unmatched_titles {
                eprintln!("skipped unknown section: {title}");
            }
            if write {
                std::fs::write(&file, &patched.text)
                    .with_context(|| format!("failed to write {}", file.display()))?;
            } else {
                print!("{}", patched.text);
            }
        }
        Cmd::Load { file } => {
            let content = read(&file)?;
            let filename = file.file_name().map_or_else(
                || file.to_string_lossy().to_string(),
                |name| name.to_string_lossy().to_string(),
            );
            let mut editor = open_editor(&cfg)?;
            let session = editor.load_document(&content, &filename).await?;
            println!("document {}", session.document.id);
            print!("{}", render(&session.sections, &cfg));
        }
        Cmd::Update { id, file } => {
            let content = read(&file)?;
            let mut editor = open_editor(&cfg)?;
            let current = editor.open_session(store::DocumentId(id))?;
            let session = editor.update_document(&current, &content).await?;
            print!("{}", render(&session.sections, &cfg));
        }
        Cmd::Edit { id, prompt } => {
            let mut editor = open_editor(&cfg)?;
            let current = editor.open_session(store::DocumentId(id))?;
            let outcome = editor.request_edit(&current, &prompt).await?;
            for line in &outcome.change_summary {
                println!("- {line}");
            }
        }
        Cmd::Summarize { id, section } => {
            let mut editor = open_editor(&cfg)?;
            let current = editor.open_session(store::DocumentId(id))?;
            let session = editor.regenerate_summary(&current, &section).await?;
            print!("{}", render(&session.sections, &cfg));
        }
        Cmd::Show { id } => {
            let editor = open_editor(&cfg)?;
            let session = editor.open_session(store::DocumentId(id))?;
            println!("{} (document {})", session.document.filename, session.document.id);
            print!("{}", render(&session.sections, &cfg));
        }
        Cmd::History { id } => {
            let editor = open_editor(&cfg)?;
            for entry in editor.history(store::DocumentId(id))? {
                println!("{}  {}", entry.created_at, entry.prompt);
                for line in &entry.plan.summary_of_changes {
                    println!("    - {line}");
                }
            }
        }
    }

    Ok(())
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn render(sections: &[brdedit::Section], cfg: &config::Config) -> String {
    outline::render_outline(&outline::build_outline(sections), cfg.wrap_width)
}

fn open_editor(cfg: &config::Config) -> anyhow::Result<CliEditor> {
    let store = store::SqliteStore::open(&cfg.database_path)
        .with_context(|| format!("failed to open database {}", cfg.database_path))?;
    let model = model::RetryingModel::new(
        model::CommandModel::new(cfg.model_command.clone(), cfg.model_timeout()),
        cfg.retry_policy(),
    );
    Ok(session::Editor::new(model, store).with_summary_placeholder(cfg.summary_placeholder.clone()))
}
