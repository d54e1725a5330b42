//! CLI tool for generating, validating and exporting slide decks.

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use deck_core::{
    Chat, ChatMessage, ChatStore, CommandProvider, Deck, DeckDraft, DeckGenerator, DirChatStore,
    GenerationRequest, StaticProvider, TextProvider,
};
use deck_pptx::{PptxReader, PptxRenderer, RenderedDeck, TempExport};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Largest attachment accepted by `generate`.
const MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;

/// Longest chat title derived from a prompt, in characters.
const CHAT_TITLE_CHARS: usize = 50;

/// Title for chats started from a blank prompt.
const DEFAULT_CHAT_TITLE: &str = "New Presentation";

/// Generate slide decks from prompts and export them as PowerPoint files.
#[derive(Parser, Debug)]
#[command(name = "deckgen")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask a provider for a deck and render it
    Generate {
        /// What the presentation should be about
        prompt: String,

        /// Text file whose content is appended to the prompt
        #[arg(long)]
        attach: Option<PathBuf>,

        /// Use a saved provider reply instead of calling a provider
        #[arg(long)]
        response: Option<PathBuf>,

        /// Command that reads a prompt on stdin and prints a reply
        #[arg(long, env = "DECKGEN_PROVIDER_CMD")]
        provider_cmd: Option<String>,

        #[command(flatten)]
        output: OutputArgs,

        /// Record the exchange in this chat history directory
        #[arg(long, env = "DECKGEN_CHAT_DIR")]
        chat_dir: Option<PathBuf>,

        /// Owner of the chat history
        #[arg(long, env = "DECKGEN_OWNER", default_value = "local")]
        owner: String,

        /// Continue an existing chat instead of starting a new one
        #[arg(long)]
        chat_id: Option<String>,
    },

    /// Normalize a raw provider reply and print the candidate deck
    Normalize {
        /// Reply file, or `-` for stdin
        input: PathBuf,
    },

    /// Validate a deck JSON file
    Validate {
        /// Deck JSON file
        deck: PathBuf,
    },

    /// Render a deck JSON file to PPTX
    Render {
        /// Deck JSON file
        deck: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Replace the bullets of one slide and print the edited deck
    Edit {
        /// Deck JSON file
        deck: PathBuf,

        /// Slide to edit (1-based, not counting the title slide)
        #[arg(short, long)]
        slide: usize,

        /// New bullets, one per line
        #[arg(long, conflicts_with = "content_file", required_unless_present = "content_file")]
        content: Option<String>,

        /// File holding the new bullets, one per line
        #[arg(long)]
        content_file: Option<PathBuf>,
    },

    /// List the slides of a PPTX file
    Inspect {
        /// PPTX file
        input: PathBuf,
    },

    /// Browse saved chats
    History {
        #[command(subcommand)]
        action: HistoryAction,

        /// Chat history directory
        #[arg(long, env = "DECKGEN_CHAT_DIR", global = true)]
        chat_dir: Option<PathBuf>,

        /// Owner of the chat history
        #[arg(long, env = "DECKGEN_OWNER", default_value = "local", global = true)]
        owner: String,
    },
}

#[derive(clap::Args, Debug)]
struct OutputArgs {
    /// Output directory (default: current directory)
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Date shown on the title slide, YYYY-MM-DD (default: today)
    #[arg(long)]
    date: Option<NaiveDate>,
}

#[derive(Subcommand, Debug)]
enum HistoryAction {
    /// List chats, most recent first
    List,
    /// Print one chat as JSON
    Show { chat_id: String },
    /// Delete one chat
    Delete { chat_id: String },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match args.command {
        Command::Generate {
            prompt,
            attach,
            response,
            provider_cmd,
            output,
            chat_dir,
            owner,
            chat_id,
        } => {
            let provider = select_provider(response.as_deref(), provider_cmd.as_deref())?;
            let mut request = GenerationRequest::new(prompt.as_str());
            if let Some(path) = &attach {
                request = request.with_attachment(read_attachment(path)?);
            }
            let chat = chat_dir.map(|dir| (DirChatStore::new(dir), owner.clone(), chat_id));

            generate(provider, &request, &output, &owner, chat)
        }
        Command::Normalize { input } => {
            let raw = read_input(&input)?;
            let draft = deck_core::ResponseNormalizer::new().normalize(&raw);
            println!("{}", serde_json::to_string_pretty(draft.as_value())?);
            Ok(())
        }
        Command::Validate { deck } => {
            let draft = load_draft(&deck)?;
            let report = draft.validate();
            if !report.is_valid() {
                for error in &report.errors {
                    println!("{}", error);
                }
                bail!("{} is not a valid deck", deck.display());
            }
            println!("valid");
            Ok(())
        }
        Command::Render { deck, output } => {
            let deck = load_deck(&deck)?;
            let path = export(&deck, &output, None)?;
            println!("{}", path.display());
            Ok(())
        }
        Command::Edit {
            deck,
            slide,
            content,
            content_file,
        } => {
            let text = match (content, content_file) {
                (Some(text), _) => text,
                (None, Some(path)) => fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                (None, None) => bail!("--content or --content-file is required"),
            };
            if slide == 0 {
                bail!("Slides are numbered from 1");
            }

            let edited = load_deck(&deck)?.with_slide_content(slide - 1, &text)?;
            println!("{}", serde_json::to_string_pretty(&edited)?);
            Ok(())
        }
        Command::Inspect { input } => inspect(&input),
        Command::History {
            action,
            chat_dir,
            owner,
        } => {
            let dir = chat_dir.context("--chat-dir or DECKGEN_CHAT_DIR is required")?;
            history(DirChatStore::new(dir), &owner, action)
        }
    }
}

/// Pick the provider for `generate`: a saved reply wins over a command.
fn select_provider(response: Option<&Path>, provider_cmd: Option<&str>) -> Result<Box<dyn TextProvider>> {
    if let Some(path) = response {
        let reply = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        return Ok(Box::new(StaticProvider::new(reply)));
    }

    match provider_cmd.and_then(CommandProvider::from_command_line) {
        Some(provider) => Ok(Box::new(provider)),
        None => bail!("No provider configured: pass --response or --provider-cmd (or set DECKGEN_PROVIDER_CMD)"),
    }
}

/// Read an attachment as text, refusing oversized files.
fn read_attachment(path: &Path) -> Result<String> {
    let size = fs::metadata(path)
        .with_context(|| format!("Failed to open {}", path.display()))?
        .len();
    if size > MAX_ATTACHMENT_BYTES {
        bail!(
            "{} is too large ({} bytes, max {} bytes)",
            path.display(),
            size,
            MAX_ATTACHMENT_BYTES
        );
    }

    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn generate(
    provider: Box<dyn TextProvider>,
    request: &GenerationRequest,
    output: &OutputArgs,
    owner: &str,
    chat: Option<(DirChatStore, String, Option<String>)>,
) -> Result<()> {
    let result = DeckGenerator::new(provider)
        .generate(request)
        .map_err(anyhow::Error::from)
        .and_then(|draft| {
            let report = draft.validate();
            if !report.is_valid() {
                bail!("Generated deck is invalid: {}", report.errors.join("; "));
            }
            Ok(draft.into_deck()?)
        });

    if let Some((mut store, owner, chat_id)) = chat {
        record_exchange(&mut store, &owner, chat_id, &request.prompt, &result)?;
    }

    let deck = result?;
    log::debug!("Generated '{}' with {} slides", deck.title, deck.slides.len());

    let path = export(&deck, output, Some(owner))?;
    println!("{}", path.display());
    Ok(())
}

/// Append the prompt and its outcome to a chat, creating the chat if needed.
fn record_exchange(
    store: &mut DirChatStore,
    owner: &str,
    chat_id: Option<String>,
    prompt: &str,
    result: &Result<Deck>,
) -> Result<()> {
    let mut chat = match chat_id {
        Some(id) => store
            .get(owner, &id)
            .with_context(|| format!("Failed to load chat {}", id))?,
        None => {
            let id = Utc::now().format("%Y%m%d%H%M%S%3f").to_string();
            Chat::new(owner, id, chat_title(prompt))
        }
    };

    chat.push(ChatMessage::user(prompt));
    chat.push(match result {
        Ok(deck) => ChatMessage::assistant_deck(format!("Created \"{}\"", deck.title), deck.clone()),
        Err(e) => ChatMessage::assistant_error(e.to_string()),
    });

    let saved = store.save(chat).context("Failed to save chat")?;
    eprintln!("Chat: {}", saved.chat_id);
    Ok(())
}

/// Title for a new chat: the start of the prompt.
fn chat_title(prompt: &str) -> String {
    let title: String = prompt.trim().chars().take(CHAT_TITLE_CHARS).collect();
    if title.is_empty() {
        DEFAULT_CHAT_TITLE.to_string()
    } else {
        title
    }
}

/// Render `deck`, stage it in the output directory and move it into place.
fn export(deck: &Deck, output: &OutputArgs, author: Option<&str>) -> Result<PathBuf> {
    let mut renderer = PptxRenderer::new();
    if let Some(date) = output.date {
        renderer = renderer.with_date(date);
    }
    if let Some(author) = author {
        renderer = renderer.with_author(author);
    }
    let rendered: RenderedDeck = renderer.render_named(deck)?;

    fs::create_dir_all(&output.output)
        .with_context(|| format!("Failed to create output directory: {}", output.output.display()))?;

    let staged = TempExport::create(&output.output, &rendered)?;
    let dest = output.output.join(staged.file_name());
    let path = staged
        .persist(&dest)
        .with_context(|| format!("Failed to write {}", dest.display()))?;
    Ok(path)
}

fn inspect(path: &Path) -> Result<()> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let outlines = PptxReader::new().read(BufReader::new(file))?;

    for outline in outlines {
        println!("--- Slide {} ---", outline.number);
        for paragraph in &outline.paragraphs {
            println!("{}", paragraph);
        }
        if let Some(notes) = &outline.notes {
            println!("[notes] {}", notes);
        }
    }
    Ok(())
}

fn history(mut store: DirChatStore, owner: &str, action: HistoryAction) -> Result<()> {
    match action {
        HistoryAction::List => {
            for chat in store.list(owner)? {
                println!(
                    "{}\t{}\t{} messages\t{}",
                    chat.chat_id,
                    chat.updated_at.format("%Y-%m-%d %H:%M"),
                    chat.messages.len(),
                    chat.title
                );
            }
        }
        HistoryAction::Show { chat_id } => {
            let chat = store.get(owner, &chat_id)?;
            println!("{}", serde_json::to_string_pretty(&chat)?);
        }
        HistoryAction::Delete { chat_id } => {
            store.delete(owner, &chat_id)?;
            eprintln!("Deleted chat {}", chat_id);
        }
    }
    Ok(())
}

/// Read a file, or stdin for `-`.
fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(text);
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn load_draft(path: &Path) -> Result<DeckDraft> {
    let text = read_input(path)?;
    DeckDraft::from_json(&text).with_context(|| format!("{} is not JSON", path.display()))
}

fn load_deck(path: &Path) -> Result<Deck> {
    Ok(load_draft(path)?.into_deck()?)
}
