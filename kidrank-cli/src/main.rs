mod config;
mod output;
mod store;

use chrono::Utc;
use clap::Parser;
use kidrank_core::{NewGift, NewItem, PreferenceEngine, SurveySession};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::store::{session_path, JsonFileStore};

pub fn bail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {msg}");
    std::process::exit(1);
}

#[derive(Parser)]
#[command(name = "kidrank", version, about = "Rank a child's interests from quick pairwise choices")]
struct Cli {
    /// Path to config file (default: ~/.config/kidrank/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding profile documents (overrides config)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Create a default config file at ~/.config/kidrank/config.toml
    Init,
    /// Add an interest for a child
    Add(AddArgs),
    /// Remove an interest
    Remove(RemoveArgs),
    /// Record a gift against an interest
    Gift(GiftArgs),
    /// Show tiers, ratings, and category leanings
    Show(ShowArgs),
    /// Run an interactive comparison survey
    Survey(SurveyArgs),
}

#[derive(Parser)]
struct AddArgs {
    /// Child the interest belongs to
    subject: String,

    /// Interest name (e.g. "Dinosaurs")
    name: String,

    /// Category (e.g. "animals", "videogames")
    #[arg(long)]
    category: Option<String>,

    #[arg(long)]
    subcategory: Option<String>,

    /// Free-form description
    #[arg(long)]
    details: Option<String>,

    /// Parent notes
    #[arg(long)]
    notes: Option<String>,

    /// Grant the small age-appropriate starting bonus
    #[arg(long)]
    age_appropriate: bool,
}

#[derive(Parser)]
struct RemoveArgs {
    subject: String,

    /// Interest name or id
    item: String,
}

#[derive(Parser)]
struct GiftArgs {
    subject: String,

    /// Interest name or id the gift relates to
    item: String,

    /// Gift name
    name: String,

    #[arg(long)]
    giver: Option<String>,

    #[arg(long)]
    occasion: Option<String>,

    /// How much the child liked it, 1-5
    #[arg(long)]
    reaction: Option<u8>,

    #[arg(long)]
    notes: Option<String>,
}

#[derive(Parser)]
struct ShowArgs {
    subject: String,

    /// Output JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct SurveyArgs {
    subject: String,

    /// Number of questions to ask
    #[arg(long)]
    pairs: Option<usize>,

    /// Discard any saved progress and start over
    #[arg(long)]
    fresh: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if matches!(cli.command, Commands::Init) {
        let path = config::create_default_config();
        println!("Created config at {}", path.display());
        println!("Edit it to set your data directory or survey length.");
        return;
    }

    let config_path = cli.config.clone().unwrap_or_else(config::config_path);
    let cfg = config::load_config(&config_path);

    let data_dir = cli
        .data_dir
        .clone()
        .or_else(|| cfg.data_dir.as_ref().map(PathBuf::from))
        .unwrap_or_else(config::default_data_dir);

    let store = JsonFileStore::new(data_dir.clone()).unwrap_or_else(|e| bail(e));
    let engine = PreferenceEngine::new(store);

    match cli.command {
        Commands::Init => unreachable!(),
        Commands::Add(args) => run_add(&engine, args),
        Commands::Remove(args) => run_remove(&engine, args),
        Commands::Gift(args) => run_gift(&engine, args),
        Commands::Show(args) => run_show(&engine, args),
        Commands::Survey(args) => {
            let count = args.pairs.or(cfg.pairs).unwrap_or(10);
            run_survey(&engine, &data_dir, &args.subject, count, args.fresh);
        }
    }
}

/// Resolve a user-supplied interest reference: exact name match first
/// (case-insensitive), then a raw id.
fn resolve_item(engine: &PreferenceEngine<JsonFileStore>, subject: &str, needle: &str) -> Uuid {
    let items = engine.items(subject).unwrap_or_else(|e| bail(e));

    if let Some(item) = items.iter().find(|i| i.name.eq_ignore_ascii_case(needle)) {
        return item.id;
    }
    if let Ok(id) = Uuid::parse_str(needle) {
        if items.iter().any(|i| i.id == id) {
            return id;
        }
    }
    bail(format!("No interest named \"{needle}\" for {subject}. Try `kidrank show {subject}`."));
}

fn run_add(engine: &PreferenceEngine<JsonFileStore>, args: AddArgs) {
    let item = engine
        .add_item(
            &args.subject,
            NewItem {
                name: args.name,
                category: args.category.unwrap_or_default(),
                subcategory: args.subcategory,
                details: args.details.unwrap_or_default(),
                notes: args.notes.unwrap_or_default(),
                age_appropriate: args.age_appropriate,
                ..NewItem::default()
            },
        )
        .unwrap_or_else(|e| bail(e));
    println!("Added \"{}\" ({}) at rating {}.", item.name, item.category, item.rating);
}

fn run_remove(engine: &PreferenceEngine<JsonFileStore>, args: RemoveArgs) {
    let id = resolve_item(engine, &args.subject, &args.item);
    engine.remove_item(&args.subject, id).unwrap_or_else(|e| bail(e));
    println!("Removed {}.", args.item);
}

fn run_gift(engine: &PreferenceEngine<JsonFileStore>, args: GiftArgs) {
    if let Some(reaction) = args.reaction {
        if !(1..=5).contains(&reaction) {
            bail("--reaction must be between 1 and 5");
        }
    }
    let id = resolve_item(engine, &args.subject, &args.item);
    let gift = engine
        .record_gift(
            &args.subject,
            id,
            NewGift {
                name: args.name,
                giver: args.giver,
                occasion: args.occasion,
                reaction: args.reaction,
                notes: args.notes,
                ..NewGift::default()
            },
        )
        .unwrap_or_else(|e| bail(e));
    println!("Recorded gift \"{}\".", gift.name);
}

fn run_show(engine: &PreferenceEngine<JsonFileStore>, args: ShowArgs) {
    let buckets = engine.classified(&args.subject).unwrap_or_else(|e| bail(e));
    let scores = engine.category_scores(&args.subject).unwrap_or_else(|e| bail(e));
    let rising = engine.rising_items(&args.subject).unwrap_or_else(|e| bail(e));

    if args.json {
        output::print_json(&buckets, &scores, &rising);
    } else {
        output::print_tiers(&buckets, &scores, &rising);
    }
}

fn save_progress(session: &SurveySession, path: &Path) {
    let blob = session
        .to_saved(Utc::now())
        .to_json()
        .unwrap_or_else(|e| bail(e));
    fs::write(path, blob)
        .unwrap_or_else(|e| bail(format!("Failed to save survey progress to {}: {e}", path.display())));
}

/// Load saved progress if any survives validation; otherwise start fresh.
fn load_or_start(
    engine: &PreferenceEngine<JsonFileStore>,
    session_file: &Path,
    subject: &str,
    count: usize,
    fresh: bool,
) -> SurveySession {
    if !fresh && session_file.exists() {
        let blob = fs::read_to_string(session_file)
            .unwrap_or_else(|e| bail(format!("Failed to read {}: {e}", session_file.display())));
        match engine.resume_session(&blob) {
            Ok(session) if session.subject_id == subject => {
                eprintln!(
                    "Resuming saved survey ({}/{} answered).",
                    session.current_index,
                    session.pairs.len(),
                );
                return session;
            }
            Ok(_) => eprintln!("Saved survey belongs to another child; starting fresh."),
            Err(e) => eprintln!("Discarding saved survey ({e}); starting fresh."),
        }
        let _ = fs::remove_file(session_file);
    }
    engine.start_session(subject, count).unwrap_or_else(|e| bail(e))
}

fn run_survey(
    engine: &PreferenceEngine<JsonFileStore>,
    data_dir: &Path,
    subject: &str,
    count: usize,
    fresh: bool,
) {
    let session_file = session_path(data_dir, subject);
    let mut session = load_or_start(engine, &session_file, subject, count, fresh);

    if session.pairs.is_empty() {
        println!("Not enough interests to compare — add at least two with `kidrank add`.");
        return;
    }

    let stdin = io::stdin();
    while let Some((a_id, b_id)) = session.current_pair() {
        let items = engine.items(subject).unwrap_or_else(|e| bail(e));
        let a = items.iter().find(|i| i.id == a_id);
        let b = items.iter().find(|i| i.id == b_id);
        let (a, b) = match (a, b) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                let _ = fs::remove_file(&session_file);
                bail("An interest in this survey was removed; start a new survey.");
            }
        };

        println!();
        println!("Question {}/{}", session.current_index + 1, session.pairs.len());
        println!("  1) {} ({})", a.name, a.category);
        println!("  2) {} ({})", b.name, b.category);
        print!("Which one does {subject} prefer? [1/2, s saves for later, q quits] ");
        io::stdout().flush().unwrap_or_else(|e| bail(e));

        let mut line = String::new();
        let read = stdin.lock().read_line(&mut line).unwrap_or_else(|e| bail(e));
        if read == 0 {
            // stdin closed; park the progress for next time.
            save_progress(&session, &session_file);
            eprintln!("\nInput ended. Progress saved.");
            return;
        }

        match line.trim() {
            "1" => {
                engine.answer(&mut session, a_id).unwrap_or_else(|e| bail(e));
                save_progress(&session, &session_file);
            }
            "2" => {
                engine.answer(&mut session, b_id).unwrap_or_else(|e| bail(e));
                save_progress(&session, &session_file);
            }
            "s" => {
                save_progress(&session, &session_file);
                println!("Progress saved. Run the survey again to continue where you left off.");
                return;
            }
            "q" => {
                let _ = fs::remove_file(&session_file);
                println!("Survey discarded.");
                return;
            }
            other => eprintln!("Unrecognized answer \"{other}\" — use 1, 2, s, or q."),
        }
    }

    let _ = fs::remove_file(&session_file);
    engine.complete_session(session).unwrap_or_else(|e| bail(e));

    println!();
    println!("Survey complete. Updated preferences:");
    println!();
    let buckets = engine.classified(subject).unwrap_or_else(|e| bail(e));
    let scores = engine.category_scores(subject).unwrap_or_else(|e| bail(e));
    let rising = engine.rising_items(subject).unwrap_or_else(|e| bail(e));
    output::print_tiers(&buckets, &scores, &rising);
}
