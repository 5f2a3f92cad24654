//! Real-time Annotation CLI Application
//!
//! Command-line front end of the rt-annotate-engine library. It adds:
//! - Interactive annotation in the terminal (raw-mode keys, live display)
//! - External player control through configured commands
//! - Management of events, key bindings and bookmarks
//! - Statistics and timestamp rescaling

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use regex::Regex;
use rt_annotate_engine::{
    run_session, PlayerSync, SessionRequest, Store, StoreFile, StoreStats, SystemClock,
    TimeValue,
};
use std::fs;
use std::path::PathBuf;

mod config;
mod player;
mod terminal;

use config::AppConfig;

/// Real-time annotation - annotate recordings with single keystrokes
#[derive(Parser, Debug)]
#[command(name = "rt-annotate")]
#[command(about = "Annotate events in real time with single keystrokes", long_about = None)]
#[command(version)]
struct Args {
    /// Annotation file (default: annotation_file from the configuration)
    #[arg(short, long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Annotate an event in real time
    Annotate {
        /// Event to annotate (created if needed)
        #[arg(required_unless_present = "bookmark")]
        event: Option<String>,

        /// Start time (S, M:S or H:M:S); default: where the last review stopped
        #[arg(
            long,
            value_name = "TIME",
            conflicts_with = "bookmark",
            allow_hyphen_values = true
        )]
        at: Option<TimeValue>,

        /// Resume from a bookmark
        #[arg(long, value_name = "NAME")]
        bookmark: Option<String>,
    },
    /// Load key bindings from a key-definition file
    LoadKeys {
        /// Lines of "<key> <label> (<help>)"
        path: PathBuf,
    },
    /// Show the current key bindings
    Keys,
    /// Show every meaning each key ever had
    KeyHistory,
    /// List events
    Events {
        /// Only events whose name matches this regular expression
        pattern: Option<String>,
    },
    /// Delete an event and its annotations
    DeleteEvent { event: String },
    /// Rename an event (bookmarks follow)
    RenameEvent { from: String, to: String },
    /// Show or set the note of an event
    Note {
        event: String,
        /// New note; omit to show the current one
        text: Option<String>,
    },
    /// Manage bookmarks
    Bookmark {
        #[command(subcommand)]
        action: BookmarkAction,
    },
    /// Show statistics over all events
    Stats,
    /// Rescale timestamps: t -> origin + (t - origin) * factor
    Rescale {
        /// Only this event (default: all events)
        #[arg(long)]
        event: Option<String>,

        #[arg(
            long,
            value_name = "TIME",
            default_value = "1:00:00",
            allow_hyphen_values = true
        )]
        origin: TimeValue,

        #[arg(long, default_value_t = 2.0)]
        factor: f64,
    },
}

#[derive(Subcommand, Debug)]
enum BookmarkAction {
    /// Set (or move) a bookmark
    Set {
        name: String,
        event: String,
        /// Time in the event; may be negative (before the zero point)
        #[arg(allow_hyphen_values = true)]
        time: TimeValue,
    },
    /// Show where a bookmark points
    Load { name: String },
    /// Delete a bookmark
    Delete { name: String },
    /// List bookmarks
    List,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Real-time annotation CLI v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Using engine library v{}", rt_annotate_engine::VERSION);

    let config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    let Some(path) = args.file.clone().or_else(|| config.annotation_file.clone()) else {
        bail!("No annotation file given (use --file or annotation_file in the configuration)");
    };

    // The lock is held until `file` is dropped, after the final save
    let (file, mut store) = StoreFile::open(&path)
        .with_context(|| format!("Failed to open annotation file: {:?}", path))?;

    let modified = run_command(&args.command, &config, &file, &mut store)?;
    if modified {
        file.save(&store)
            .with_context(|| format!("Failed to save annotation file: {:?}", path))?;
    }

    Ok(())
}

/// Execute a subcommand; returns true if the store must be saved
fn run_command(
    command: &Command,
    config: &AppConfig,
    file: &StoreFile,
    store: &mut Store,
) -> Result<bool> {
    match command {
        Command::Annotate {
            event,
            at,
            bookmark,
        } => {
            annotate(config, file, store, event.as_deref(), *at, bookmark.as_deref())?;
            // Saved by the session
            Ok(false)
        }
        Command::LoadKeys { path } => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read key definitions: {:?}", path))?;
            store
                .load_keys(&text)
                .with_context(|| format!("Invalid key definitions in {:?}", path))?;
            print_keys(store);
            Ok(true)
        }
        Command::Keys => {
            print_keys(store);
            Ok(false)
        }
        Command::KeyHistory => {
            print_key_history(store);
            Ok(false)
        }
        Command::Events { pattern } => {
            let filter = pattern
                .as_deref()
                .map(Regex::new)
                .transpose()
                .context("Invalid event name pattern")?;
            for summary in store.list_events(filter.as_ref()) {
                let note = if summary.has_note { "  (note)" } else { "" };
                println!("{}  {} annotations{}", summary.name, summary.num_annotations, note);
            }
            Ok(false)
        }
        Command::DeleteEvent { event } => {
            let deleted = store.delete_event(event)?;
            println!("Deleted {} ({} annotations)", event, deleted.annotations.len());
            Ok(true)
        }
        Command::RenameEvent { from, to } => {
            store.rename_event(from, to)?;
            println!("Renamed {} to {}", from, to);
            Ok(true)
        }
        Command::Note { event, text } => match text {
            Some(text) => {
                store.set_note(event, text.as_str())?;
                Ok(true)
            }
            None => {
                let Some(found) = store.event(event) else {
                    bail!("No event named {}", event);
                };
                println!("{}", found.note);
                Ok(false)
            }
        },
        Command::Bookmark { action } => bookmark(store, action),
        Command::Stats => {
            print_stats(&StoreStats::of(store));
            Ok(false)
        }
        Command::Rescale {
            event,
            origin,
            factor,
        } => {
            let names: Vec<String> = match event {
                Some(name) => vec![name.clone()],
                None => store.events().map(|(name, _)| name.to_string()).collect(),
            };
            for name in &names {
                let Some(found) = store.event_mut(name) else {
                    bail!("No event named {}", name);
                };
                found.annotations.rescale(*origin, *factor)?;
            }
            println!(
                "Rescaled {} events around {} by {}",
                names.len(),
                origin,
                factor
            );
            Ok(true)
        }
    }
}

/// Run an interactive session in the terminal
fn annotate(
    config: &AppConfig,
    file: &StoreFile,
    store: &mut Store,
    event: Option<&str>,
    at: Option<TimeValue>,
    bookmark: Option<&str>,
) -> Result<()> {
    let (event, start) = match bookmark {
        Some(name) => {
            let (event, time) = store.load_bookmark(name)?;
            (event, Some(time))
        }
        None => match event {
            Some(event) => (event.to_string(), at),
            None => bail!("No event given"),
        },
    };

    if store.key_assignments.is_empty() {
        log::warn!("No keys are bound yet; use load-keys first");
    }
    let legend: Vec<String> = store
        .key_assignments
        .iter()
        .filter_map(|(key, index)| {
            store
                .meaning_history
                .get(index)
                .map(|meaning| format!("{}  {}", key, meaning.label))
        })
        .collect();

    let mut request = SessionRequest::new(event).with_config(config.process.clone());
    if let Some(start) = start {
        request = request.with_start(start);
    }

    let mut player = player::build_player(&config.player);
    let player: &mut dyn PlayerSync = player.as_mut();
    let outcome = {
        let _raw = terminal::RawTerminal::enter().context("Failed to set up the terminal")?;
        run_session(
            store,
            file,
            &request,
            Some(player),
            &mut terminal::TerminalKeys,
            &mut terminal::TerminalDisplay::new(legend),
            &SystemClock,
        )?
    };

    println!(
        "{}: {} to {}, {} annotations added",
        request.event, outcome.started_at, outcome.stopped_at, outcome.added
    );
    for err in &outcome.player_errors {
        eprintln!("Player error: {}", err);
    }
    Ok(())
}

fn bookmark(store: &mut Store, action: &BookmarkAction) -> Result<bool> {
    match action {
        BookmarkAction::Set { name, event, time } => {
            if store.event(event).is_none() {
                bail!("No event named {}", event);
            }
            store.bookmarks.set(name.as_str(), event.as_str(), *time);
            Ok(true)
        }
        BookmarkAction::Load { name } => {
            let (event, time) = store.load_bookmark(name)?;
            println!("{} {}", event, time);
            Ok(false)
        }
        BookmarkAction::Delete { name } => {
            if store.bookmarks.delete(name).is_none() {
                log::warn!("No bookmark named {}", name);
            }
            Ok(true)
        }
        BookmarkAction::List => {
            for (name, bookmark) in store.bookmarks.iter() {
                println!("{}  {} {}", name, bookmark.event, bookmark.timestamp);
            }
            Ok(false)
        }
    }
}

fn print_keys(store: &Store) {
    for (key, index) in store.key_assignments.iter() {
        match store.meaning_history.get(index) {
            Some(meaning) if meaning.help.is_empty() => println!("{}  {}", key, meaning.label),
            Some(meaning) => println!("{}  {} ({})", key, meaning.label, meaning.help),
            None => println!("{}  ?", key),
        }
    }
}

fn print_key_history(store: &Store) {
    for (key, meanings) in store.meaning_history.by_key() {
        println!("{}", key);
        for (index, meaning) in meanings {
            let current = if store.key_assignments.get(key) == Some(index) {
                "*"
            } else {
                " "
            };
            println!("  {} #{} {} {}", current, index, meaning.label, meaning.help);
        }
    }
}

fn print_stats(stats: &StoreStats) {
    println!("Events:      {}", stats.events);
    println!("Annotations: {}", stats.annotations);
    println!(
        "Annotated:   {}",
        TimeValue::from_seconds(stats.annotated_time)
    );
    println!(
        "Per event:   {:.1} annotations, {}",
        stats.annotations_per_event(),
        TimeValue::from_seconds(stats.time_per_event())
    );
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_events() -> Store {
        let mut store = Store::new();
        store.load_keys("i inspired").unwrap();
        let (event, keys, _) = store.process_parts("take1");
        event
            .annotations
            .add(TimeValue::from_hms(1, 0, 10.0), 'i', keys)
            .unwrap();
        store
    }

    #[test]
    fn test_parse_arguments() {
        let args = Args::try_parse_from([
            "rt-annotate",
            "-f",
            "notes.json",
            "annotate",
            "take1",
            "--at",
            "1:30",
        ])
        .unwrap();
        assert_eq!(args.file, Some(PathBuf::from("notes.json")));
        match args.command {
            Command::Annotate { event, at, bookmark } => {
                assert_eq!(event.as_deref(), Some("take1"));
                assert_eq!(at, Some(TimeValue::from_seconds(90.0)));
                assert!(bookmark.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }

        assert!(Args::try_parse_from(["rt-annotate", "annotate"]).is_err());
        assert!(Args::try_parse_from(["rt-annotate", "annotate", "--bookmark", "WIP"]).is_ok());
        assert!(Args::try_parse_from(["rt-annotate", "annotate", "x", "--at", "soon"]).is_err());
    }

    #[test]
    fn test_negative_time_arguments() {
        for text in ["-5", "-0:05", "-1:59:55"] {
            let args = Args::try_parse_from(["rt-annotate", "annotate", "take1", "--at", text])
                .unwrap();
            match args.command {
                Command::Annotate { at, .. } => {
                    assert_eq!(at, Some(TimeValue::from_seconds(-5.0)), "--at {}", text)
                }
                other => panic!("unexpected command {:?}", other),
            }
        }

        let args =
            Args::try_parse_from(["rt-annotate", "bookmark", "set", "WIP", "take1", "-5"]).unwrap();
        match args.command {
            Command::Bookmark {
                action: BookmarkAction::Set { name, event, time },
            } => {
                assert_eq!((name.as_str(), event.as_str()), ("WIP", "take1"));
                assert_eq!(time, TimeValue::from_seconds(-5.0));
            }
            other => panic!("unexpected command {:?}", other),
        }

        let args =
            Args::try_parse_from(["rt-annotate", "rescale", "--origin", "-1:00:00"]).unwrap();
        match args.command {
            Command::Rescale { origin, .. } => {
                assert_eq!(origin, TimeValue::from_seconds(-3600.0))
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_rescale_command() {
        let args = Args::try_parse_from(["rt-annotate", "rescale"]).unwrap();
        let config = AppConfig::default();
        let dir = tempfile::tempdir().unwrap();
        let (file, _) = StoreFile::open(dir.path().join("a.json")).unwrap();
        let mut store = store_with_events();

        assert!(run_command(&args.command, &config, &file, &mut store).unwrap());
        let annotation = store.event("take1").unwrap().annotations.get(0).unwrap();
        assert_eq!(annotation.timestamp, TimeValue::from_hms(1, 0, 20.0));
    }

    #[test]
    fn test_bookmark_needs_existing_event() {
        let mut store = store_with_events();
        let set = |event: &str| BookmarkAction::Set {
            name: "WIP".to_string(),
            event: event.to_string(),
            time: TimeValue::ZERO,
        };
        assert!(bookmark(&mut store, &set("missing")).is_err());
        assert!(bookmark(&mut store, &set("take1")).unwrap());
        assert_eq!(store.bookmarks.len(), 1);
    }
}
