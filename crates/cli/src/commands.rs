//! CLI command implementations

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use futures::StreamExt;
use serde_json::json;

use magnetkeeper_core::{
    parse_magnet, speed::SanitizedClientSettings, uniq_tags, ClientKind, ClientSettings,
    Confirmation, NewRecord, RecordEdit, RecordFilter, SortOrder,
};

use crate::app::App;
use crate::output;

/// Global flags that shape command behaviour.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    pub json: bool,
    pub yes: bool,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Bookmark a magnet link
    Add {
        /// Magnet URI
        magnet: String,
        /// Title (defaults to the magnet's display name)
        #[arg(short, long, default_value = "")]
        title: String,
        /// Tags separated by commas or spaces
        #[arg(long, default_value = "")]
        tags: String,
        /// Free-text note
        #[arg(short, long, default_value = "")]
        note: String,
    },
    /// List bookmarks
    List {
        /// Case-insensitive text filter
        #[arg(short, long)]
        query: Option<String>,
        /// Required tags (all must match)
        #[arg(long)]
        tags: Option<String>,
        /// created_desc, created_asc, title_asc or title_desc
        #[arg(short, long, default_value = "created_desc")]
        sort: SortOrder,
    },
    /// Show one bookmark
    Show {
        /// Bookmark id
        id: String,
    },
    /// Change fields of a bookmark
    Edit {
        /// Bookmark id
        id: String,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        magnet: Option<String>,
        /// Replaces all tags
        #[arg(long)]
        tags: Option<String>,
        #[arg(short, long)]
        note: Option<String>,
    },
    /// Delete a bookmark
    Delete {
        /// Bookmark id
        id: String,
    },
    /// Delete every bookmark
    Clear,
    /// Write all bookmarks as JSON
    Export {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Merge bookmarks from a JSON export
    Import {
        /// JSON file holding an array of bookmarks
        file: PathBuf,
    },
    /// Decompose a magnet URI
    Parse {
        magnet: String,
    },
    /// Check a magnet URI against the active rule
    Validate {
        magnet: String,
    },
    /// Build search links for a keyword on every rule source
    Search {
        /// Keyword (words are joined with spaces)
        #[arg(required = true, num_args = 1..)]
        keyword: Vec<String>,
        /// Skip the reachability probes
        #[arg(long)]
        no_probe: bool,
    },
    /// Rule sources
    Rules {
        #[command(subcommand)]
        command: RulesCommand,
    },
    /// Live download rates from the configured torrent client
    Speed {
        /// Info-hashes to watch (all bookmarks when omitted)
        hashes: Vec<String>,
        /// Polling rounds before exiting
        #[arg(short, long, default_value = "1")]
        rounds: usize,
    },
    /// Stored settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
    /// Theme preference
    Theme {
        #[command(subcommand)]
        command: ThemeCommand,
    },
    /// Search history
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

#[derive(Subcommand)]
pub enum RulesCommand {
    /// List rule sources (cached after the first load)
    List,
    /// Drop the cached list and fetch it again
    Reload,
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Show settings (the client token is hidden)
    Show,
    /// Configure the torrent client used for speed lookups
    Client {
        /// qb or transmission
        #[arg(short, long, default_value = "qb")]
        kind: ClientKind,
        /// API base URL (qb) or RPC URL (transmission); empty disables
        #[arg(short, long, default_value = "")]
        url: String,
        /// Bearer token (qb) or user:password (transmission)
        #[arg(short, long, default_value = "")]
        token: String,
    },
    /// Replace the custom magnet validation patterns
    Patterns {
        /// Regular expressions; none restores the default rule
        patterns: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum ThemeCommand {
    Show,
    /// Cycle system -> dark -> light -> system
    Toggle,
}

#[derive(Subcommand)]
pub enum HistoryCommand {
    Show,
    Clear,
}

/// Handle the CLI command
pub async fn handle_command(app: &App, command: Commands, options: Options) -> Result<()> {
    match command {
        Commands::Add {
            magnet,
            title,
            tags,
            note,
        } => add(app, NewRecord { title, magnet_uri: magnet, tags, note }, options),
        Commands::List { query, tags, sort } => list(app, query, tags, sort, options),
        Commands::Show { id } => show(app, &id, options),
        Commands::Edit {
            id,
            title,
            magnet,
            tags,
            note,
        } => edit(
            app,
            &id,
            RecordEdit {
                title,
                magnet_uri: magnet,
                tags,
                note,
            },
            options,
        ),
        Commands::Delete { id } => delete(app, &id, options),
        Commands::Clear => clear(app, options),
        Commands::Export { output } => export(app, output),
        Commands::Import { file } => import(app, &file, options),
        Commands::Parse { magnet } => parse(&magnet, options),
        Commands::Validate { magnet } => validate(app, &magnet, options),
        Commands::Search { keyword, no_probe } => {
            search(app, &keyword.join(" "), !no_probe, options).await
        }
        Commands::Rules { command } => rules(app, command, options).await,
        Commands::Speed { hashes, rounds } => speed(app, hashes, rounds, options).await,
        Commands::Settings { command } => settings(app, command, options),
        Commands::Theme { command } => theme(app, command, options),
        Commands::History { command } => history(app, command, options),
    }
}

/// Ask on stderr unless `--yes` was given.
fn confirm(prompt: &str, options: Options) -> Result<Confirmation> {
    if options.yes {
        return Ok(Confirmation::Confirmed);
    }
    eprint!("{} [y/N] ", prompt);
    io::stderr().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    let answer = answer.trim().to_lowercase();
    Ok(Confirmation::from(answer == "y" || answer == "yes"))
}

/// Resolve a full id or a unique prefix of one.
fn resolve_id(app: &App, id: &str) -> Result<String> {
    let matches: Vec<String> = app
        .catalog
        .records()?
        .into_iter()
        .map(|r| r.id)
        .filter(|candidate| candidate == id || candidate.starts_with(id))
        .collect();
    if let Some(exact) = matches.iter().find(|candidate| *candidate == id) {
        return Ok(exact.clone());
    }
    match matches.len() {
        0 => bail!("No bookmark with id {}", id),
        1 => Ok(matches[0].clone()),
        n => bail!("Id prefix {} matches {} bookmarks", id, n),
    }
}

fn add(app: &App, input: NewRecord, options: Options) -> Result<()> {
    let record = app.catalog.add(input, &app.validator()?)?;
    if options.json {
        output::print_json(&record)
    } else {
        println!("Added {} ({})", record.display_title(), record.id);
        Ok(())
    }
}

fn list(
    app: &App,
    query: Option<String>,
    tags: Option<String>,
    sort: SortOrder,
    options: Options,
) -> Result<()> {
    let filter = RecordFilter {
        query,
        tags: tags.as_deref().map(uniq_tags).unwrap_or_default(),
        sort,
    };
    let records = app.catalog.list(&filter)?;
    if options.json {
        return output::print_json(&records);
    }
    if records.is_empty() {
        println!("No bookmarks.");
    }
    for record in &records {
        output::print_record_line(record);
    }
    Ok(())
}

fn show(app: &App, id: &str, options: Options) -> Result<()> {
    let record = app.catalog.get(&resolve_id(app, id)?)?;
    if options.json {
        return output::print_json(&record);
    }
    output::print_record(&record);
    Ok(())
}

fn edit(app: &App, id: &str, edit: RecordEdit, options: Options) -> Result<()> {
    if edit.is_empty() {
        bail!("Nothing to change: pass --title, --magnet, --tags or --note");
    }
    let record = app
        .catalog
        .edit(&resolve_id(app, id)?, edit, &app.validator()?)?;
    if options.json {
        output::print_json(&record)
    } else {
        println!("Updated {}", record.id);
        Ok(())
    }
}

fn delete(app: &App, id: &str, options: Options) -> Result<()> {
    let id = resolve_id(app, id)?;
    let record = app.catalog.get(&id)?;
    let confirmation = confirm(&format!("Delete \"{}\"?", record.display_title()), options)?;
    app.catalog.delete(&id, confirmation)?;
    println!("Deleted {}", id);
    Ok(())
}

fn clear(app: &App, options: Options) -> Result<()> {
    let confirmation = confirm("Delete ALL bookmarks?", options)?;
    let count = app.catalog.clear(confirmation)?;
    println!("Deleted {} bookmarks", count);
    Ok(())
}

fn export(app: &App, output: Option<PathBuf>) -> Result<()> {
    let body = app.catalog.export()?;
    match output {
        Some(path) => {
            std::fs::write(&path, body)
                .with_context(|| format!("Failed to write {:?}", path))?;
            eprintln!("Exported to {:?}", path);
        }
        None => println!("{}", body),
    }
    Ok(())
}

fn import(app: &App, file: &Path, options: Options) -> Result<()> {
    let body =
        std::fs::read_to_string(file).with_context(|| format!("Failed to read {:?}", file))?;
    let summary = app.catalog.import(&body, &app.validator()?)?;
    if options.json {
        return output::print_json(&summary);
    }
    println!(
        "Imported {} bookmarks ({} skipped)",
        summary.added, summary.skipped
    );
    Ok(())
}

fn parse(magnet: &str, options: Options) -> Result<()> {
    let parsed = parse_magnet(magnet);
    if options.json {
        return output::print_json(&parsed);
    }
    output::print_parsed(&parsed);
    Ok(())
}

fn validate(app: &App, magnet: &str, options: Options) -> Result<()> {
    let validator = app.validator()?;
    let valid = validator.is_valid(magnet.trim());
    if options.json {
        output::print_json(&json!({
            "valid": valid,
            "customPatterns": validator.uses_custom_patterns(),
        }))?;
    } else {
        println!("{}", if valid { "valid" } else { "invalid" });
    }
    if !valid {
        bail!("Magnet link does not match the active rule");
    }
    Ok(())
}

async fn search(app: &App, keyword: &str, probe: bool, options: Options) -> Result<()> {
    let search = app.search();
    let Some(outcome) = search.search(keyword).await else {
        bail!("Keyword is empty");
    };

    if !options.json {
        if outcome.rules_unavailable {
            eprintln!("Rule file unavailable: {}", search.loader().location());
        }
        for (index, card) in outcome.cards.iter().enumerate() {
            output::print_card(index, card);
        }
    }

    let mut statuses = Vec::new();
    if probe {
        let mut updates = search.probe_cards(&outcome.cards);
        while let Some(status) = updates.next().await {
            if !options.json {
                output::print_status(&outcome.cards, &status);
            }
            statuses.push(status);
        }
    }

    if options.json {
        statuses.sort_by_key(|s| s.index);
        output::print_json(&json!({
            "keyword": outcome.keyword,
            "rulesUnavailable": outcome.rules_unavailable,
            "cards": outcome.cards,
            "reachability": statuses,
        }))?;
    }
    Ok(())
}

async fn rules(app: &App, command: RulesCommand, options: Options) -> Result<()> {
    let loader = app.loader();
    if matches!(command, RulesCommand::Reload) {
        loader.invalidate();
    }

    let loaded = loader.load().await;
    if loaded.is_degraded() {
        eprintln!("Rule file unavailable: {}", loader.location());
    }
    let rules = loaded.unwrap_or_neutral();
    if options.json {
        return output::print_json(&rules);
    }
    for rule in &rules {
        println!("{} ({}): {}", rule.name, rule.category, rule.url);
    }
    Ok(())
}

async fn speed(app: &App, hashes: Vec<String>, rounds: usize, options: Options) -> Result<()> {
    let hashes: Vec<String> = if hashes.is_empty() {
        app.catalog
            .records()?
            .into_iter()
            .map(|r| r.info_hash)
            .filter(|h| !h.is_empty())
            .collect()
    } else {
        hashes
    };
    if hashes.is_empty() {
        println!("Nothing to watch.");
        return Ok(());
    }

    let monitor = app.speed_monitor()?;
    if !monitor.is_configured() {
        eprintln!("No torrent client configured; see `magnetkeeper settings client`");
    }

    let expected = hashes.len() * rounds.max(1);
    let mut updates = monitor.watch(hashes).await;
    let mut received = Vec::new();
    while received.len() < expected {
        let Some(update) = updates.recv().await else {
            break;
        };
        if !options.json {
            output::print_speed(&update);
        }
        received.push(update);
    }
    monitor.stop().await;

    if options.json {
        output::print_json(&received)?;
    }
    Ok(())
}

fn settings(app: &App, command: SettingsCommand, options: Options) -> Result<()> {
    match command {
        SettingsCommand::Show => {
            let client = app.preferences.client_settings()?;
            let patterns = app.preferences.custom_patterns()?;
            let theme = app.preferences.theme()?;
            let view = json!({
                "client": SanitizedClientSettings::from(&client),
                "customPatterns": patterns,
                "theme": theme,
                "config": app.config,
            });
            if options.json {
                return output::print_json(&view);
            }
            println!(
                "client:   {} {}{}",
                client.kind.as_str(),
                if client.is_configured() { client.url.as_str() } else { "(not configured)" },
                if client.token.is_empty() { "" } else { " (token set)" }
            );
            if patterns.is_empty() {
                println!("patterns: default rule");
            }
            for pattern in &patterns {
                println!("pattern:  {}", pattern);
            }
            println!("theme:    {}", theme.as_str());
            println!("rules:    {}", app.config.rules.location);
            Ok(())
        }
        SettingsCommand::Client { kind, url, token } => {
            let settings = ClientSettings { kind, url, token };
            app.preferences.set_client_settings(&settings)?;
            if settings.is_configured() {
                println!("Torrent client set to {} at {}", kind.as_str(), settings.url.trim());
            } else {
                println!("Torrent client disabled");
            }
            Ok(())
        }
        SettingsCommand::Patterns { patterns } => {
            let saved = app.preferences.set_custom_patterns(&patterns)?;
            if saved.is_empty() {
                println!("Using the default magnet rule");
            } else {
                println!("Saved {} custom patterns", saved.len());
            }
            Ok(())
        }
    }
}

fn theme(app: &App, command: ThemeCommand, options: Options) -> Result<()> {
    let theme = match command {
        ThemeCommand::Show => app.preferences.theme()?,
        ThemeCommand::Toggle => app.preferences.toggle_theme()?,
    };
    if options.json {
        return output::print_json(&theme);
    }
    println!("{}", theme.as_str());
    Ok(())
}

fn history(app: &App, command: HistoryCommand, options: Options) -> Result<()> {
    match command {
        HistoryCommand::Show => {
            let history = app.preferences.search_history()?;
            if options.json {
                return output::print_json(&history);
            }
            for keyword in &history {
                println!("{}", keyword);
            }
            Ok(())
        }
        HistoryCommand::Clear => {
            app.preferences.clear_search_history()?;
            println!("Search history cleared");
            Ok(())
        }
    }
}
