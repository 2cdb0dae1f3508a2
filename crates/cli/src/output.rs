//! Plain-text and JSON rendering.

use anyhow::Result;
use serde::Serialize;

use magnetkeeper_core::{
    rules::CardStatus, MagnetRecord, ParsedMagnet, Reachability, SearchLink, SourceCard,
    SpeedUpdate,
};

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

pub fn print_record_line(record: &MagnetRecord) {
    let tags = record
        .tags
        .iter()
        .map(|t| format!("#{}", t))
        .collect::<Vec<_>>()
        .join(" ");
    println!(
        "{}  {}  {}  {}",
        short_id(&record.id),
        record.created_at.format("%Y-%m-%d %H:%M"),
        record.display_title(),
        tags
    );
}

pub fn print_record(record: &MagnetRecord) {
    println!("id:        {}", record.id);
    println!("title:     {}", record.display_title());
    println!("info-hash: {}", record.info_hash);
    println!("magnet:    {}", record.magnet_uri);
    if !record.trackers.is_empty() {
        println!("trackers:");
        for tracker in &record.trackers {
            println!("  {}", tracker);
        }
    }
    if !record.tags.is_empty() {
        println!("tags:      {}", record.tags.join(", "));
    }
    if !record.note.is_empty() {
        println!("note:      {}", record.note);
    }
    println!("created:   {}", record.created_at.to_rfc3339());
    println!("updated:   {}", record.updated_at.to_rfc3339());
}

pub fn print_parsed(parsed: &ParsedMagnet) {
    println!(
        "display name: {}",
        parsed.display_name.as_deref().unwrap_or("-")
    );
    println!(
        "info-hash:    {}",
        if parsed.has_info_hash() {
            parsed.info_hash_upper()
        } else {
            "-".to_string()
        }
    );
    for tracker in &parsed.trackers {
        println!("tracker:      {}", tracker);
    }
    for (key, values) in &parsed.params {
        println!("{} = {}", key, values.join(" | "));
    }
}

fn print_link(link: &SearchLink) {
    let warn = if link.warn { " (may need a proxy)" } else { "" };
    println!("  [{}] {}: {}{}", link.kind.as_str(), link.label, link.href, warn);
}

pub fn print_card(index: usize, card: &SourceCard) {
    let desc = card.rule.desc.as_deref().unwrap_or("");
    println!("{}. {} ({}) {}", index + 1, card.rule.name, card.rule.category, desc);
    for link in &card.links {
        print_link(link);
    }
}

pub fn print_status(cards: &[SourceCard], status: &CardStatus) {
    let name = cards
        .get(status.index)
        .map(|c| c.rule.name.as_str())
        .unwrap_or("?");
    let mark = match status.reachability {
        Reachability::Reachable => "reachable",
        Reachability::Blocked => "blocked or timed out",
    };
    println!("{}. {}: {} ({})", status.index + 1, name, mark, status.target);
}

pub fn print_speed(update: &SpeedUpdate) {
    println!("{}  {}", update.info_hash, update.reading);
}
