use std::path::PathBuf;

use chrono::Datelike;
use tracing::{info, warn};

use slotbook::calendar::{grid_range, MonthView};
use slotbook::config::load_config;
use slotbook::model::today_in;
use slotbook::snapshot::Snapshot;

fn parse_month(raw: &str) -> Option<(i32, u32)> {
    let (y, m) = raw.trim().split_once('-')?;
    Some((y.parse().ok()?, m.parse().ok()?))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let catalog_path = std::env::var("SLOTBOOK_CATALOG").unwrap_or_else(|_| "./slots.toml".into());
    let bookings_path = std::env::var("SLOTBOOK_BOOKINGS").unwrap_or_else(|_| "./bookings.json".into());
    let format = std::env::var("SLOTBOOK_FORMAT").unwrap_or_else(|_| "text".into());

    let config = load_config(&PathBuf::from(&catalog_path))?;
    let (year, month) = match std::env::var("SLOTBOOK_MONTH").ok() {
        Some(raw) => parse_month(&raw).ok_or_else(|| format!("SLOTBOOK_MONTH must be YYYY-MM, got {raw}"))?,
        None => {
            let today = today_in(config.timezone);
            (today.year(), today.month())
        }
    };

    info!("catalog: {catalog_path} (version {}, {} slots)", config.version, config.catalog.len());
    info!("bookings: {bookings_path}");
    info!("timezone: {}", config.timezone.name());

    let json = std::fs::read_to_string(&bookings_path)?;
    let snapshot = Snapshot::from_json(&json, config.timezone)?;
    if !snapshot.rejected.is_empty() {
        warn!("{} booking record(s) rejected", snapshot.rejected.len());
    }

    let engine = config.engine();
    let view = MonthView::build(&engine, &snapshot.bookings, year, month)?;
    let overbooked = engine.overbooked(&snapshot.bookings, &grid_range(year, month)?)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("{year}-{month:02}");
    for cell in view.weeks.iter().flatten().filter(|c| c.in_month) {
        let slots: Vec<String> = cell
            .slots
            .iter()
            .map(|s| {
                format!(
                    "{} {}/{} {}",
                    s.occupancy.slot, s.occupancy.occupied, s.occupancy.capacity, s.severity
                )
            })
            .collect();
        println!("{}  {}", cell.date.format("%m-%d %a"), slots.join(" | "));
    }
    for rejected in &snapshot.rejected {
        println!("rejected {}: {}", rejected.id, rejected.error);
    }
    for day in &overbooked {
        println!(
            "OVERBOOKED {} on {}: {}/{}",
            day.slot, day.date, day.occupied, day.capacity
        );
    }
    Ok(())
}
