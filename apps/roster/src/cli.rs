//! # CLI Commands
//!
//! One `cmd_*` function per subcommand. Each opens the database named by
//! `db_path` with the given backend (`"file"` or `"redb"`), performs one
//! operation, and prints the result to stdout.
//!
//! "today" is the local calendar date; timestamps are UTC.

use crate::api::{self, AppState, Clock};
use chrono::{Local, NaiveDate, Utc};
use roster_core::{
    Backend, ExportFormat, FileStore, Person, PersonField, PersonForm, PersonId, RedbStore,
    Registry, Statistics,
};
use std::fs;
use std::num::NonZeroU32;
use std::path::Path;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Open the registry stored at `db_path`, creating an empty one if missing.
pub fn open_registry(db_path: &Path, backend: &str) -> CliResult<Registry> {
    let backend: Backend = backend.parse()?;
    Ok(Registry::open(backend, db_path)?)
}

fn print_row(person: &Person, today: NaiveDate) {
    println!(
        "{:>5}  {:<30}  {}  {}  {}  {:>3}",
        person.id,
        person.full_name(),
        person.birth_date.format("%d/%m/%Y"),
        person.sex.code(),
        person.national_id.formatted(),
        person.age(today),
    );
}

fn print_list(people: &[Person], today: NaiveDate) {
    if people.is_empty() {
        println!("No people found.");
        return;
    }
    println!(
        "{:>5}  {:<30}  {:<10}  {}  {:<14}  {:>3}",
        "ID", "NAME", "BORN", "S", "NATIONAL ID", "AGE"
    );
    for person in people {
        print_row(person, today);
    }
}

fn print_person(person: &Person, today: NaiveDate) {
    println!("ID:           {}", person.id);
    println!("Given name:   {}", person.given_name);
    println!("Family name:  {}", person.family_name);
    println!("Birth date:   {}", person.birth_date.format("%d/%m/%Y"));
    println!("Sex:          {}", person.sex.label());
    println!("National ID:  {}", person.national_id.formatted());
    println!("Age:          {}", person.age(today));
    println!("Age bracket:  {}", person.age_bracket(today).label());
    println!("Created:      {}", person.created_at.to_rfc3339());
    println!("Updated:      {}", person.updated_at.to_rfc3339());
}

// =============================================================================
// DATABASE LIFECYCLE
// =============================================================================

/// Create an empty database. Refuses to overwrite unless `force` is set.
pub fn cmd_init(db_path: &Path, backend: &str, force: bool) -> CliResult {
    let backend: Backend = backend.parse()?;
    if db_path.exists() {
        if !force {
            return Err(format!(
                "database already exists at {} (use --force to overwrite)",
                db_path.display()
            )
            .into());
        }
        fs::remove_file(db_path)?;
    }

    match backend {
        Backend::File => FileStore::open(db_path)?.flush()?,
        Backend::Redb => drop(RedbStore::open(db_path)?),
    }
    tracing::info!(path = %db_path.display(), %backend, "database initialized");
    println!(
        "Initialized empty {backend} database at {}",
        db_path.display()
    );
    Ok(())
}

/// Load the demo data set, skipping people already registered.
pub fn cmd_seed(db_path: &Path, backend: &str) -> CliResult {
    let mut registry = open_registry(db_path, backend)?;
    let created = registry.seed(Utc::now())?;
    println!("Seeded {created} people ({} total)", registry.count()?);
    Ok(())
}

// =============================================================================
// RECORDS
// =============================================================================

pub fn cmd_add(db_path: &Path, backend: &str, form: &PersonForm) -> CliResult {
    let mut registry = open_registry(db_path, backend)?;
    let person = registry.create(form, Utc::now())?;
    println!("Created #{} {person}", person.id);
    Ok(())
}

/// List everyone, or the matches of a free-text query (name fragment or
/// 11-digit national ID).
pub fn cmd_list(db_path: &Path, backend: &str, query: Option<&str>) -> CliResult {
    let registry = open_registry(db_path, backend)?;
    let people = registry.search(query.unwrap_or_default())?;
    print_list(&people, today());
    Ok(())
}

pub fn cmd_show(db_path: &Path, backend: &str, id: u64) -> CliResult {
    let registry = open_registry(db_path, backend)?;
    let person = registry.get(PersonId(id))?;
    print_person(&person, today());
    Ok(())
}

/// Change one field; `field` accepts `given-name` or `given_name` spellings.
pub fn cmd_edit(db_path: &Path, backend: &str, id: u64, field: &str, value: &str) -> CliResult {
    let field: PersonField = field.parse()?;
    let mut registry = open_registry(db_path, backend)?;
    let person = registry.update_field(PersonId(id), field, value, Utc::now())?;
    println!("Updated {field} of #{}: {person}", person.id);
    Ok(())
}

pub fn cmd_delete(db_path: &Path, backend: &str, id: u64) -> CliResult {
    let mut registry = open_registry(db_path, backend)?;
    let person = registry.delete(PersonId(id))?;
    println!("Deleted #{} {person}", person.id);
    Ok(())
}

// =============================================================================
// STATISTICS & EXPORT
// =============================================================================

fn print_statistics(stats: &Statistics) {
    println!("People:       {}", stats.total);
    println!("Male:         {}", stats.by_sex.male);
    println!("Female:       {}", stats.by_sex.female);
    println!("Average age:  {}", stats.mean_age);
    println!(
        "Minors:       {} (born after {})",
        stats.majority.minors,
        stats.majority.cutoff.format("%d/%m/%Y")
    );
    println!("Adults:       {}", stats.majority.adults);
    if let Some(oldest) = &stats.oldest {
        println!("Oldest:       {oldest}");
    }
    if let Some(youngest) = &stats.youngest {
        println!("Youngest:     {youngest}");
    }

    println!();
    println!("Age brackets:");
    for row in &stats.age_brackets {
        println!("  {:<6} {}", row.bracket.label(), row.count);
    }

    println!();
    println!("Birthdays by month:");
    for row in &stats.birth_months {
        println!("  {:<10} {}", row.name, row.count);
    }
}

pub fn cmd_stats(db_path: &Path, backend: &str, json_mode: bool) -> CliResult {
    let registry = open_registry(db_path, backend)?;
    let stats = registry.statistics(today())?;
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_statistics(&stats);
    }
    Ok(())
}

/// Write every record to `output` as csv, json or xlsx.
pub fn cmd_export(db_path: &Path, backend: &str, output: &Path, format: &str) -> CliResult {
    let format: ExportFormat = format.parse()?;
    let registry = open_registry(db_path, backend)?;
    let file = registry.export(format, today())?;
    fs::write(output, &file.bytes)?;
    tracing::info!(%format, path = %output.display(), "export written");
    println!("Exported {} bytes to {}", file.bytes.len(), output.display());
    Ok(())
}

// =============================================================================
// SERVER
// =============================================================================

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutdown signal received");
}

/// Run the HTTP API until interrupted. `rate_limit` is in requests per
/// second; 0 disables limiting.
pub async fn cmd_serve(
    db_path: &Path,
    backend: &str,
    host: &str,
    port: u16,
    rate_limit: u32,
    seed: bool,
) -> CliResult {
    let mut registry = open_registry(db_path, backend)?;
    if seed {
        let created = registry.seed(Utc::now())?;
        tracing::info!(created, "demo data loaded");
    }

    let state = AppState::new(registry, Clock::System);
    let mut app = api::create_router(state);
    if let Some(per_second) = NonZeroU32::new(rate_limit) {
        app = api::with_rate_limit(app, per_second);
        tracing::info!(per_second = per_second.get(), "rate limiting enabled");
    }

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, db = %db_path.display(), %backend, "roster server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
