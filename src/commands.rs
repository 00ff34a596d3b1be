//! Subcommand handlers.

use crate::IntoReport;
use crate::cli::Command;
use mediastore_config::Settings;
use mediastore_source::{AcceptFilter, FileSource, PathSource};
use mediastore_store::quota::{UsageSnapshot, get_usage_snapshot};
use mediastore_store::{Database, DatabaseConfig, Repository};
use miette::miette;
use std::path::{Path, PathBuf};

pub async fn run(command: Command, settings: &Settings) -> miette::Result<()> {
    let config = settings.database_config().into_report()?;
    let db = Database::open(config).await.into_report()?;
    let repo = Repository::from(&db);
    let result = match command {
        Command::Save { path, accept } => {
            let accept = AcceptFilter::parse(accept.unwrap_or_else(|| settings.picker.accept.clone()));
            save(&repo, PathSource::from_option(path), &accept).await
        },
        Command::List => list(&repo).await,
        Command::Get { id, output } => get(&repo, &id, output).await,
        Command::Delete { id } => repo.delete_media_by_id(&id).await.into_report(),
        Command::Usage => usage(settings, db.config()).await,
    };
    db.close().await;
    result
}

async fn save(repo: &Repository, source: impl FileSource, accept: &AcceptFilter) -> miette::Result<()> {
    let file = source.request_file(accept).await.into_report()?;
    let id = repo.save_media(&file).await.into_report()?;
    println!("{id}");
    Ok(())
}

async fn list(repo: &Repository) -> miette::Result<()> {
    let mut media = repo.list_media().await.into_report()?;
    media.sort_by(|a, b| a.id.cmp(&b.id));
    for summary in media {
        println!("{}\t{}\t{}\t{}", summary.id, summary.mime_type, summary.size, summary.saved_at);
    }
    Ok(())
}

async fn get(repo: &Repository, id: &str, output: Option<PathBuf>) -> miette::Result<()> {
    let record = repo
        .get_media_by_id(id)
        .await
        .into_report()?
        .ok_or_else(|| miette!("no media stored under id `{id}`"))?;
    let file = record.into_file();
    let output = match output {
        Some(output) => output,
        None => default_output(&file.name)?,
    };
    tokio::fs::write(&output, &file.bytes)
        .await
        .map_err(|err| miette!("could not write {}: {err}", output.display()))?;
    tracing::info!(id, path = %output.display(), size = file.size(), "Media written");
    Ok(())
}

/// Stored names are untrusted; only their final component is used.
fn default_output(name: &str) -> miette::Result<PathBuf> {
    Path::new(name)
        .file_name()
        .map(PathBuf::from)
        .ok_or_else(|| miette!("record name `{name}` is not usable as a file name; pass --output"))
}

async fn usage(settings: &Settings, config: &DatabaseConfig) -> miette::Result<()> {
    let estimator = settings.estimator(config);
    let snapshot = get_usage_snapshot(&*estimator).await.into_report()?;
    print!("{}", render_usage(&snapshot));
    Ok(())
}

fn render_usage(snapshot: &UsageSnapshot) -> String {
    format!(
        "quota:     {}\nused:      {}\navailable: {}\nusage:     {}%\n",
        snapshot.quota_bytes, snapshot.used_bytes, snapshot.available_bytes, snapshot.used_percentage
    )
}
