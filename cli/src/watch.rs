//! `catlint watch`: re-analyse files as they change on disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::Result;
use catlint_config::{ConfigLocations, FileConfigSource};
use catlint_lint::{
    DocumentChange, DocumentId, LintManager, LintUpdate, MemoryDocuments, ProcessRunner,
    SkipReason,
};
use tokio::time::MissedTickBehavior;

use crate::check::open_file;
use crate::display::TerminalDisplay;

type WatchManager = LintManager<MemoryDocuments, TerminalDisplay, FileConfigSource>;

struct WatchedFile {
    path: PathBuf,
    modified: Option<SystemTime>,
}

async fn modified_at(path: &Path) -> Option<SystemTime> {
    tokio::fs::metadata(path).await.ok()?.modified().ok()
}

pub async fn run(locations: ConfigLocations, files: &[PathBuf], poll: Duration) -> Result<()> {
    let source = FileConfigSource::new(locations);

    let mut documents = MemoryDocuments::new();
    let mut watched = HashMap::new();
    for file in files {
        let (path, document, text) = open_file(file).await?;
        let modified = modified_at(&path).await;
        documents.open(document.clone(), path.clone(), text);
        watched.insert(document, WatchedFile { path, modified });
    }

    let start_dir = watched.values().next().and_then(|w| w.path.parent().map(Path::to_path_buf));
    let settings = source.lint_settings(start_dir.as_deref());
    let language_id = settings.language_id().to_string();

    let mut manager = LintManager::new(
        settings,
        documents,
        TerminalDisplay::new(true),
        source,
        Box::new(ProcessRunner),
    );

    let opened: Vec<DocumentId> = manager.documents().ids().cloned().collect();
    for document in opened {
        manager.on_document_changed(&DocumentChange::new(document, language_id.clone()));
    }
    tracing::info!(files = watched.len(), "Watching for changes");

    let mut ticker = tokio::time::interval(poll);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(e) = result {
                    tracing::warn!("Failed to listen for Ctrl-C: {e}");
                }
                break;
            }
            _ = ticker.tick() => {
                refresh(&mut manager, &mut watched, &language_id).await;
                if watched.is_empty() {
                    tracing::info!("No files left to watch");
                    break;
                }
            }
            Some(update) = manager.next_update() => report(&update),
        }
    }

    manager.shutdown();
    Ok(())
}

/// Feed modified files to the manager; stop watching files that disappeared.
async fn refresh(
    manager: &mut WatchManager,
    watched: &mut HashMap<DocumentId, WatchedFile>,
    language_id: &str,
) {
    let mut removed = Vec::new();

    for (document, file) in watched.iter_mut() {
        let Some(modified) = modified_at(&file.path).await else {
            tracing::warn!(path = %file.path.display(), "File disappeared; no longer watching");
            removed.push(document.clone());
            continue;
        };
        if file.modified == Some(modified) {
            continue;
        }
        file.modified = Some(modified);

        match tokio::fs::read_to_string(&file.path).await {
            Ok(text) => {
                manager.documents_mut().update(document, text);
                manager.on_document_changed(&DocumentChange::new(document.clone(), language_id));
            }
            Err(e) => {
                tracing::warn!(path = %file.path.display(), "Failed to read file: {e}");
            }
        }
    }

    for document in removed {
        watched.remove(&document);
        manager.on_document_closed(&document);
        manager.documents_mut().close(&document);
    }
}

fn report(update: &LintUpdate) {
    match update {
        LintUpdate::Started { document, seq } => {
            tracing::debug!(document = %document, seq = %seq, "Analysis started");
        }
        LintUpdate::Published { .. } | LintUpdate::Discarded { .. } => {}
        LintUpdate::Failed {
            document, error, ..
        } => {
            tracing::error!(document = %document, "Analysis failed: {error}");
        }
        LintUpdate::Skipped {
            document,
            reason: SkipReason::NotConfigured,
        } => {
            tracing::warn!(document = %document, "No analyzer configured; set [analyzer] path");
        }
        LintUpdate::Skipped {
            document,
            reason: SkipReason::DocumentUnavailable,
        } => {
            tracing::debug!(document = %document, "Document no longer open");
        }
    }
}
