use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use catlint_config::{ConfigLocations, FileConfigSource};
use catlint_lint::{
    ConfigSource, DocumentId, LintManager, LintUpdate, MemoryDocuments, ProcessRunner,
    document_id_for_path,
};

use crate::display::TerminalDisplay;

/// Absolute path, document id and current text of a file on disk.
pub(crate) async fn open_file(file: &Path) -> Result<(PathBuf, DocumentId, String)> {
    let path = std::path::absolute(file)
        .with_context(|| format!("cannot resolve {}", file.display()))?;
    let text = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let document = document_id_for_path(&path)?;
    Ok((path, document, text))
}

pub async fn run(locations: ConfigLocations, file: &Path) -> Result<ExitCode> {
    let (path, document, text) = open_file(file).await?;

    let source = FileConfigSource::new(locations);
    if source.analyzer_for(&document).is_none() {
        bail!(
            "no analyzer configured for {}; set [analyzer] path in ~/.catlint/config.toml or .catlint.toml",
            path.display()
        );
    }
    let settings = source.lint_settings(path.parent());

    let mut documents = MemoryDocuments::new();
    documents.open(document.clone(), path, text);
    let mut manager = LintManager::new(
        settings,
        documents,
        TerminalDisplay::new(false),
        source,
        Box::new(ProcessRunner),
    );

    match manager.request_analysis(&document) {
        LintUpdate::Started { .. } => {}
        other => bail!("analysis did not start: {other:?}"),
    }

    while let Some(update) = manager.next_update().await {
        match update {
            LintUpdate::Failed { error, .. } => {
                return Err(anyhow::Error::new(error).context("analysis failed"));
            }
            update if update.is_terminal() => break,
            _ => {}
        }
    }

    let snapshot = manager.snapshot();
    tracing::info!(status = %snapshot.status_string(), "Check finished");
    Ok(if snapshot.error_count() > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
