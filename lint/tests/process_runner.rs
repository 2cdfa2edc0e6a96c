#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use catlint_lint::{
    AnalyzerSettings, DiagnosticsDisplay, DocumentChange, DocumentId, Invocation, LintManager,
    LintSettings, LintUpdate, MemoryDocuments, ProcessRunner, RangeDiagnostic, RunError,
    Severity,
};
use tempfile::TempDir;

fn shell(script: &str, input: &str) -> Invocation {
    Invocation::new("sh", vec!["-c".to_string(), script.to_string()], input)
}

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

#[tokio::test]
async fn captures_stdout_and_exit_code() {
    let output = ProcessRunner::execute(shell("printf '[]'", "")).await.unwrap();
    assert_eq!(output.exit_code(), Some(0));
    assert_eq!(output.stdout(), "[]");
}

#[tokio::test]
async fn nonzero_exit_still_returns_output() {
    let output = ProcessRunner::execute(shell("echo partial; exit 3", ""))
        .await
        .unwrap();
    assert_eq!(output.exit_code(), Some(3));
    assert_eq!(output.stdout().trim(), "partial");
}

#[tokio::test]
async fn large_input_round_trips_without_deadlock() {
    let input = "x = 1\n".repeat(200_000);
    let output = ProcessRunner::execute(shell("cat", &input)).await.unwrap();
    assert_eq!(output.stdout().len(), input.len());
}

#[tokio::test]
async fn document_path_and_flags_are_passed() {
    let dir = TempDir::new().unwrap();
    let script = write_script(dir.path(), "args.sh", "printf '%s\\n' \"$@\"\n");
    let settings =
        AnalyzerSettings::new(script.to_str().unwrap(), Some("sh".to_string()), Duration::from_secs(10))
            .unwrap();

    let invocation =
        Invocation::for_document(&settings, Path::new("/game/door.cat"), String::new());
    let output = ProcessRunner::execute(invocation).await.unwrap();

    let args: Vec<&str> = output.stdout().lines().collect();
    assert_eq!(args, ["/game/door.cat", "--lint", "--stdin"]);
}

#[tokio::test]
async fn slow_analyzer_times_out() {
    let invocation = shell("sleep 5", "").with_timeout(Duration::from_millis(100));
    let err = ProcessRunner::execute(invocation).await.unwrap_err();
    assert!(matches!(err, RunError::TimedOut { .. }), "got {err:?}");
}

#[derive(Default)]
struct CollectingDisplay {
    shown: Vec<(DocumentId, Vec<RangeDiagnostic>)>,
}

impl DiagnosticsDisplay for CollectingDisplay {
    fn set(&mut self, document: &DocumentId, diagnostics: &[RangeDiagnostic]) {
        self.shown.push((document.clone(), diagnostics.to_vec()));
    }

    fn clear(&mut self, document: &DocumentId) {
        self.shown.push((document.clone(), Vec::new()));
    }
}

#[tokio::test]
async fn manager_lints_through_real_process() {
    let dir = TempDir::new().unwrap();
    // Reports one warning on the last line it reads from stdin.
    let script = write_script(
        dir.path(),
        "analyzer.sh",
        "n=$(wc -l)\nprintf '[{\"line\": %d, \"severity\": \"warning\", \"msg\": \"unused variable\"}]' \"$n\"\n",
    );
    let settings =
        AnalyzerSettings::new(script.to_str().unwrap(), Some("sh".to_string()), Duration::from_secs(10))
            .unwrap();

    let doc_path = dir.path().join("door.cat");
    let document = catlint_lint::document_id_for_path(&doc_path).unwrap();
    let mut documents = MemoryDocuments::new();
    documents.open(
        document.clone(),
        doc_path,
        "local open = false\n  let x = 1\n",
    );

    let mut manager = LintManager::new(
        LintSettings::new("catlua", Duration::from_millis(20)).unwrap(),
        documents,
        CollectingDisplay::default(),
        Some(settings),
        Box::new(ProcessRunner),
    );

    assert!(manager.on_document_changed(&DocumentChange::new(document.clone(), "catlua")));

    let started = manager.next_update().await.unwrap();
    assert!(matches!(started, LintUpdate::Started { .. }), "{started:?}");
    let finished = manager.next_update().await.unwrap();
    assert!(
        matches!(finished, LintUpdate::Published { count: 1, .. }),
        "{finished:?}"
    );

    let (shown_doc, diagnostics) = manager.display().shown.last().unwrap();
    assert_eq!(shown_doc, &document);
    assert_eq!(diagnostics[0].severity(), Severity::Warning);
    assert_eq!(diagnostics[0].start_line(), 1);
    assert_eq!(diagnostics[0].start_column(), 2);
    assert_eq!(diagnostics[0].end_column(), 11);
    assert_eq!(manager.snapshot().status_string(), "E:0 W:1");
}
