use chrono::{DateTime, Local};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::catalog::{Difficulty, Snippet};
use crate::error::Result;

/// What the finished session was typing, carried into its result record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnippetMeta {
    pub snippet_id: String,
    pub category: String,
    pub topic: String,
    pub language: String,
    pub difficulty: Option<Difficulty>,
}

impl SnippetMeta {
    /// Metadata for user-supplied text that is not part of the catalog
    pub fn custom() -> Self {
        Self {
            snippet_id: "custom".to_string(),
            category: "Custom".to_string(),
            topic: "Custom prompt".to_string(),
            language: "Text".to_string(),
            difficulty: None,
        }
    }
}

impl Default for SnippetMeta {
    fn default() -> Self {
        Self::custom()
    }
}

impl From<&Snippet> for SnippetMeta {
    fn from(snippet: &Snippet) -> Self {
        Self {
            snippet_id: snippet.id.clone(),
            category: snippet.category.clone(),
            topic: snippet.topic.clone(),
            language: snippet.language.clone(),
            difficulty: Some(snippet.difficulty),
        }
    }
}

/// Record emitted when a session completes
#[derive(Debug, Clone, PartialEq)]
pub struct SessionResult {
    pub wpm: u32,
    pub accuracy: u32,
    pub elapsed_secs: u64,
    pub error_count: usize,
    pub snippet: SnippetMeta,
    pub completed_at: DateTime<Local>,
}

/// Destination for completed session results
pub trait ResultSink {
    fn record(&mut self, result: &SessionResult) -> Result<()>;
}

/// Keeps results in memory; used by tests and `--no-save`
#[derive(Debug, Default)]
pub struct MemorySink {
    pub results: Vec<SessionResult>,
}

impl ResultSink for MemorySink {
    fn record(&mut self, result: &SessionResult) -> Result<()> {
        self.results.push(result.clone());
        Ok(())
    }
}

// csv cannot serialize nested structs, so rows are flat
#[derive(Debug, Serialize, Deserialize)]
struct ResultRow {
    completed_at: DateTime<Local>,
    snippet_id: String,
    category: String,
    topic: String,
    language: String,
    difficulty: Option<Difficulty>,
    wpm: u32,
    accuracy: u32,
    elapsed_secs: u64,
    error_count: usize,
}

impl From<&SessionResult> for ResultRow {
    fn from(r: &SessionResult) -> Self {
        Self {
            completed_at: r.completed_at,
            snippet_id: r.snippet.snippet_id.clone(),
            category: r.snippet.category.clone(),
            topic: r.snippet.topic.clone(),
            language: r.snippet.language.clone(),
            difficulty: r.snippet.difficulty,
            wpm: r.wpm,
            accuracy: r.accuracy,
            elapsed_secs: r.elapsed_secs,
            error_count: r.error_count,
        }
    }
}

impl From<ResultRow> for SessionResult {
    fn from(row: ResultRow) -> Self {
        Self {
            wpm: row.wpm,
            accuracy: row.accuracy,
            elapsed_secs: row.elapsed_secs,
            error_count: row.error_count,
            snippet: SnippetMeta {
                snippet_id: row.snippet_id,
                category: row.category,
                topic: row.topic,
                language: row.language,
                difficulty: row.difficulty,
            },
            completed_at: row.completed_at,
        }
    }
}

/// Append-only results history stored as CSV
#[derive(Debug, Clone)]
pub struct CsvResultLog {
    path: PathBuf,
}

impl CsvResultLog {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::results_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every stored result, oldest first. A missing log is an empty history.
    pub fn load_all(&self) -> Result<Vec<SessionResult>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut results = Vec::new();
        for row in reader.deserialize::<ResultRow>() {
            results.push(row?.into());
        }
        Ok(results)
    }

    /// Delete every stored result. Returns false when there was nothing to delete.
    pub fn clear(&self) -> Result<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), "results cleared");
                Ok(true)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

impl Default for CsvResultLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultSink for CsvResultLog {
    fn record(&mut self, result: &SessionResult) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // If the log doesn't exist yet, we need to emit a header
        let needs_header = !self.path.exists();

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(ResultRow::from(result))?;
        writer.flush()?;

        tracing::info!(
            path = %self.path.display(),
            wpm = result.wpm,
            accuracy = result.accuracy,
            "result saved"
        );
        Ok(())
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation
fn std_dev(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Aggregate view over a results history
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistorySummary {
    pub count: usize,
    pub average_wpm: u32,
    pub average_accuracy: u32,
    pub total_secs: u64,
    pub best_wpm: u32,
    pub wpm_std_dev: f64,
    /// (language, rounded average wpm), sorted by language
    pub per_language: Vec<(String, u32)>,
}

impl HistorySummary {
    pub fn from_results(results: &[SessionResult]) -> Self {
        let wpms: Vec<f64> = results.iter().map(|r| r.wpm as f64).collect();
        let accuracies: Vec<f64> = results.iter().map(|r| r.accuracy as f64).collect();

        let per_language = results
            .iter()
            .into_group_map_by(|r| r.snippet.language.clone())
            .into_iter()
            .map(|(language, rs)| {
                let wpms: Vec<f64> = rs.iter().map(|r| r.wpm as f64).collect();
                (language, mean(&wpms).unwrap_or(0.0).round() as u32)
            })
            .sorted()
            .collect();

        Self {
            count: results.len(),
            average_wpm: mean(&wpms).unwrap_or(0.0).round() as u32,
            average_accuracy: mean(&accuracies).unwrap_or(0.0).round() as u32,
            total_secs: results.iter().map(|r| r.elapsed_secs).sum(),
            best_wpm: results.iter().map(|r| r.wpm).max().unwrap_or(0),
            wpm_std_dev: std_dev(&wpms).unwrap_or(0.0),
            per_language,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn result(wpm: u32, accuracy: u32, language: &str) -> SessionResult {
        SessionResult {
            wpm,
            accuracy,
            elapsed_secs: 30,
            error_count: 2,
            snippet: SnippetMeta {
                snippet_id: format!("binary-search-binary-search-{}", language.to_lowercase()),
                category: "Binary Search".to_string(),
                topic: "Binary Search".to_string(),
                language: language.to_string(),
                difficulty: Some(Difficulty::Easy),
            },
            completed_at: Local.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_memory_sink_collects() {
        let mut sink = MemorySink::default();
        sink.record(&result(40, 90, "Python")).unwrap();
        sink.record(&result(50, 95, "Java")).unwrap();
        assert_eq!(sink.results.len(), 2);
        assert_eq!(sink.results[1].wpm, 50);
    }

    #[test]
    fn test_csv_log_roundtrip_with_single_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("results.csv");
        let mut log = CsvResultLog::with_path(&path);

        assert!(log.load_all().unwrap().is_empty());

        let first = result(42, 97, "Python");
        let mut second = result(55, 88, "C++");
        second.snippet = SnippetMeta::custom();
        log.record(&first).unwrap();
        log.record(&second).unwrap();

        let loaded = log.load_all().unwrap();
        assert_eq!(loaded, vec![first, second]);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.matches("completed_at").count(), 1);
    }

    #[test]
    fn test_clear_removes_history() {
        let dir = tempdir().unwrap();
        let mut log = CsvResultLog::with_path(dir.path().join("results.csv"));

        assert!(!log.clear().unwrap());

        log.record(&result(42, 97, "Python")).unwrap();
        assert!(log.clear().unwrap());
        assert!(log.load_all().unwrap().is_empty());

        // a fresh log after clearing gets its header back
        log.record(&result(50, 90, "Java")).unwrap();
        assert_eq!(log.load_all().unwrap().len(), 1);
    }

    #[test]
    fn test_snippet_meta_from_snippet() {
        let catalog = crate::catalog::Catalog::bundled().unwrap();
        let snippet = &catalog.snippets()[0];
        let meta = SnippetMeta::from(snippet);
        assert_eq!(meta.snippet_id, snippet.id);
        assert_eq!(meta.difficulty, Some(snippet.difficulty));
    }

    #[test]
    fn test_history_summary() {
        let results = vec![
            result(40, 90, "Python"),
            result(60, 100, "Python"),
            result(71, 95, "C++"),
        ];
        let summary = HistorySummary::from_results(&results);

        assert_eq!(summary.count, 3);
        assert_eq!(summary.average_wpm, 57);
        assert_eq!(summary.average_accuracy, 95);
        assert_eq!(summary.total_secs, 90);
        assert_eq!(summary.best_wpm, 71);
        assert!(summary.wpm_std_dev > 0.0);
        assert_eq!(
            summary.per_language,
            vec![("C++".to_string(), 71), ("Python".to_string(), 50)]
        );
    }

    #[test]
    fn test_mean_and_std_dev() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[10.0, 20.0, 30.0]), Some(20.0));
        assert_eq!(std_dev(&[5.0, 5.0, 5.0]), Some(0.0));
        assert_eq!(std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), Some(2.0));
        assert_eq!(std_dev(&[]), None);
    }

    #[test]
    fn test_history_summary_empty() {
        assert_eq!(HistorySummary::from_results(&[]), HistorySummary::default());
    }
}
