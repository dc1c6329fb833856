use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::collaborators::{ResultRecord, ResultSink};
use crate::error::StoreError;
use crate::types::Theme;

#[derive(Clone, Debug, Serialize)]
struct ResultStoreFile<'a> {
    version: u8,
    records: &'a [ResultRecord],
}

#[derive(Clone, Debug, Deserialize)]
struct ResultStoreFileRaw {
    version: u8,
    records: Vec<serde_json::Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeBest {
    pub theme: Theme,
    pub best_score: u32,
    pub sessions: u64,
    pub fastest_ms: u64,
}

/// Save service backed by a versioned JSON file. Unreadable or corrupt files
/// start an empty history instead of failing.
pub struct JsonResultStore {
    file_path: PathBuf,
    records: Vec<ResultRecord>,
}

impl JsonResultStore {
    pub fn new(file_path: PathBuf) -> Self {
        let records = load_records(&file_path);
        Self { file_path, records }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most recent records first, at most `limit` (clamped to 1..=100).
    pub fn recent(&self, limit: usize) -> Vec<ResultRecord> {
        let limit = limit.clamp(1, 100);
        self.records.iter().rev().take(limit).cloned().collect()
    }

    /// Best score, session count and fastest clear per theme, ordered by theme name.
    pub fn best_by_theme(&self) -> Vec<ThemeBest> {
        let mut best = HashMap::<&'static str, ThemeBest>::new();
        for record in &self.records {
            let entry = best
                .entry(record.theme.zone())
                .or_insert_with(|| ThemeBest {
                    theme: record.theme,
                    best_score: 0,
                    sessions: 0,
                    fastest_ms: u64::MAX,
                });
            entry.sessions += 1;
            entry.best_score = entry.best_score.max(record.final_score);
            entry.fastest_ms = entry.fastest_ms.min(record.elapsed_ms);
        }
        let mut entries: Vec<(&str, ThemeBest)> = best.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter().map(|(_, entry)| entry).collect()
    }

    fn persist(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let payload = ResultStoreFile {
            version: 1,
            records: &self.records,
        };
        let text = serde_json::to_string_pretty(&payload)?;
        fs::write(&self.file_path, text).map_err(|source| StoreError::Write {
            path: self.file_path.clone(),
            source,
        })
    }
}

impl ResultSink for JsonResultStore {
    fn save(&mut self, record: &ResultRecord) -> Result<bool, StoreError> {
        self.records.push(record.clone());
        if let Err(error) = self.persist() {
            self.records.pop();
            return Err(error);
        }
        tracing::debug!(
            path = %self.file_path.display(),
            records = self.records.len(),
            "result saved"
        );
        Ok(true)
    }
}

fn load_records(path: &Path) -> Vec<ResultRecord> {
    let text = match fs::read_to_string(path) {
        Ok(value) => value,
        Err(error) => {
            if error.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), "failed to read result store: {error}");
            }
            return Vec::new();
        }
    };
    let parsed = match serde_json::from_str::<ResultStoreFileRaw>(&text) {
        Ok(value) if value.version == 1 => value,
        Ok(value) => {
            tracing::warn!(
                path = %path.display(),
                version = value.version,
                "unsupported result store version"
            );
            return Vec::new();
        }
        Err(error) => {
            tracing::warn!(path = %path.display(), "failed to parse result store: {error}");
            return Vec::new();
        }
    };

    parsed
        .records
        .into_iter()
        .enumerate()
        .filter_map(|(idx, raw)| match serde_json::from_value::<ResultRecord>(raw) {
            Ok(record) if record.containers_opened <= record.containers_total => Some(record),
            Ok(record) => {
                tracing::warn!(
                    idx,
                    session_id = %record.session_id,
                    "dropping record with more opened than total containers"
                );
                None
            }
            Err(error) => {
                tracing::warn!(idx, "failed to parse result record: {error}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GameOverReason;

    fn record(session_id: &str, theme: Theme, score: u32, elapsed_ms: u64) -> ResultRecord {
        ResultRecord {
            session_id: session_id.to_string(),
            theme,
            reason: GameOverReason::Victory,
            containers_opened: 3,
            containers_total: 4,
            final_score: score,
            reward: 15,
            elapsed_ms,
            finished_at_iso: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn save_persists_and_reloads() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("results.json");
        let mut store = JsonResultStore::new(path.clone());
        assert!(store.is_empty());
        let stored =
            ResultSink::save(&mut store, &record("a", Theme::Courtyard, 300, 90_000)).expect("save");
        assert!(stored);
        ResultSink::save(&mut store, &record("b", Theme::Meadow, 400, 60_000)).expect("save");

        let reloaded = JsonResultStore::new(path);
        assert_eq!(reloaded.len(), 2);
        let recent = reloaded.recent(10);
        assert_eq!(recent[0].session_id, "b");
        assert_eq!(recent[1].session_id, "a");
        assert_eq!(reloaded.recent(0).len(), 1);
    }

    #[test]
    fn best_by_theme_aggregates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = JsonResultStore::new(dir.path().join("results.json"));
        for (id, theme, score, elapsed) in [
            ("a", Theme::Pillars, 300, 120_000),
            ("b", Theme::Pillars, 350, 150_000),
            ("c", Theme::Corridors, 200, 80_000),
        ] {
            ResultSink::save(&mut store, &record(id, theme, score, elapsed)).expect("save");
        }
        let best = store.best_by_theme();
        assert_eq!(best.len(), 2);
        assert_eq!(best[0].theme, Theme::Corridors);
        assert_eq!(best[1].theme, Theme::Pillars);
        assert_eq!(best[1].best_score, 350);
        assert_eq!(best[1].sessions, 2);
        assert_eq!(best[1].fastest_ms, 120_000);
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("results.json");
        fs::write(&path, "{ not json").expect("write");
        assert!(JsonResultStore::new(path.clone()).is_empty());
        fs::write(&path, r#"{"version": 9, "records": []}"#).expect("write");
        assert!(JsonResultStore::new(path).is_empty());
    }

    #[test]
    fn load_keeps_valid_records_when_invalid_ones_exist() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("results.json");
        let raw = r#"{
  "version": 1,
  "records": [
    {
      "sessionId": "ok",
      "theme": "meadow",
      "reason": "victory",
      "containersOpened": 4,
      "containersTotal": 4,
      "finalScore": 400,
      "reward": 30,
      "elapsedMs": 50000,
      "finishedAtIso": "2026-01-01T00:00:00.000Z"
    },
    {
      "sessionId": "too-many",
      "theme": "meadow",
      "reason": "victory",
      "containersOpened": 5,
      "containersTotal": 4,
      "finalScore": 500,
      "reward": 30,
      "elapsedMs": 50000,
      "finishedAtIso": "2026-01-01T00:00:00.000Z"
    },
    { "sessionId": "broken" }
  ]
}"#;
        fs::write(&path, raw).expect("write");
        let store = JsonResultStore::new(path);
        assert_eq!(store.len(), 1);
        assert_eq!(store.recent(5)[0].session_id, "ok");
    }

    #[test]
    fn failed_write_is_reported_and_not_kept() {
        let dir = tempfile::tempdir().expect("tempdir");
        // A directory at the file path makes the write fail.
        let path = dir.path().join("results.json");
        fs::create_dir_all(&path).expect("dir");
        let mut store = JsonResultStore::new(path);
        let result = ResultSink::save(&mut store, &record("a", Theme::Courtyard, 100, 1_000));
        assert!(matches!(result, Err(StoreError::Write { .. })));
        assert!(store.is_empty());
    }
}
