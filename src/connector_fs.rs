//! Local JSON export source.
//!
//! Reads the sheets configured under `[source]` from one directory:
//!
//! - song sheets and the tune sheet are arrays of rows, each row an array of
//!   cells (`[["27", "Amazing Grace", "Amazing grace how sweet"], ...]`);
//! - the sung sheet is an array of `{ "date": "...", "songs": [...] }`.
//!
//! Cells may be strings, numbers or `null`, since spreadsheet exporters are
//! inconsistent about typing.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::models::{SongCategory, SongRow, SungRow, TuneRow};
use crate::source::{Batch, SongSource};

pub struct JsonDirSource {
    name: String,
    root: PathBuf,
    hymns: String,
    lyrics: String,
    conventions: String,
    sung: String,
    tunes: String,
}

#[derive(Deserialize)]
struct RawSung {
    #[serde(default)]
    date: Value,
    #[serde(default)]
    songs: Vec<Value>,
}

impl JsonDirSource {
    pub fn from_config(config: &Config) -> Self {
        let src = &config.source;
        Self {
            name: format!("filesystem:{}", src.dir.display()),
            root: src.dir.clone(),
            hymns: src.hymns.clone(),
            lyrics: src.lyrics.clone(),
            conventions: src.conventions.clone(),
            sung: src.sung.clone(),
            tunes: src.tunes.clone(),
        }
    }

    /// Path of the file backing a batch.
    pub fn path_for(&self, batch: Batch) -> PathBuf {
        let file = match batch {
            Batch::Songs(SongCategory::Hymn) | Batch::Songs(SongCategory::Unknown) => &self.hymns,
            Batch::Songs(SongCategory::Lyric) => &self.lyrics,
            Batch::Songs(SongCategory::Convention) => &self.conventions,
            Batch::Sung => &self.sung,
            Batch::Tunes => &self.tunes,
        };
        self.root.join(file)
    }

    /// Every batch with its backing file, in load order.
    pub fn files(&self) -> Vec<(Batch, PathBuf)> {
        SongCategory::ALL
            .iter()
            .map(|c| Batch::Songs(*c))
            .chain([Batch::Sung, Batch::Tunes])
            .map(|batch| (batch, self.path_for(batch)))
            .collect()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn read_rows(&self, batch: Batch) -> Result<Vec<Vec<String>>> {
        let path = self.path_for(batch);
        let content = read_file(&path).await?;
        let raw: Vec<Vec<Value>> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {} as rows: {}", batch, path.display()))?;
        Ok(raw
            .into_iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect())
    }
}

async fn read_file(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read source file: {}", path.display()))
}

/// Render a JSON cell as the text a spreadsheet would show.
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl SongSource for JsonDirSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn song_rows(&self, category: SongCategory) -> Result<Vec<SongRow>> {
        self.read_rows(Batch::Songs(category)).await
    }

    async fn sung_rows(&self) -> Result<Vec<SungRow>> {
        let path = self.path_for(Batch::Sung);
        let content = read_file(&path).await?;
        let raw: Vec<RawSung> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse sung dates: {}", path.display()))?;
        Ok(raw
            .into_iter()
            .map(|r| SungRow {
                date: cell_text(&r.date),
                songs: r.songs.iter().map(cell_text).collect(),
            })
            .collect())
    }

    async fn tune_rows(&self) -> Result<Vec<TuneRow>> {
        let rows = self.read_rows(Batch::Tunes).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let mut cells = row.into_iter();
                TuneRow {
                    hymn: cells.next().unwrap_or_default(),
                    tune: cells.next().unwrap_or_default(),
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn source_in(dir: &Path) -> JsonDirSource {
        JsonDirSource::from_config(&Config::minimal(dir))
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Value::Null), "");
        assert_eq!(cell_text(&serde_json::json!("H-27")), "H-27");
        assert_eq!(cell_text(&serde_json::json!(27)), "27");
        assert_eq!(cell_text(&serde_json::json!(27.0)), "27.0");
    }

    #[tokio::test]
    async fn test_reads_rows_and_sung_records() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("hymns.json"),
            r#"[[27, "Amazing Grace", "Amazing grace how sweet"], ["5", "Rock of Ages", null]]"#,
        )
        .unwrap();
        fs::write(
            tmp.path().join("sung.json"),
            r#"[{"date": "2024-01-07", "songs": ["H27", null]}]"#,
        )
        .unwrap();
        fs::write(tmp.path().join("tunes.json"), r#"[[27, "New Britain"], [5]]"#).unwrap();

        let source = source_in(tmp.path());
        let hymns = source.song_rows(SongCategory::Hymn).await.unwrap();
        assert_eq!(hymns[0], vec!["27", "Amazing Grace", "Amazing grace how sweet"]);
        assert_eq!(hymns[1][2], "");

        let sung = source.sung_rows().await.unwrap();
        assert_eq!(sung, vec![SungRow::new("2024-01-07", &["H27", ""])]);

        let tunes = source.tune_rows().await.unwrap();
        assert_eq!(tunes[0], TuneRow::new("27", "New Britain"));
        assert_eq!(tunes[1], TuneRow::new("5", ""));
    }

    #[tokio::test]
    async fn test_missing_and_malformed_files_fail_their_batch() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("lyrics.json"), "{not json").unwrap();
        let source = source_in(tmp.path());

        let err = source.song_rows(SongCategory::Hymn).await.unwrap_err();
        assert!(format!("{:#}", err).contains("hymns.json"));
        let err = source.song_rows(SongCategory::Lyric).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse lyric list"));
    }

    #[test]
    fn test_files_in_load_order() {
        let source = source_in(Path::new("/data"));
        let files = source.files();
        assert_eq!(files.len(), 5);
        assert_eq!(files[0].1, PathBuf::from("/data/hymns.json"));
        assert_eq!(files[3].0, Batch::Sung);
    }
}
