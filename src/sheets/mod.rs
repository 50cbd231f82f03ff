use std::path::PathBuf;

use async_trait::async_trait;

/// Grade/record sheet storage, keyed by an external sheet id.
///
/// The production deployment points this at a spreadsheet service; that
/// client lives outside this crate. The shipped implementation is the local
/// CSV fallback, so the service keeps working when no spreadsheet backend is
/// configured or reachable.
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Append rows to a sheet range.
    async fn append(&self, sheet_id: &str, range: &str, rows: Vec<Vec<String>>);

    /// Read all rows of a sheet range. Unreadable or missing sheets yield
    /// an empty result rather than an error.
    async fn values(&self, sheet_id: &str, range: &str) -> Vec<Vec<String>>;
}

/// Local CSV fallback: one file per (sheet id, range) under the exports
/// directory.
pub struct CsvSheetStore {
    exports_dir: PathBuf,
}

impl CsvSheetStore {
    pub fn new(exports_dir: impl Into<PathBuf>) -> Self {
        Self {
            exports_dir: exports_dir.into(),
        }
    }

    fn file_for(&self, sheet_id: &str, range: &str) -> PathBuf {
        // Range strings contain '!' and ':'; keep filenames tame.
        let safe_range: String = range
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .take(120)
            .collect();
        self.exports_dir.join(format!("{sheet_id}-{safe_range}.csv"))
    }
}

#[async_trait]
impl SheetStore for CsvSheetStore {
    async fn append(&self, sheet_id: &str, range: &str, rows: Vec<Vec<String>>) {
        if let Err(e) = tokio::fs::create_dir_all(&self.exports_dir).await {
            tracing::error!("sheet export dir unavailable: {}", e);
            return;
        }

        let path = self.file_for(sheet_id, range);
        let mut body = String::new();
        for row in rows {
            let line: Vec<String> = row
                .iter()
                .map(|cell| format!("\"{}\"", cell.replace('"', "\"\"")))
                .collect();
            body.push_str(&line.join(","));
            body.push('\n');
        }

        let existing = tokio::fs::read_to_string(&path).await.unwrap_or_default();
        if let Err(e) = tokio::fs::write(&path, existing + &body).await {
            tracing::error!("sheet append failed for {}: {}", path.display(), e);
        }
    }

    async fn values(&self, sheet_id: &str, range: &str) -> Vec<Vec<String>> {
        let path = self.file_for(sheet_id, range);
        let Ok(text) = tokio::fs::read_to_string(&path).await else {
            return Vec::new();
        };

        text.lines()
            .filter(|line| !line.is_empty())
            .map(parse_csv_line)
            .collect()
    }
}

/// Minimal CSV line parser matching the writer above: comma-separated,
/// double-quoted cells, doubled quotes as escapes.
fn parse_csv_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                chars.next();
                current.push('"');
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                cells.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    cells.push(current);
    cells
}
