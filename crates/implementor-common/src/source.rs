use std::path::{Path, PathBuf};

/// A source file with its contents and a line table.
#[derive(Debug, Clone)]
pub struct SourceFile {
    path: Option<PathBuf>,
    content: String,
    line_starts: Vec<u32>,
}

impl SourceFile {
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        let line_starts = std::iter::once(0)
            .chain(content.match_indices('\n').map(|(i, _)| i as u32 + 1))
            .collect();

        Self {
            path: None,
            content,
            line_starts,
        }
    }

    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn len(&self) -> u32 {
        self.content.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Number of lines; a trailing newline opens one more (empty) line.
    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    /// Get line and column (0-indexed) from byte offset.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let col = offset - self.line_starts[line];
        (line as u32, col)
    }

    /// 1-based line number of the byte offset.
    pub fn line_number(&self, offset: u32) -> u32 {
        self.line_col(offset).0 + 1
    }

    /// Byte offset of the first column of a 1-based line, if the line exists.
    pub fn line_start(&self, line_number: u32) -> Option<u32> {
        let index = line_number.checked_sub(1)?;
        self.line_starts.get(index as usize).copied()
    }

    /// Get the content of a specific 0-indexed line, without its newline.
    pub fn line(&self, line: u32) -> &str {
        let start = self.line_starts[line as usize] as usize;
        let end = self
            .line_starts
            .get(line as usize + 1)
            .map(|&e| e as usize)
            .unwrap_or(self.content.len());
        self.content[start..end].trim_end_matches('\n')
    }
}
