use anyhow::Context;
use runbook_core::blocks::{self, Block};
use std::path::{Path, PathBuf};

/// A Markdown runbook loaded from disk.
pub struct Document {
    pub path: PathBuf,
    pub blocks: Vec<Block>,
}

impl Document {
    /// Read `path` and locate its fenced blocks. The stored path is
    /// canonical so remembered defaults key on the same name however the
    /// file was addressed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let path = path
            .canonicalize()
            .with_context(|| format!("cannot open {}", path.display()))?;
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded document");
        Ok(Self {
            blocks: blocks::find_blocks(&text),
            path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_finds_blocks_and_canonicalizes() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("doc.md");
        std::fs::write(&file, "# Doc\n\n```bash run\necho hi\n```\n").unwrap();

        let doc = Document::load(&dir.path().join(".").join("doc.md")).unwrap();
        assert_eq!(doc.path, file.canonicalize().unwrap());
        assert_eq!(doc.blocks.len(), 1);
        assert!(doc.blocks[0].is_actionable());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = Document::load(&dir.path().join("nope.md")).err().unwrap();
        assert!(err.to_string().contains("cannot open"));
    }
}
