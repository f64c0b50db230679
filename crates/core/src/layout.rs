use std::path::{Component, Path, PathBuf};

use crate::model::{Language, Split};

/// File name of the compressed record stream inside a mirrored directory.
pub const MIRROR_FILE_NAME: &str = "functions.jsonl.gz";

/// Destination partition of an emitted record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Partition {
    /// One of the train/valid/test streams.
    Split(Split),
    /// Records from one input directory, mirrored under the output root.
    Directory(PathBuf),
    /// Single undivided stream (single-file and stdin modes).
    Single,
}

/// Logical layout of pipeline outputs on disk.
///
/// This is derived from a chosen output root and does *not* perform any IO.
/// Sinks are responsible for creating directories and files based on it.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    pub root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    /// `<root>/<split>.jsonl.gz`
    pub fn split_path(&self, split: Split) -> PathBuf {
        self.root.join(format!("{}.jsonl.gz", split.as_str()))
    }

    /// `<root>/<sha>.json`
    pub fn function_record_path(&self, sha256: &str) -> PathBuf {
        self.root.join(format!("{sha256}.json"))
    }

    /// `<root>/<sha>.<ext>`, with the extension taken from the language.
    pub fn function_source_path(&self, sha256: &str, language: Language) -> PathBuf {
        self.root.join(format!("{sha256}.{}", language.source_extension()))
    }

    /// Mirror an input directory under the root.
    ///
    /// Root, prefix and `..` components are dropped so the mirror always stays
    /// inside the output tree.
    pub fn mirror_dir(&self, input_dir: &Path) -> PathBuf {
        let relative: PathBuf = input_dir
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .collect();
        self.root.join(relative)
    }

    /// Compressed stream path for a partition.
    pub fn partition_path(&self, partition: &Partition) -> PathBuf {
        match partition {
            Partition::Split(split) => self.split_path(*split),
            Partition::Directory(dir) => self.mirror_dir(dir).join(MIRROR_FILE_NAME),
            Partition::Single => self.root.join(MIRROR_FILE_NAME),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_and_function_paths() {
        let layout = OutputLayout::new("/out");
        assert_eq!(layout.split_path(Split::Valid), PathBuf::from("/out/valid.jsonl.gz"));
        assert_eq!(layout.function_record_path("ab"), PathBuf::from("/out/ab.json"));
        assert_eq!(
            layout.function_source_path("ab", Language::Java),
            PathBuf::from("/out/ab.java")
        );
        assert_eq!(
            layout.function_source_path("ab", Language::Python),
            PathBuf::from("/out/ab.py")
        );
    }

    #[test]
    fn mirror_strips_root_and_parent_components() {
        let layout = OutputLayout::new("/out");
        assert_eq!(layout.mirror_dir(Path::new("/data/repo")), PathBuf::from("/out/data/repo"));
        assert_eq!(layout.mirror_dir(Path::new("../x/./y")), PathBuf::from("/out/x/y"));
        assert_eq!(
            layout.partition_path(&Partition::Directory(PathBuf::from("/data/repo"))),
            PathBuf::from("/out/data/repo/functions.jsonl.gz")
        );
    }
}
