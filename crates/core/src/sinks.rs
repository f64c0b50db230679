//! Record sinks: where accepted records are written.
//!
//! Sinks are driven by the single fan-in consumer and are never shared
//! between threads.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use thiserror::Error;

use crate::layout::{OutputLayout, Partition};
use crate::model::NormalizedRecord;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to serialize record: {0}")]
    Json(#[from] serde_json::Error),
}

impl SinkError {
    fn io(path: &Path) -> impl FnOnce(io::Error) -> SinkError + '_ {
        move |source| SinkError::Io { path: path.to_path_buf(), source }
    }
}

/// Destination for accepted records.
pub trait RecordSink {
    fn write(&mut self, partition: &Partition, record: &NormalizedRecord)
        -> Result<(), SinkError>;

    /// Flush and close everything still open.
    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// One JSON object per line on an arbitrary writer (stdout in stream mode).
pub struct JsonLinesSink<W: Write> {
    writer: W,
    label: PathBuf,
}

impl<W: Write> JsonLinesSink<W> {
    /// `label` names the stream in error messages.
    pub fn new(writer: W, label: impl Into<PathBuf>) -> Self {
        Self { writer, label: label.into() }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn write(
        &mut self,
        _partition: &Partition,
        record: &NormalizedRecord,
    ) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n").map_err(SinkError::io(&self.label))?;
        // Downstream readers consume the stream incrementally.
        self.writer.flush().map_err(SinkError::io(&self.label))
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.writer.flush().map_err(SinkError::io(&self.label))
    }
}

type GzWriter = GzEncoder<BufWriter<File>>;

/// Gzip-compressed JSON lines, one file per partition, opened lazily.
///
/// Writers are keyed by output path, so partitions that map to the same file
/// share one writer. A file closed earlier in the run is reopened for append
/// and gains another gzip member; read the output with a multi-member decoder.
pub struct PartitionedGzipSink {
    layout: OutputLayout,
    writers: HashMap<PathBuf, GzWriter>,
    closed: HashSet<PathBuf>,
}

impl PartitionedGzipSink {
    pub fn new(layout: OutputLayout) -> Self {
        Self { layout, writers: HashMap::new(), closed: HashSet::new() }
    }

    /// Eagerly create the file for `partition` so empty partitions still exist on disk.
    pub fn open(&mut self, partition: &Partition) -> Result<(), SinkError> {
        self.writer(partition).map(|_| ())
    }

    /// Finish and drop the writer for one partition.
    pub fn close(&mut self, partition: &Partition) -> Result<(), SinkError> {
        let path = self.layout.partition_path(partition);
        match self.writers.remove(&path) {
            Some(writer) => {
                finish_gzip(&path, writer)?;
                self.closed.insert(path);
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn writer(&mut self, partition: &Partition) -> Result<&mut GzWriter, SinkError> {
        let path = self.layout.partition_path(partition);
        let writer = match self.writers.entry(path) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let path = entry.key();
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).map_err(SinkError::io(parent))?;
                }
                // Never truncate records already flushed earlier in this run.
                let file = if self.closed.contains(path) {
                    OpenOptions::new().append(true).open(path)
                } else {
                    File::create(path)
                }
                .map_err(SinkError::io(path))?;
                tracing::debug!("opened partition output {}", path.display());
                let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
                entry.insert(encoder)
            }
        };
        Ok(writer)
    }
}

impl RecordSink for PartitionedGzipSink {
    fn write(
        &mut self,
        partition: &Partition,
        record: &NormalizedRecord,
    ) -> Result<(), SinkError> {
        let path = self.layout.partition_path(partition);
        let writer = self.writer(partition)?;
        serde_json::to_writer(&mut *writer, record)?;
        writer.write_all(b"\n").map_err(SinkError::io(&path))
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        for (path, writer) in self.writers.drain() {
            finish_gzip(&path, writer)?;
            self.closed.insert(path);
        }
        Ok(())
    }
}

fn finish_gzip(path: &Path, writer: GzWriter) -> Result<(), SinkError> {
    let mut inner = writer.finish().map_err(SinkError::io(path))?;
    inner.flush().map_err(SinkError::io(path))
}

/// One pretty-printed `<sha>.json` per record plus a sibling `<sha>.<ext>`
/// holding the emitted source.
pub struct PerFunctionSink {
    layout: OutputLayout,
    written: usize,
}

impl PerFunctionSink {
    pub fn new(layout: OutputLayout) -> Result<Self, SinkError> {
        fs::create_dir_all(&layout.root).map_err(SinkError::io(&layout.root))?;
        Ok(Self { layout, written: 0 })
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

impl RecordSink for PerFunctionSink {
    fn write(
        &mut self,
        _partition: &Partition,
        record: &NormalizedRecord,
    ) -> Result<(), SinkError> {
        let json_path = self.layout.function_record_path(&record.sha256_hash);
        let json = serde_json::to_string_pretty(record)?;
        fs::write(&json_path, json).map_err(SinkError::io(&json_path))?;

        let source_path = self.layout.function_source_path(&record.sha256_hash, record.language);
        fs::write(&source_path, &record.source_code).map_err(SinkError::io(&source_path))?;

        self.written += 1;
        Ok(())
    }
}

/// Keeps records in memory; handy for library callers and tests.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub records: Vec<(Partition, NormalizedRecord)>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hashes(&self) -> Vec<&str> {
        self.records.iter().map(|(_, r)| r.sha256_hash.as_str()).collect()
    }
}

impl RecordSink for CollectingSink {
    fn write(
        &mut self,
        partition: &Partition,
        record: &NormalizedRecord,
    ) -> Result<(), SinkError> {
        self.records.push((partition.clone(), record.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Language, Split};
    use flate2::read::MultiGzDecoder;
    use std::io::Read;
    use tempfile::tempdir;

    fn record(hash: &str, language: Language) -> NormalizedRecord {
        NormalizedRecord {
            language,
            identifier_scope: None,
            identifier: "f".into(),
            target_tokens: vec!["f".into()],
            source_tokens: vec![],
            elided_tokens: vec![],
            source_code: "body".into(),
            sha256_hash: hash.into(),
            split: None,
            from_file: None,
        }
    }

    fn read_gz(path: &Path) -> String {
        let mut out = String::new();
        MultiGzDecoder::new(File::open(path).unwrap()).read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn json_lines_sink_writes_one_object_per_line() {
        let mut sink = JsonLinesSink::new(Vec::new(), "<memory>");
        sink.write(&Partition::Single, &record("a", Language::Go)).unwrap();
        sink.write(&Partition::Single, &record("b", Language::Go)).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: NormalizedRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed.sha256_hash, "b");
    }

    #[test]
    fn gzip_sink_separates_partitions() {
        let dir = tempdir().unwrap();
        let mut sink = PartitionedGzipSink::new(OutputLayout::new(dir.path()));
        sink.open(&Partition::Split(Split::Test)).unwrap();
        sink.write(&Partition::Split(Split::Train), &record("a", Language::Python)).unwrap();
        sink.write(&Partition::Split(Split::Train), &record("b", Language::Python)).unwrap();
        sink.write(&Partition::Split(Split::Valid), &record("c", Language::Python)).unwrap();
        sink.finish().unwrap();

        assert_eq!(read_gz(&dir.path().join("train.jsonl.gz")).lines().count(), 2);
        assert_eq!(read_gz(&dir.path().join("valid.jsonl.gz")).lines().count(), 1);
        assert_eq!(read_gz(&dir.path().join("test.jsonl.gz")), "");
    }

    #[test]
    fn reopening_a_closed_partition_appends() {
        let dir = tempdir().unwrap();
        let mut sink = PartitionedGzipSink::new(OutputLayout::new(dir.path()));
        let first = Partition::Directory(PathBuf::from("/data/repo"));
        // Collapses onto the same mirror path as `first`.
        let second = Partition::Directory(PathBuf::from("data/repo"));

        sink.write(&first, &record("a", Language::Go)).unwrap();
        sink.close(&first).unwrap();
        sink.open(&second).unwrap();
        sink.write(&second, &record("b", Language::Go)).unwrap();
        sink.close(&second).unwrap();
        sink.open(&first).unwrap();
        sink.finish().unwrap();

        let text = read_gz(&dir.path().join("data/repo").join(crate::layout::MIRROR_FILE_NAME));
        let hashes: Vec<String> = text
            .lines()
            .map(|l| serde_json::from_str::<NormalizedRecord>(l).unwrap().sha256_hash)
            .collect();
        assert_eq!(hashes, vec!["a", "b"]);
    }

    #[test]
    fn per_function_sink_writes_json_and_source() {
        let dir = tempdir().unwrap();
        let mut sink = PerFunctionSink::new(OutputLayout::new(dir.path())).unwrap();
        sink.write(&Partition::Single, &record("abc", Language::Java)).unwrap();

        assert_eq!(sink.written(), 1);
        assert_eq!(fs::read_to_string(dir.path().join("abc.java")).unwrap(), "body");
        let json = fs::read_to_string(dir.path().join("abc.json")).unwrap();
        assert!(json.contains("\n  \"sha256_hash\": \"abc\""));
    }
}
