//! Gzip-compressed JSON-lines dataset splits
//!
//! Each dataset directory holds `training`, `validation` and `testing` splits
//! as `{split}.jsonl.gz`, one window per line. Readers stream windows lazily so
//! the synchronization loop never holds the whole stream in memory.

use super::sample::Sample;
use crate::error::{Error, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::{Path, PathBuf};

/// Named split inside a dataset directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Training,
    Validation,
    Testing,
}

impl Split {
    /// Directory entry name of the split
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Training => "training",
            Split::Validation => "validation",
            Split::Testing => "testing",
        }
    }

    /// Path of this split inside a dataset directory
    pub fn path_in(&self, dataset_dir: &Path) -> PathBuf {
        dataset_dir.join(format!("{}.jsonl.gz", self.as_str()))
    }
}

/// Streaming reader over one split file
pub struct SplitReader {
    path: PathBuf,
    lines: Lines<BufReader<GzDecoder<BufReader<File>>>>,
    line_no: usize,
}

impl SplitReader {
    /// Open a split file for streaming
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)
            .map_err(|e| Error::dataset(&path, format!("cannot open split: {e}")))?;
        let decoder = GzDecoder::new(BufReader::new(file));
        Ok(Self { path, lines: BufReader::new(decoder).lines(), line_no: 0 })
    }

    /// Open a named split of a dataset directory
    pub fn open_split(dataset_dir: &Path, split: Split) -> Result<Self> {
        Self::open(split.path_in(dataset_dir))
    }

    /// Path being read
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Iterator for SplitReader {
    type Item = Result<Sample>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(Error::dataset(&self.path, format!("read failed: {e}")))),
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            let parsed = serde_json::from_str::<Sample>(&line)
                .map_err(|e| Error::dataset(&self.path, format!("line {}: {e}", self.line_no)))
                .and_then(|sample| {
                    sample.validate().map_err(|e| {
                        Error::dataset(&self.path, format!("line {}: {e}", self.line_no))
                    })?;
                    Ok(sample)
                });
            return Some(parsed);
        }
    }
}

/// Read a whole split into memory (training and validation splits)
pub fn load_split(dataset_dir: &Path, split: Split) -> Result<Vec<Sample>> {
    let samples = SplitReader::open_split(dataset_dir, split)?.collect::<Result<Vec<_>>>()?;
    if samples.is_empty() {
        return Err(Error::dataset(split.path_in(dataset_dir), "split contains no windows"));
    }
    Ok(samples)
}

/// Write windows as a gzip-compressed JSON-lines split
pub fn write_split(path: impl AsRef<Path>, samples: &[Sample]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let writer = BufWriter::new(File::create(path)?);
    let mut encoder = GzEncoder::new(writer, Compression::default());
    for sample in samples {
        serde_json::to_writer(&mut encoder, sample)?;
        encoder.write_all(b"\n")?;
    }
    encoder.finish()?.flush()?;
    Ok(())
}

/// Lazily concatenated stream over several split files
///
/// Files are opened only when the previous one is exhausted.
pub struct ConcatStream {
    pending: std::vec::IntoIter<PathBuf>,
    current: Option<SplitReader>,
}

impl ConcatStream {
    /// Stream the given split files back to back
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { pending: paths.into_iter(), current: None }
    }
}

impl Iterator for ConcatStream {
    type Item = Result<Sample>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(reader) = self.current.as_mut() {
                if let Some(item) = reader.next() {
                    return Some(item);
                }
                self.current = None;
            }
            let path = self.pending.next()?;
            match SplitReader::open(&path) {
                Ok(reader) => self.current = Some(reader),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample::fixtures::tiny_sample;
    use tempfile::TempDir;

    #[test]
    fn test_split_paths() {
        let dir = Path::new("/d/experiment_100_cv");
        assert_eq!(Split::Training.path_in(dir), PathBuf::from("/d/experiment_100_cv/training.jsonl.gz"));
        assert_eq!(Split::Testing.as_str(), "testing");
    }

    #[test]
    fn test_write_then_stream() {
        let tmp = TempDir::new().unwrap();
        let path = Split::Testing.path_in(tmp.path());
        let samples = vec![tiny_sample(&[1.0, 2.0]), tiny_sample(&[3.0])];
        write_split(&path, &samples).unwrap();

        let read: Vec<Sample> = SplitReader::open(&path).unwrap().map(|s| s.unwrap()).collect();
        assert_eq!(read, samples);
    }

    #[test]
    fn test_missing_split_is_dataset_error() {
        let tmp = TempDir::new().unwrap();
        let err = load_split(tmp.path(), Split::Training).err().unwrap();
        assert!(matches!(err, Error::Dataset { .. }));
    }

    #[test]
    fn test_empty_split_rejected() {
        let tmp = TempDir::new().unwrap();
        write_split(Split::Validation.path_in(tmp.path()), &[]).unwrap();
        assert!(load_split(tmp.path(), Split::Validation).is_err());
    }

    #[test]
    fn test_invalid_window_reports_line() {
        let tmp = TempDir::new().unwrap();
        let mut bad = tiny_sample(&[1.0, 2.0]);
        bad.labels.push(9.0);
        let path = tmp.path().join("testing.jsonl.gz");
        write_split(&path, &[tiny_sample(&[1.0]), bad]).unwrap();

        let results: Vec<_> = SplitReader::open(&path).unwrap().collect();
        assert!(results[0].is_ok());
        let msg = results[1].as_ref().unwrap_err().to_string();
        assert!(msg.contains("line 2"));
    }

    #[test]
    fn test_concat_preserves_order() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a.jsonl.gz");
        let b = tmp.path().join("b.jsonl.gz");
        write_split(&a, &[tiny_sample(&[1.0]), tiny_sample(&[2.0])]).unwrap();
        write_split(&b, &[tiny_sample(&[3.0])]).unwrap();

        let traffic: Vec<f32> = ConcatStream::new(vec![a, b])
            .map(|s| s.unwrap().features.flow_traffic[0])
            .collect();
        assert_eq!(traffic, vec![1.0, 2.0, 3.0]);
    }
}
