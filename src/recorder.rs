use log::info;
use serde::{de::DeserializeOwned, Serialize};
use std::{io::Write, path::PathBuf};

use crate::error::SiglentError;

/// Buffered JSON Lines writer for captured traces and status snapshots.
///
/// Records are appended to the file on [`Recorder::flush`], when the buffer
/// fills up, and when the recorder is dropped.
#[derive(Debug)]
pub struct Recorder<T>
where
    T: Serialize + DeserializeOwned,
{
    buffer: Vec<T>,
    buffer_size: usize,
    file_path: PathBuf,
}

impl<T> Recorder<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new<P: Into<PathBuf>>(file_path: P, buffer_size: usize) -> Self {
        let mut path = file_path.into();
        if path.extension().is_none() {
            path.set_extension("jsonl");
        }

        Self {
            buffer: Vec::with_capacity(buffer_size),
            buffer_size: buffer_size.max(1),
            file_path: path,
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.file_path
    }

    pub fn add(&mut self, record: T) -> Result<(), SiglentError> {
        self.buffer.push(record);

        if self.buffer.len() >= self.buffer_size {
            self.flush()?;
        }

        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), SiglentError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)
            .map_err(|source| SiglentError::Io {
                source,
                context: format!("Could not open record file at {:?}", self.file_path),
            })?;

        let mut writer = std::io::BufWriter::new(file);
        for record in &self.buffer {
            let line = serde_json::to_string(record)?;
            writeln!(writer, "{}", line).map_err(|source| SiglentError::Io {
                source,
                context: format!("Could not write to {:?}", self.file_path),
            })?;
        }
        writer.flush().map_err(|source| SiglentError::Io {
            source,
            context: format!("Could not write to {:?}", self.file_path),
        })?;

        info!(
            "Recorded {} entries to {:?}",
            self.buffer.len(),
            self.file_path
        );
        self.buffer.clear();
        Ok(())
    }

    /// Read every record written so far, including unflushed ones
    pub fn read_all(&mut self) -> Result<Vec<T>, SiglentError> {
        self.flush()?;

        let content =
            std::fs::read_to_string(&self.file_path).map_err(|source| SiglentError::Io {
                source,
                context: format!("Could not read record file at {:?}", self.file_path),
            })?;

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(SiglentError::from))
            .collect()
    }

    /// Number of buffered, not yet written records
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl<T> Drop for Recorder<T>
where
    T: Serialize + DeserializeOwned,
{
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            log::error!("Failed to flush recorder on drop: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Trace, TraceIndex};

    fn temp_path(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "siglent_sa_recorder_{}_{}.jsonl",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        path
    }

    #[test]
    fn test_adds_extension() {
        let recorder: Recorder<Trace> = Recorder::new(std::env::temp_dir().join("traces"), 4);
        assert_eq!(
            recorder.path().extension(),
            Some(std::ffi::OsStr::new("jsonl"))
        );
    }

    #[test]
    fn test_buffer_flushes_when_full() {
        let path = temp_path("full");
        let mut recorder = Recorder::new(&path, 2);

        recorder
            .add(Trace::new(TraceIndex::new(1).unwrap(), vec![-80.0, -70.0]))
            .unwrap();
        assert_eq!(recorder.len(), 1);
        assert!(!path.exists());

        recorder
            .add(Trace::new(TraceIndex::new(2).unwrap(), vec![-60.0]))
            .unwrap();
        assert!(recorder.is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 2);

        drop(recorder);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_round_trip_through_file() {
        let path = temp_path("round_trip");
        let first = Trace::new(TraceIndex::new(3).unwrap(), vec![-91.5, -42.25, -88.0]);
        {
            let mut recorder = Recorder::new(&path, 100);
            recorder.add(first.clone()).unwrap();
        }

        let mut recorder: Recorder<Trace> = Recorder::new(&path, 100);
        let records = recorder.read_all().unwrap();
        assert_eq!(records, vec![first]);

        drop(recorder);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_unwritable_path() {
        let mut recorder = Recorder::new("/nonexistent/dir/traces.jsonl", 1);
        let trace = Trace::new(TraceIndex::new(1).unwrap(), vec![0.0]);
        assert!(matches!(
            recorder.add(trace),
            Err(SiglentError::Io { .. })
        ));
    }
}
