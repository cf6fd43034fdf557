use anyhow::{anyhow, Result};
use rayon::prelude::*;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::scanner::FileEntry;
use crate::walker::{chunk_file, ChunkedFile};

/// Result of processing one file in a batch.
#[derive(Debug)]
pub struct FileOutcome<T> {
    pub entry: FileEntry,
    pub result: Result<T>,
}

#[derive(Debug)]
pub struct BatchReport<T> {
    /// Same order as the input entries.
    pub outcomes: Vec<FileOutcome<T>>,
}

impl<T> BatchReport<T> {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run `job` on every entry in parallel, one isolated unit per file.
///
/// An error or panic in one file is recorded in that file's outcome and
/// logged; the other files are unaffected. `workers == 0` uses rayon's
/// default thread count.
pub fn run_batch<T, F>(entries: &[FileEntry], workers: usize, job: F) -> Result<BatchReport<T>>
where
    T: Send,
    F: Fn(&FileEntry) -> Result<T> + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new().num_threads(workers).build()?;

    let outcomes = pool.install(|| {
        entries
            .par_iter()
            .map(|entry| {
                let result = match catch_unwind(AssertUnwindSafe(|| job(entry))) {
                    Ok(r) => r,
                    Err(payload) => Err(anyhow!(
                        "panicked while processing {}: {}",
                        entry.rel_path.display(),
                        panic_message(payload.as_ref())
                    )),
                };
                if let Err(e) = &result {
                    eprintln!("[batch] WARN: {}: {e:#}", entry.rel_path.display());
                }
                FileOutcome {
                    entry: entry.clone(),
                    result,
                }
            })
            .collect()
    });

    Ok(BatchReport { outcomes })
}

/// Chunk every entry in parallel.
pub fn chunk_files(entries: &[FileEntry], workers: usize) -> Result<BatchReport<ChunkedFile>> {
    run_batch(entries, workers, |entry| chunk_file(&entry.abs_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn entry(root: &Path, rel: &str, content: &str) -> FileEntry {
        let abs_path = root.join(rel);
        std::fs::write(&abs_path, content).unwrap();
        FileEntry {
            abs_path,
            rel_path: PathBuf::from(rel),
            bytes: content.len() as u64,
        }
    }

    #[test]
    fn chunks_every_file_in_input_order() {
        let tmp = TempDir::new().unwrap();
        let entries = vec![
            entry(tmp.path(), "a.py", "def a():\n    return 1\n"),
            entry(tmp.path(), "b.py", "x = 1\n"),
            entry(tmp.path(), "c.ts", "function c() { return 2; }\n"),
        ];

        let report = chunk_files(&entries, 2).unwrap();
        assert_eq!(report.succeeded(), 3);
        let names: Vec<_> = report.outcomes.iter().map(|o| o.entry.rel_path.clone()).collect();
        assert_eq!(
            names,
            vec![PathBuf::from("a.py"), PathBuf::from("b.py"), PathBuf::from("c.ts")]
        );

        let a = report.outcomes[0].result.as_ref().unwrap();
        assert!(a.declarations.contains("a"));
        let c = report.outcomes[2].result.as_ref().unwrap();
        assert!(c.declarations.contains("c"));
    }

    #[test]
    fn missing_file_fails_alone() {
        let tmp = TempDir::new().unwrap();
        let mut entries = vec![entry(tmp.path(), "ok.py", "def ok():\n    pass\n")];
        entries.push(FileEntry {
            abs_path: tmp.path().join("gone.py"),
            rel_path: PathBuf::from("gone.py"),
            bytes: 0,
        });

        let report = chunk_files(&entries, 0).unwrap();
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert!(report.outcomes[1].result.is_err());
    }

    #[test]
    fn panics_are_contained_per_file() {
        let tmp = TempDir::new().unwrap();
        let entries = vec![
            entry(tmp.path(), "good.py", "x = 1\n"),
            entry(tmp.path(), "bad.py", "x = 2\n"),
            entry(tmp.path(), "also_good.py", "x = 3\n"),
        ];

        let report = run_batch(&entries, 2, |e| {
            if e.rel_path == Path::new("bad.py") {
                panic!("cursor consume out of order");
            }
            Ok(e.bytes)
        })
        .unwrap();

        assert_eq!(report.succeeded(), 2);
        let err = report.outcomes[1].result.as_ref().unwrap_err();
        assert!(err.to_string().contains("out of order"));
        assert_eq!(*report.outcomes[2].result.as_ref().unwrap(), 6);
    }
}
