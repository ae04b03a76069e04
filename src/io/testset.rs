//! Test-set lists and reference labels.
//!
//! A test set is a list of utterance ids, one per line. Utterance `id` has
//! its features at `<mfc_dir>/<id>.mfc` and, for verification, the word
//! actually spoken on the first line of `<label_dir>/<id>.lab`.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Where an utterance's feature and label files live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestLayout {
    pub mfc_dir: PathBuf,
    pub label_dir: PathBuf,
}

impl Default for TestLayout {
    fn default() -> Self {
        Self {
            mfc_dir: PathBuf::from("mfc"),
            label_dir: PathBuf::from("label"),
        }
    }
}

impl TestLayout {
    pub fn new(mfc_dir: impl Into<PathBuf>, label_dir: impl Into<PathBuf>) -> Self {
        Self {
            mfc_dir: mfc_dir.into(),
            label_dir: label_dir.into(),
        }
    }

    pub fn features_path(&self, id: &str) -> PathBuf {
        self.mfc_dir.join(format!("{id}.mfc"))
    }

    pub fn label_path(&self, id: &str) -> PathBuf {
        self.label_dir.join(format!("{id}.lab"))
    }
}

/// Utterance ids in file order; blank lines are skipped.
pub fn parse_test_set<R: BufRead>(reader: R) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let id = line.trim();
        if !id.is_empty() {
            ids.push(id.to_string());
        }
    }
    Ok(ids)
}

pub fn read_test_set(path: impl AsRef<Path>) -> Result<Vec<String>> {
    parse_test_set(super::open(path.as_ref())?)
}

/// First line of a label file, trimmed; `None` if the file is empty.
pub fn parse_label<R: BufRead>(reader: R) -> Result<Option<String>> {
    match reader.lines().next() {
        Some(line) => {
            let line = line?;
            let word = line.trim();
            Ok((!word.is_empty()).then(|| word.to_string()))
        }
        None => Ok(None),
    }
}

pub fn read_label(path: impl AsRef<Path>) -> Result<Option<String>> {
    parse_label(super::open(path.as_ref())?)
}
