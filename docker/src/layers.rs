//! Layer records and the per-resolution layer index.

use std::collections::HashMap;

use crate::client::SearchEntry;
use crate::digest::Digest;

/// Suffix marking a placeholder layer that has not been materialized in
/// storage yet.
const MARKER_SUFFIX: &str = ".marker";

/// One physical layer file found by the search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerRecord {
    digest: Digest,
    repository: String,
    path: String,
    file_name: String,
    sha1: String,
}

impl LayerRecord {
    /// Build a record from a search-result row. The digest is rebuilt
    /// from the stored file name; a row whose name is not digest-shaped
    /// can only have matched the checksum clause, so its checksum is the
    /// digest.
    pub fn from_entry(entry: &SearchEntry) -> Self {
        let digest = Digest::from_file_name(&entry.name)
            .unwrap_or_else(|| Digest::from_sha1(entry.actual_sha1.clone()));
        Self {
            digest,
            repository: entry.repo.clone(),
            path: entry.path.clone(),
            file_name: entry.name.clone(),
            sha1: entry.actual_sha1.clone(),
        }
    }

    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn sha1(&self) -> &str {
        &self.sha1
    }

    /// Repository-relative download path: `repo/path/name`.
    pub fn full_path(&self) -> String {
        format!("{}/{}/{}", self.repository, self.path, self.file_name)
    }

    /// Whether this record is a placeholder awaiting materialization.
    pub fn is_marker(&self) -> bool {
        self.file_name.ends_with(MARKER_SUFFIX)
    }
}

/// Digest-keyed map of layer records, built fresh per resolution.
#[derive(Debug, Default)]
pub struct LayerIndex {
    records: HashMap<Digest, LayerRecord>,
}

impl LayerIndex {
    /// Build an index from search results. Later rows for the same
    /// digest replace earlier ones; keys stay unique.
    pub fn from_entries(entries: &[SearchEntry]) -> Self {
        let mut records = HashMap::new();
        for entry in entries {
            let record = LayerRecord::from_entry(entry);
            records.insert(record.digest().clone(), record);
        }
        Self { records }
    }

    pub fn get(&self, digest: &Digest) -> Option<&LayerRecord> {
        self.records.get(digest)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records whose file is a `.marker` placeholder.
    pub fn markers(&self) -> Vec<&LayerRecord> {
        self.records.values().filter(|r| r.is_marker()).collect()
    }
}
