//! Directory tree built from a partition's flat entry array.
//!
//! A directory at flat index `i` owns the entries `[i + 1, last_row_in_dir)`.
//! The builder walks the array once with a cursor, so every entry is visited
//! exactly once and the cursor finishes at the entry count.

use wud_core::util::{is_safe_component, join_path};

use crate::engine::HashMode;
use crate::fst::FlatEntry;
use crate::partition::Partition;

/// A file, located within its partition.
#[derive(Debug, Clone)]
pub struct File<'p> {
    pub parent_path: String,
    pub name: String,
    pub volume_base_offset: u64,
    pub cluster_data_offset: u64,
    pub offset_in_cluster: u64,
    pub size: u64,
    pub partition: &'p Partition,
    pub entry_id: usize,
}

impl<'p> File<'p> {
    /// Locate the file at `entry_id`.
    ///
    /// Returns `None` for directories, for names that are not a single path
    /// component, and for files whose starting cluster is not in the cluster
    /// table (both logged).
    pub fn from_entry(partition: &'p Partition, entry_id: usize, parent_path: &str) -> Option<Self> {
        let entry = partition.entries.get(entry_id)?;
        if entry.is_directory() {
            return None;
        }
        if !is_safe_component(&entry.name) {
            log::warn!(
                "{}: skipping file {:?} in {}, not a plain file name",
                partition.name,
                entry.name,
                parent_path
            );
            return None;
        }

        let Some(cluster) = partition.cluster(entry.starting_cluster) else {
            log::warn!(
                "{}: skipping {}, cluster {} out of range ({} clusters)",
                partition.name,
                join_path(parent_path, &entry.name),
                entry.starting_cluster,
                partition.clusters.len()
            );
            return None;
        };

        Some(Self {
            parent_path: parent_path.to_string(),
            name: entry.name.clone(),
            volume_base_offset: partition.offset,
            cluster_data_offset: cluster.offset,
            offset_in_cluster: entry.offset_in_cluster,
            size: entry.size(),
            partition,
            entry_id,
        })
    }

    pub fn entry(&self) -> &'p FlatEntry {
        &self.partition.entries[self.entry_id]
    }

    pub fn cluster_id(&self) -> u16 {
        self.entry().starting_cluster
    }

    pub fn hash_mode(&self) -> HashMode {
        HashMode::select(self.entry(), self.partition.cluster(self.cluster_id()))
    }

    /// Path relative to the output root.
    pub fn path(&self) -> String {
        join_path(&self.parent_path, &self.name)
    }
}

#[derive(Debug, Clone)]
pub struct Directory<'p> {
    pub name: String,
    pub parent_path: String,
    pub directories: Vec<Directory<'p>>,
    pub files: Vec<File<'p>>,
}

impl<'p> Directory<'p> {
    fn new(name: &str, parent_path: &str) -> Self {
        Self {
            name: name.to_string(),
            parent_path: parent_path.to_string(),
            directories: Vec::new(),
            files: Vec::new(),
        }
    }

    /// Path relative to the output root.
    pub fn path(&self) -> String {
        join_path(&self.parent_path, &self.name)
    }

    /// Number of files in this directory and all subdirectories.
    pub fn file_count(&self) -> usize {
        self.files.len()
            + self
                .directories
                .iter()
                .map(Directory::file_count)
                .sum::<usize>()
    }

    /// Total bytes of all files below this directory.
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum::<u64>()
            + self
                .directories
                .iter()
                .map(Directory::total_size)
                .sum::<u64>()
    }
}

/// Build the tree for a partition.
///
/// The root is named after the partition and placed under `parent_path`.
pub fn build_tree<'p>(partition: &'p Partition, parent_path: &str) -> Directory<'p> {
    let mut root = Directory::new(&partition.name, parent_path);
    let mut cursor = 1;
    let end = partition
        .entries
        .first()
        .and_then(FlatEntry::last_row_in_dir)
        .unwrap_or(0);
    build_children(partition, &mut root, end, &mut cursor);

    if cursor != partition.total_entries() {
        log::warn!(
            "{}: directory walk stopped at entry {} of {}",
            partition.name,
            cursor,
            partition.total_entries()
        );
    }
    root
}

/// Consume entries `[*cursor, end)` into `dir`, leaving the cursor at `end`.
fn build_children<'p>(
    partition: &'p Partition,
    dir: &mut Directory<'p>,
    end: usize,
    cursor: &mut usize,
) {
    let end = end.min(partition.total_entries()).max(*cursor);
    let path = dir.path();

    while *cursor < end {
        let entry_id = *cursor;
        let entry = &partition.entries[entry_id];
        *cursor += 1;

        match entry.last_row_in_dir() {
            Some(last_row) => {
                let mut child = Directory::new(&entry.name, &path);
                build_children(partition, &mut child, last_row.min(end), cursor);
                if is_safe_component(&entry.name) {
                    dir.directories.push(child);
                } else {
                    log::warn!(
                        "{}: skipping directory {:?} in {} ({} files), not a plain directory name",
                        partition.name,
                        entry.name,
                        path,
                        child.file_count()
                    );
                }
            }
            None => {
                if let Some(file) = File::from_entry(partition, entry_id, &path) {
                    dir.files.push(file);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/tree_tests.rs"]
mod tests;
