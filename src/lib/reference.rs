//! Transcript reference: per-feature lengths and the feature-to-group index.
//!
//! Features are numbered `1..=M` in the order they appear in the features table.
//! Groups are numbered `0..m` and own contiguous runs of features, described by a
//! monotone start table: group `g` owns the 1-based feature ids
//! `group_start[g] + 1 ..= group_start[g + 1]`.
//!
//! The features table is a TSV with (at least) the columns `name`, `group`,
//! `total_length` and `full_length`. All features of a group must be adjacent.

use crate::errors::CiError;
use anyhow::{Context, Result};
use fgoxide::io::DelimFile;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::Range;
use std::path::Path;

/// One row of the features table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Feature (transcript) name.
    pub name: String,
    /// Name of the group (gene) the feature belongs to.
    pub group: String,
    /// Total length, including any untemplated tail.
    pub total_length: u32,
    /// Full (untruncated) length of the feature body.
    pub full_length: u32,
}

/// A quantification unit with the lengths needed for effective-length correction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub name: String,
    pub total_length: u32,
    pub full_length: u32,
}

/// Maps group ids to the contiguous range of feature ids they own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupIndex {
    starts: Vec<usize>,
}

impl GroupIndex {
    /// Build a group index from its start table.
    ///
    /// # Errors
    ///
    /// Returns an error unless the table has at least two entries, begins at 0 and is
    /// strictly increasing (so that every group owns at least one feature).
    pub fn from_starts(starts: Vec<usize>) -> crate::errors::Result<Self> {
        let invalid = |reason: String| CiError::InvalidParameter {
            parameter: "group_start".to_string(),
            reason,
        };
        if starts.len() < 2 {
            return Err(invalid(format!("need at least one group, got {} entries", starts.len())));
        }
        if starts[0] != 0 {
            return Err(invalid(format!("first entry must be 0, got {}", starts[0])));
        }
        if let Some(w) = starts.windows(2).find(|w| w[1] <= w[0]) {
            return Err(invalid(format!("entries must be strictly increasing ({} then {})", w[0], w[1])));
        }
        Ok(Self { starts })
    }

    /// Number of groups (`m`).
    #[must_use]
    pub fn num_groups(&self) -> usize {
        self.starts.len() - 1
    }

    /// Number of features (`M`).
    #[must_use]
    pub fn num_features(&self) -> usize {
        self.starts[self.starts.len() - 1]
    }

    /// The raw start entry for group `g` (0-based offset of its first feature).
    #[must_use]
    pub fn start(&self, group: usize) -> usize {
        self.starts[group]
    }

    /// Number of features owned by `group`.
    #[must_use]
    pub fn group_size(&self, group: usize) -> usize {
        self.starts[group + 1] - self.starts[group]
    }

    /// The 1-based feature ids owned by `group`.
    #[must_use]
    pub fn features(&self, group: usize) -> Range<usize> {
        (self.starts[group] + 1)..(self.starts[group + 1] + 1)
    }

    /// The 1-based feature ids owned by a contiguous range of groups.
    #[must_use]
    pub fn features_in(&self, groups: &Range<usize>) -> Range<usize> {
        (self.starts[groups.start] + 1)..(self.starts[groups.end] + 1)
    }
}

/// The loaded reference: features in id order plus their grouping.
#[derive(Debug, Clone)]
pub struct Reference {
    features: Vec<Feature>,
    group_names: Vec<String>,
    groups: GroupIndex,
}

impl Reference {
    /// Load a reference from a features TSV.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is empty, has a feature whose
    /// lengths are inconsistent, or lists a group's features non-contiguously.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let records: Vec<FeatureRecord> = DelimFile::default()
            .read_tsv(&path)
            .with_context(|| format!("Failed to read features table: {}", path.display()))?;
        Self::from_records(records).with_context(|| format!("Invalid features table: {}", path.display()))
    }

    /// Build a reference from parsed feature records.
    ///
    /// # Errors
    ///
    /// See [`Reference::from_tsv`].
    pub fn from_records(records: Vec<FeatureRecord>) -> crate::errors::Result<Self> {
        if records.is_empty() {
            return Err(CiError::InvalidParameter {
                parameter: "features".to_string(),
                reason: "the features table has no rows".to_string(),
            });
        }

        let mut features = Vec::with_capacity(records.len());
        let mut group_names: Vec<String> = Vec::new();
        let mut starts = vec![0usize];
        let mut seen_groups: HashSet<String> = HashSet::new();

        for (index, record) in records.into_iter().enumerate() {
            if record.full_length == 0 || record.full_length > record.total_length {
                return Err(CiError::InvalidParameter {
                    parameter: "features".to_string(),
                    reason: format!(
                        "feature '{}' has full_length {} and total_length {} (need 0 < full <= total)",
                        record.name, record.full_length, record.total_length
                    ),
                });
            }

            if group_names.last() != Some(&record.group) {
                if !seen_groups.insert(record.group.clone()) {
                    return Err(CiError::InvalidParameter {
                        parameter: "features".to_string(),
                        reason: format!(
                            "features of group '{}' are not contiguous (seen again at feature '{}')",
                            record.group, record.name
                        ),
                    });
                }
                if index > 0 {
                    starts.push(index);
                }
                group_names.push(record.group);
            }

            features.push(Feature {
                name: record.name,
                total_length: record.total_length,
                full_length: record.full_length,
            });
        }
        starts.push(features.len());

        let groups = GroupIndex::from_starts(starts)?;
        Ok(Self { features, group_names, groups })
    }

    /// Number of features (`M`).
    #[must_use]
    pub fn num_features(&self) -> usize {
        self.features.len()
    }

    /// Number of groups (`m`).
    #[must_use]
    pub fn num_groups(&self) -> usize {
        self.group_names.len()
    }

    /// Feature by 1-based id.
    #[must_use]
    pub fn feature(&self, id: usize) -> &Feature {
        &self.features[id - 1]
    }

    /// All features in id order (index 0 holds feature 1).
    #[must_use]
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Group names in group-id order.
    #[must_use]
    pub fn group_names(&self) -> &[String] {
        &self.group_names
    }

    /// The feature-to-group index.
    #[must_use]
    pub fn groups(&self) -> &GroupIndex {
        &self.groups
    }
}
