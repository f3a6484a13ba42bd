//! Source-to-parcel mapping.
//!
//! Each source carries a parcel id in `0..n_parcels`, or `-1` when it belongs
//! to no parcel. Parcel ids must be contiguous from 0. The grouping of source
//! indices per parcel is built once here and shared by weight normalization
//! and validation.

use crate::error::{FidelityError, Result};

/// Id marking a source that belongs to no parcel.
pub const UNASSIGNED: i32 = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceIdentities {
    ids: Vec<i32>,
    /// Source indices per parcel, in ascending source order.
    groups: Vec<Vec<usize>>,
}

impl SourceIdentities {
    /// Validate a raw identity vector. `n_parcels` is `max(id) + 1`.
    pub fn new(ids: Vec<i32>) -> Result<Self> {
        if let Some((i, &bad)) = ids.iter().enumerate().find(|(_, id)| **id < UNASSIGNED) {
            return Err(FidelityError::MalformedMapping(format!(
                "source {i} has id {bad}; ids must be -1 or a parcel index"
            )));
        }
        // Contiguous ids from 0 need at least `max_id + 1` assigned sources;
        // checked before any per-parcel allocation.
        let n_assigned = ids.iter().filter(|id| **id >= 0).count();
        let n_parcels = match ids.iter().copied().max() {
            Some(max_id) if max_id >= 0 => {
                let max_id = max_id as usize;
                if max_id >= n_assigned {
                    return Err(FidelityError::MalformedMapping(format!(
                        "largest parcel id {max_id} exceeds the {n_assigned} assigned \
                         sources; parcel ids must be contiguous from 0"
                    )));
                }
                max_id + 1
            }
            _ => 0,
        };

        let mut groups = vec![Vec::new(); n_parcels];
        for (i, &id) in ids.iter().enumerate() {
            if id >= 0 {
                groups[id as usize].push(i);
            }
        }
        if let Some(missing) = groups.iter().position(Vec::is_empty) {
            return Err(FidelityError::MalformedMapping(format!(
                "parcel ids are not contiguous: parcel {missing} has no sources \
                 but the largest id is {}",
                n_parcels - 1
            )));
        }

        Ok(Self { ids, groups })
    }

    /// Number of sources, assigned or not.
    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[inline]
    pub fn n_parcels(&self) -> usize {
        self.groups.len()
    }

    /// Parcel of source `i`, or `None` when unassigned.
    #[inline]
    pub fn parcel_of(&self, i: usize) -> Option<usize> {
        let id = self.ids[i];
        (id >= 0).then_some(id as usize)
    }

    /// Source indices belonging to `parcel`.
    #[inline]
    pub fn members(&self, parcel: usize) -> &[usize] {
        &self.groups[parcel]
    }

    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }

    pub fn ids(&self) -> &[i32] {
        &self.ids
    }

    pub fn n_unassigned(&self) -> usize {
        self.ids.iter().filter(|&&id| id < 0).count()
    }
}
