//! Demand expansion and canonical remaining-set signatures.
//!
//! Quantities are expanded into individually addressable instances kept in an
//! immutable [`PieceStore`]. Search state only ever holds sorted handles into
//! that store, so removal is handle exclusion and identity comparisons are exact.

use serde::{Deserialize, Serialize};

use crate::types::{DemandRequest, Rect};

/// Stable handle of one expanded piece instance.
pub type PieceId = usize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandPiece {
    /// Template identity shared by every copy of a demand line.
    pub id: String,
    pub instance_id: PieceId,
    pub name: String,
    pub width: u32,
    pub length: u32,
}

impl DemandPiece {
    pub fn size(&self) -> Rect {
        Rect::new(self.width, self.length)
    }

    pub fn area(&self) -> u64 {
        self.size().area()
    }
}

/// Swaps the pair so that `length >= width`.
pub fn normalize(width: u32, length: u32) -> (u32, u32) {
    if width > length {
        (length, width)
    } else {
        (width, length)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PieceStore {
    pieces: Vec<DemandPiece>,
}

impl PieceStore {
    /// Expands every demand line into `quantity` normalized instances.
    pub fn expand(demand: &[DemandRequest]) -> Self {
        let mut pieces = Vec::new();
        for d in demand {
            let (width, length) = normalize(d.width, d.length);
            let name = if d.name.is_empty() {
                d.template_id.clone()
            } else {
                d.name.clone()
            };
            for _ in 0..d.quantity {
                pieces.push(DemandPiece {
                    id: d.template_id.clone(),
                    instance_id: pieces.len(),
                    name: name.clone(),
                    width,
                    length,
                });
            }
        }
        Self { pieces }
    }

    pub fn get(&self, id: PieceId) -> &DemandPiece {
        &self.pieces[id]
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DemandPiece> {
        self.pieces.iter()
    }

    /// Every instance in the store.
    pub fn all(&self) -> Remaining {
        Remaining((0..self.pieces.len()).collect())
    }

    pub fn area_of(&self, remaining: &Remaining) -> u64 {
        remaining.iter().map(|id| self.get(id).area()).sum()
    }
}

/// Sorted, duplicate-free set of piece handles still to be placed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Remaining(Vec<PieceId>);

impl Remaining {
    pub fn from_ids(ids: impl IntoIterator<Item = PieceId>) -> Self {
        let mut ids: Vec<PieceId> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        Self(ids)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = PieceId> + '_ {
        self.0.iter().copied()
    }

    pub fn contains(&self, id: PieceId) -> bool {
        self.0.binary_search(&id).is_ok()
    }

    /// The set minus `placed`.
    pub fn without(&self, placed: &[PieceId]) -> Self {
        let mut placed = placed.to_vec();
        placed.sort_unstable();
        Self(
            self.0
                .iter()
                .copied()
                .filter(|id| placed.binary_search(id).is_err())
                .collect(),
        )
    }

    pub fn signature(&self) -> Signature {
        Signature(self.0.clone().into_boxed_slice())
    }
}

/// Order-independent key naming exactly which instances remain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature(Box<[PieceId]>);

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{id}")?;
        }
        Ok(())
    }
}

/// Signature of an arbitrary collection of instances, in any order.
pub fn signature(ids: impl IntoIterator<Item = PieceId>) -> Signature {
    Remaining::from_ids(ids).signature()
}
