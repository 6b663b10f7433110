use serde::{Deserialize, Serialize};

use crate::canonical::{DemandPiece, PieceStore};
use crate::packer::Packer;
use crate::types::{Rect, StockUnit};

/// Diagnostic for demand that no stock unit can ever hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeasibilityReport {
    pub unusable_pieces: Vec<DemandPiece>,
    pub considered_stock: Vec<StockUnit>,
}

impl FeasibilityReport {
    pub fn is_feasible(&self) -> bool {
        self.unusable_pieces.is_empty()
    }

    /// One label per unusable template, in demand order.
    pub fn unusable_labels(&self) -> Vec<String> {
        piece_labels(self.unusable_pieces.iter())
    }
}

pub(crate) fn piece_labels<'a>(pieces: impl Iterator<Item = &'a DemandPiece>) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    let mut seen: Vec<&str> = Vec::new();
    for p in pieces {
        if seen.contains(&p.id.as_str()) {
            continue;
        }
        seen.push(&p.id);
        labels.push(format!("{} ({})", p.name, p.size()));
    }
    labels
}

/// A piece fits a stock unit iff it fits in either orientation.
pub fn fits(piece: Rect, stock: Rect) -> bool {
    piece.fits_either(&stock)
}

pub fn assess(store: &PieceStore, stock: &[StockUnit]) -> FeasibilityReport {
    let unusable_pieces: Vec<DemandPiece> = store
        .iter()
        .filter(|p| !stock.iter().any(|s| fits(p.size(), s.size())))
        .cloned()
        .collect();

    if !unusable_pieces.is_empty() {
        tracing::debug!(
            unusable = unusable_pieces.len(),
            stock = stock.len(),
            "demand contains pieces that fit no stock"
        );
    }

    FeasibilityReport {
        unusable_pieces,
        considered_stock: stock.to_vec(),
    }
}

/// Pieces that pass the raw fit test somewhere but cannot be placed on any
/// stock once the packer's insets and orientation rules apply.
pub fn profile_mismatches<'a>(
    store: &'a PieceStore,
    stock: &[StockUnit],
    packer: &Packer,
) -> Vec<&'a DemandPiece> {
    store
        .iter()
        .filter(|p| stock.iter().any(|s| fits(p.size(), s.size())))
        .filter(|p| !stock.iter().any(|s| packer.can_hold(s.size(), p.size())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DemandRequest, NestingMode, PackingProfile};

    #[test]
    fn test_piece_too_large_for_catalog() {
        let store = PieceStore::expand(&[DemandRequest::new("P", 200, 2000, 1)]);
        let stock = vec![StockUnit::new("S3", 100, 100)];
        let report = assess(&store, &stock);
        assert!(!report.is_feasible());
        assert_eq!(report.unusable_pieces.len(), 1);
        assert_eq!(report.considered_stock, stock);
        assert_eq!(report.unusable_labels(), vec!["P (200x2000)".to_string()]);
    }

    #[test]
    fn test_rotation_counts_as_fit() {
        let store = PieceStore::expand(&[DemandRequest::new("P", 50, 100, 2)]);
        let report = assess(&store, &[StockUnit::new("S", 100, 50)]);
        assert!(report.is_feasible());
    }

    #[test]
    fn test_unusable_iff_no_stock_fits() {
        let store = PieceStore::expand(&[
            DemandRequest::new("small", 10, 10, 1),
            DemandRequest::new("wide", 150, 20, 1),
            DemandRequest::new("huge", 300, 300, 2),
        ]);
        let stock = vec![StockUnit::new("A", 100, 100), StockUnit::new("B", 20, 200)];
        let report = assess(&store, &stock);
        for p in store.iter() {
            let fits_any = stock.iter().any(|s| fits(p.size(), s.size()));
            assert_eq!(!fits_any, report.unusable_pieces.contains(p));
        }
        assert_eq!(report.unusable_pieces.len(), 2);
        assert_eq!(report.unusable_labels(), vec!["huge (300x300)".to_string()]);
    }

    #[test]
    fn test_empty_catalog_marks_everything_unusable() {
        let store = PieceStore::expand(&[DemandRequest::new("P", 1, 1, 3)]);
        let report = assess(&store, &[]);
        assert_eq!(report.unusable_pieces.len(), 3);
    }

    #[test]
    fn test_border_creates_profile_mismatch() {
        let store = PieceStore::expand(&[DemandRequest::new("P", 100, 100, 1)]);
        let stock = vec![StockUnit::new("S", 100, 100)];
        let tight = Packer::new(&PackingProfile::new(0, 5), NestingMode::Sheet);
        assert_eq!(profile_mismatches(&store, &stock, &tight).len(), 1);
        let loose = Packer::new(&PackingProfile::new(0, 0), NestingMode::Sheet);
        assert!(profile_mismatches(&store, &stock, &loose).is_empty());
    }
}
