//! Single-stock packing.
//!
//! [`Packer`] places as much of a remaining demand set as it can onto one stock
//! unit, using either a free-rotation heuristic behind [`RectPacker`] or the
//! straight-cut shelf algorithm.

use crate::canonical::{PieceId, PieceStore, Remaining};
use crate::feasibility::fits;
use crate::guillotine::GuillotineBin;
use crate::maxrects::MaxRectsBin;
use crate::shelf;
use crate::space::{FIT_RULES, FreeSpace, Region, best_fit};
use crate::types::{
    FreeHeuristic, NestingMode, PackingProfile, PlacedPiece, Placement, Rect, StockLayout,
    StockUnit,
};

/// Cross dimension every bar and piece gets in length mode.
pub const LINEAR_GAUGE: u32 = 1;

/// One item placed by a [`RectPacker`]; `index` points into the input slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packed {
    pub index: usize,
    pub placement: Placement,
}

/// Free-placement capability: pack as many `items` as possible into `bin`,
/// keeping `spacing` between items and `border` from every bin edge.
/// Items that do not fit are simply left out.
pub trait RectPacker {
    fn pack(&self, items: &[Rect], bin: Rect, spacing: u32, border: u32) -> Vec<Packed>;
}

impl RectPacker for FreeHeuristic {
    fn pack(&self, items: &[Rect], bin: Rect, spacing: u32, border: u32) -> Vec<Packed> {
        let Some(usable) = inset(bin, border, border) else {
            return Vec::new();
        };
        let mut packed = match self {
            FreeHeuristic::MaxRects => best_pass::<MaxRectsBin>(items, usable, spacing),
            FreeHeuristic::Guillotine => best_pass::<GuillotineBin>(items, usable, spacing),
        };
        for p in &mut packed {
            p.placement.x += border;
            p.placement.y += border;
        }
        packed
    }
}

/// Greedy passes over the items (largest first) for every fit rule, first
/// with rotation, then in canonical orientation only. The pass covering the
/// most area wins; earlier passes win ties.
fn best_pass<B: FreeSpace>(items: &[Rect], bin: Rect, spacing: u32) -> Vec<Packed> {
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| items[b].area().cmp(&items[a].area()));

    let mut best: Option<(u64, Vec<Packed>)> = None;
    for allow_rotate in [true, false] {
        for rule in FIT_RULES {
            let mut space = B::new(Region::frame(bin, spacing));
            let mut packed = Vec::with_capacity(items.len());
            let mut area = 0;
            for &index in &order {
                let piece = items[index];
                let Some(fit) = best_fit(space.regions(), piece, spacing, allow_rotate, rule) else {
                    continue;
                };
                let corner = space.regions()[fit.region];
                let size = if fit.rotated { piece.rotated() } else { piece };
                space.claim(fit.region, Region::footprint(corner.x, corner.y, size, spacing));

                // The footprint ends inside the grown frame, so the piece ends inside the bin
                let placement = Placement {
                    rect: size,
                    x: corner.x as u32,
                    y: corner.y as u32,
                    rotated: fit.rotated,
                };
                area += size.area();
                packed.push(Packed { index, placement });
            }

            let complete = packed.len() == items.len();
            if best.as_ref().is_none_or(|(a, _)| area > *a) {
                best = Some((area, packed));
            }
            if complete {
                return best.map(|(_, p)| p).unwrap_or_default();
            }
        }
    }

    best.map(|(_, p)| p).unwrap_or_default()
}

fn inset(bin: Rect, x: u32, y: u32) -> Option<Rect> {
    let width = bin.width.checked_sub(x.checked_mul(2)?)?;
    let length = bin.length.checked_sub(y.checked_mul(2)?)?;
    let usable = Rect::new(width, length);
    (!usable.is_degenerate()).then_some(usable)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Algorithm {
    Free(FreeHeuristic),
    Shelf,
}

/// Distance kept from the stock edges along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Insets {
    pub x: u32,
    pub y: u32,
}

/// Result of packing one stock unit.
#[derive(Debug, Clone)]
pub struct PackedStock {
    pub layout: StockLayout,
    /// Handles of the instances that were placed, in placement order.
    pub placed: Vec<PieceId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packer {
    algorithm: Algorithm,
    margin: u32,
    insets: Insets,
    mode: NestingMode,
}

impl Packer {
    pub fn new(profile: &PackingProfile, mode: NestingMode) -> Self {
        let (algorithm, insets) = match mode {
            NestingMode::Linear => (
                Algorithm::Shelf,
                Insets {
                    x: 0,
                    y: profile.border_inset,
                },
            ),
            NestingMode::Sheet if profile.straight_cuts_only => (
                Algorithm::Shelf,
                Insets {
                    x: profile.border_inset,
                    y: profile.border_inset,
                },
            ),
            NestingMode::Sheet => (
                Algorithm::Free(profile.heuristic),
                Insets {
                    x: profile.border_inset,
                    y: profile.border_inset,
                },
            ),
        };
        Self {
            algorithm,
            margin: profile.margin_gap,
            insets,
            mode,
        }
    }

    pub fn is_straight_cut(&self) -> bool {
        self.algorithm == Algorithm::Shelf
    }

    pub fn insets(&self) -> Insets {
        self.insets
    }

    /// Stock area left once the insets are removed.
    pub fn usable(&self, stock: Rect) -> Option<Rect> {
        inset(stock, self.insets.x, self.insets.y)
    }

    /// Whether a lone piece can be placed on an otherwise empty stock unit.
    pub fn can_hold(&self, stock: Rect, piece: Rect) -> bool {
        let Some(usable) = self.usable(stock) else {
            return false;
        };
        match self.algorithm {
            Algorithm::Free(_) => piece.fits_either(&usable),
            Algorithm::Shelf => piece.fits_in(&usable),
        }
    }

    pub fn size_label(&self, size: Rect) -> String {
        match self.mode {
            NestingMode::Sheet => size.to_string(),
            NestingMode::Linear => size.length.to_string(),
        }
    }

    /// Packs `remaining` onto one `stock` unit. Pieces with a zero dimension or
    /// that fail the stock fit test are never attempted.
    pub fn pack(&self, stock: &StockUnit, store: &PieceStore, remaining: &Remaining) -> PackedStock {
        let bin = stock.size();
        let candidates: Vec<PieceId> = remaining
            .iter()
            .filter(|&id| {
                let size = store.get(id).size();
                !size.is_degenerate() && fits(size, bin)
            })
            .collect();
        let items: Vec<Rect> = candidates.iter().map(|&id| store.get(id).size()).collect();

        let packed = match self.algorithm {
            Algorithm::Free(heuristic) => heuristic.pack(&items, bin, self.margin, self.insets.x),
            Algorithm::Shelf => shelf::pack(&items, bin, self.margin, self.insets),
        };

        let mut placed = Vec::with_capacity(packed.len());
        let mut placements = Vec::with_capacity(packed.len());
        for p in packed {
            let id = candidates[p.index];
            debug_assert!(self.within_bounds(bin, &p.placement));
            placed.push(id);
            placements.push(PlacedPiece {
                piece: store.get(id).clone(),
                x: p.placement.x,
                y: p.placement.y,
                placed_width: p.placement.rect.width,
                placed_length: p.placement.rect.length,
                rotated: p.placement.rotated,
            });
        }

        let used_area: u64 = placements
            .iter()
            .map(|p| p.placed_width as u64 * p.placed_length as u64)
            .sum();
        let layout = StockLayout {
            stock_id: stock.id.clone(),
            name: stock.display_name().to_string(),
            size_label: self.size_label(bin),
            area: stock.area(),
            width: stock.width,
            length: stock.length,
            used_area,
            waste_area: stock.area() - used_area,
            placements,
        };

        PackedStock { layout, placed }
    }

    fn within_bounds(&self, bin: Rect, p: &Placement) -> bool {
        let (x, y) = (u64::from(p.x), u64::from(p.y));
        x >= u64::from(self.insets.x)
            && y >= u64::from(self.insets.y)
            && x + u64::from(p.rect.width) + u64::from(self.insets.x) <= u64::from(bin.width)
            && y + u64::from(p.rect.length) + u64::from(self.insets.y) <= u64::from(bin.length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DemandRequest;

    fn assert_layout_valid(layout: &StockLayout, insets: Insets) {
        for (i, p) in layout.placements.iter().enumerate() {
            assert!(p.x >= insets.x && p.y >= insets.y, "piece {i} inside border");
            assert!(p.x_end() <= layout.width - insets.x, "piece {i} exceeds width");
            assert!(p.y_end() <= layout.length - insets.y, "piece {i} exceeds length");
        }
        for i in 0..layout.placements.len() {
            for j in (i + 1)..layout.placements.len() {
                assert!(
                    !layout.placements[i].overlaps(&layout.placements[j]),
                    "piece {i} overlaps piece {j}"
                );
            }
        }
    }

    fn min_gap(layout: &StockLayout) -> Option<u32> {
        let mut gap: Option<u32> = None;
        for (i, a) in layout.placements.iter().enumerate() {
            for b in &layout.placements[i + 1..] {
                let gx = b.x.saturating_sub(a.x_end()).max(a.x.saturating_sub(b.x_end()));
                let gy = b.y.saturating_sub(a.y_end()).max(a.y.saturating_sub(b.y_end()));
                let g = gx.max(gy);
                gap = Some(gap.map_or(g, |cur| cur.min(g)));
            }
        }
        gap
    }

    #[test]
    fn test_six_pieces_on_one_sheet_with_margin() {
        let store = PieceStore::expand(&[DemandRequest::new("P", 400, 300, 6)]);
        let stock = StockUnit::new("S1", 1000, 1000);
        for heuristic in [FreeHeuristic::MaxRects, FreeHeuristic::Guillotine] {
            let profile = PackingProfile::new(10, 10).with_heuristic(heuristic);
            let packer = Packer::new(&profile, NestingMode::Sheet);
            let packed = packer.pack(&stock, &store, &store.all());
            assert_eq!(packed.placed.len(), 6, "{heuristic:?}");
            assert_layout_valid(&packed.layout, packer.insets());
            assert!(min_gap(&packed.layout).unwrap() >= 10, "{heuristic:?}");
            assert_eq!(packed.layout.used_area, 720_000);
            assert_eq!(packed.layout.waste_area, 280_000);
        }
    }

    #[test]
    fn test_pieces_that_do_not_fit_are_skipped() {
        let store = PieceStore::expand(&[
            DemandRequest::new("big", 200, 200, 1),
            DemandRequest::new("small", 40, 40, 2),
        ]);
        let stock = StockUnit::new("S", 100, 100);
        let packer = Packer::new(&PackingProfile::default(), NestingMode::Sheet);
        let packed = packer.pack(&stock, &store, &store.all());
        assert_eq!(packed.placed.len(), 2);
        assert!(packed.placed.iter().all(|&id| store.get(id).id == "small"));
    }

    #[test]
    fn test_rotation_allowed_in_free_mode() {
        let store = PieceStore::expand(&[DemandRequest::new("P", 30, 100, 2)]);
        // 2 pieces side by side only when rotated onto the long axis
        let stock = StockUnit::new("S", 200, 30);
        let packer = Packer::new(&PackingProfile::default(), NestingMode::Sheet);
        let packed = packer.pack(&stock, &store, &store.all());
        assert_eq!(packed.placed.len(), 2);
        assert!(packed.layout.placements.iter().all(|p| p.rotated));
        assert_layout_valid(&packed.layout, packer.insets());
    }

    #[test]
    fn test_border_too_wide_leaves_empty_layout() {
        let store = PieceStore::expand(&[DemandRequest::new("P", 10, 10, 1)]);
        let stock = StockUnit::new("S", 20, 20);
        for profile in [PackingProfile::new(0, 10), PackingProfile::new(0, 10).straight_cuts()] {
            let packer = Packer::new(&profile, NestingMode::Sheet);
            let packed = packer.pack(&stock, &store, &store.all());
            assert!(packed.placed.is_empty());
            assert!(packed.layout.placements.is_empty());
            assert_eq!(packed.layout.waste_area, 400);
        }
    }

    #[test]
    fn test_straight_cut_profile_uses_shelf() {
        let profile = PackingProfile::new(0, 0).straight_cuts();
        let packer = Packer::new(&profile, NestingMode::Sheet);
        assert!(packer.is_straight_cut());
        let store = PieceStore::expand(&[DemandRequest::new("Q", 500, 100, 5)]);
        let stock = StockUnit::new("S2", 100, 2000);
        let packed = packer.pack(&stock, &store, &store.all());
        assert_eq!(packed.placed.len(), 4);
        assert!(packed.layout.placements.iter().all(|p| !p.rotated));
        assert_layout_valid(&packed.layout, packer.insets());
    }

    #[test]
    fn test_can_hold_respects_orientation_lock() {
        let free = Packer::new(&PackingProfile::default(), NestingMode::Sheet);
        let shelf = Packer::new(&PackingProfile::default().straight_cuts(), NestingMode::Sheet);
        let stock = Rect::new(100, 50);
        let piece = Rect::new(50, 100);
        assert!(free.can_hold(stock, piece));
        assert!(!shelf.can_hold(stock, piece));
    }

    #[test]
    fn test_linear_mode_ignores_width_border() {
        let profile = PackingProfile::new(5, 10);
        let packer = Packer::new(&profile, NestingMode::Linear);
        assert_eq!(packer.insets(), Insets { x: 0, y: 10 });
        assert_eq!(packer.size_label(Rect::new(LINEAR_GAUGE, 6000)), "6000");
        assert!(packer.can_hold(Rect::new(LINEAR_GAUGE, 100), Rect::new(LINEAR_GAUGE, 80)));
        assert!(!packer.can_hold(Rect::new(LINEAR_GAUGE, 100), Rect::new(LINEAR_GAUGE, 81)));
    }
}
