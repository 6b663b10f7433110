use crate::space::{FreeSpace, Region};

/// Maximal-rectangles free list. Regions may overlap; every one of them is
/// maximal, so a piece fits the remaining space iff it fits one region.
#[derive(Debug, Clone)]
pub struct MaxRectsBin {
    pub free: Vec<Region>,
}

impl FreeSpace for MaxRectsBin {
    fn new(frame: Region) -> Self {
        Self { free: vec![frame] }
    }

    fn regions(&self) -> &[Region] {
        &self.free
    }

    fn claim(&mut self, _at: usize, used: Region) {
        let mut next = Vec::with_capacity(self.free.len() + 4);
        for region in self.free.drain(..) {
            if region.intersects(&used) {
                next.extend(leftovers(region, used));
            } else {
                next.push(region);
            }
        }
        self.free = next;
        self.prune();
    }
}

impl MaxRectsBin {
    /// Drops regions contained in another one. Keeps the order of survivors.
    fn prune(&mut self) {
        let mut i = 0;
        while i < self.free.len() {
            let mut removed = false;
            let mut j = i + 1;
            while j < self.free.len() {
                if self.free[j].contains(&self.free[i]) {
                    self.free.remove(i);
                    removed = true;
                    break;
                }
                if self.free[i].contains(&self.free[j]) {
                    self.free.remove(j);
                } else {
                    j += 1;
                }
            }
            if !removed {
                i += 1;
            }
        }
    }
}

/// The up to four maximal strips of `region` left beside `used`.
fn leftovers(region: Region, used: Region) -> impl Iterator<Item = Region> {
    [
        region.split_x(used.x).0,
        region.split_x(used.x_end()).1,
        region.split_y(used.y).0,
        region.split_y(used.y_end()).1,
    ]
    .into_iter()
    .flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::{FitRule, best_fit};
    use crate::types::Rect;

    /// Places copies of `piece` until none fits; returns their footprints.
    fn fill(bin: &mut MaxRectsBin, piece: Rect, spacing: u32, allow_rotate: bool) -> Vec<Region> {
        let mut placed = Vec::new();
        while let Some(fit) = best_fit(bin.regions(), piece, spacing, allow_rotate, FitRule::Area) {
            let corner = bin.free[fit.region];
            let size = if fit.rotated { piece.rotated() } else { piece };
            let used = Region::footprint(corner.x, corner.y, size, spacing);
            bin.claim(fit.region, used);
            placed.push(used);
        }
        placed
    }

    #[test]
    fn test_first_piece_leaves_two_maximal_strips() {
        let mut bin = MaxRectsBin::new(Region::frame(Rect::new(100, 100), 0));
        let placed = fill(&mut bin, Rect::new(100, 100), 0, false);
        assert_eq!(placed.len(), 1);
        assert!(bin.free.is_empty());

        let mut bin = MaxRectsBin::new(Region::frame(Rect::new(100, 100), 0));
        bin.claim(0, Region::footprint(0, 0, Rect::new(50, 30), 0));
        assert_eq!(bin.free.len(), 2);
        assert!(bin.free.iter().any(|r| (r.x, r.width, r.length) == (50, 50, 100)));
        assert!(bin.free.iter().any(|r| (r.y, r.width, r.length) == (30, 100, 70)));
    }

    #[test]
    fn test_exact_grid() {
        let mut bin = MaxRectsBin::new(Region::frame(Rect::new(100, 100), 0));
        assert_eq!(fill(&mut bin, Rect::new(50, 50), 0, false).len(), 4);
        assert!(bin.free.is_empty());
    }

    #[test]
    fn test_spacing_between_pieces_only() {
        // 2 * 45 + 10 = 100: fits exactly with a 10 gap and no edge gap
        let mut bin = MaxRectsBin::new(Region::frame(Rect::new(100, 45), 10));
        let placed = fill(&mut bin, Rect::new(45, 45), 10, false);
        let xs: Vec<u64> = placed.iter().map(|r| r.x).collect();
        assert_eq!(xs, vec![0, 55]);

        let mut bin = MaxRectsBin::new(Region::frame(Rect::new(99, 45), 10));
        assert_eq!(fill(&mut bin, Rect::new(45, 45), 10, false).len(), 1);
    }

    #[test]
    fn test_huge_spacing_leaves_one_piece_per_bin() {
        let mut bin = MaxRectsBin::new(Region::frame(Rect::new(100, 100), u32::MAX));
        let placed = fill(&mut bin, Rect::new(10, 10), u32::MAX, true);
        assert_eq!(placed.len(), 1);
        assert_eq!((placed[0].x, placed[0].y), (0, 0));
    }

    #[test]
    fn test_free_space_never_overlaps_placements() {
        let mut bin = MaxRectsBin::new(Region::frame(Rect::new(97, 61), 3));
        let placed = fill(&mut bin, Rect::new(20, 13), 3, true);
        assert!(!placed.is_empty());
        for r in &bin.free {
            for used in &placed {
                assert!(!r.intersects(used), "free {:?} overlaps {:?}", r, used);
            }
        }
        for (i, a) in placed.iter().enumerate() {
            for b in &placed[i + 1..] {
                assert!(!a.intersects(b));
            }
        }
    }
}
