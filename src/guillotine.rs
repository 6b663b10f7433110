use crate::space::{FreeSpace, Region};

/// Disjoint free regions that are only ever divided by edge-to-edge cuts, so
/// every layout it produces can be sawn with guillotine cuts.
#[derive(Debug, Clone)]
pub struct GuillotineBin {
    pub free: Vec<Region>,
}

impl FreeSpace for GuillotineBin {
    fn new(frame: Region) -> Self {
        Self { free: vec![frame] }
    }

    fn regions(&self) -> &[Region] {
        &self.free
    }

    fn claim(&mut self, at: usize, used: Region) {
        let region = self.free.swap_remove(at);
        let (side, below) = cut(region, used);
        for part in [side, below].into_iter().flatten() {
            self.insert(part);
        }
    }
}

impl GuillotineBin {
    /// Adds a region, first absorbing every neighbour it shares a full edge with.
    fn insert(&mut self, mut region: Region) {
        loop {
            let neighbour = self
                .free
                .iter()
                .enumerate()
                .find_map(|(i, other)| other.join(&region).map(|joined| (i, joined)));
            let Some((i, joined)) = neighbour else {
                break;
            };
            self.free.swap_remove(i);
            region = joined;
        }
        self.free.push(region);
    }
}

/// Divides what `used` leaves of `region` into a side part and a part below.
/// The edge-to-edge cut runs along whichever axis keeps the larger part bigger.
fn cut(region: Region, used: Region) -> (Option<Region>, Option<Region>) {
    // Edge-to-edge cut down the piece's right edge
    let along = {
        let (left, right) = region.split_x(used.x_end());
        (right, left.and_then(|l| l.split_y(used.y_end()).1))
    };
    // Edge-to-edge cut under the piece
    let across = {
        let (top, bottom) = region.split_y(used.y_end());
        (top.and_then(|t| t.split_x(used.x_end()).1), bottom)
    };
    if largest(across) > largest(along) {
        across
    } else {
        along
    }
}

fn largest((a, b): (Option<Region>, Option<Region>)) -> u128 {
    [a, b].iter().flatten().map(Region::area).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::{FitRule, best_fit};
    use crate::types::Rect;

    fn region(x: u64, y: u64, width: u64, length: u64) -> Region {
        Region {
            x,
            y,
            width,
            length,
        }
    }

    fn place(bin: &mut GuillotineBin, piece: Rect, spacing: u32) -> Option<Region> {
        let fit = best_fit(bin.regions(), piece, spacing, false, FitRule::Area)?;
        let corner = bin.free[fit.region];
        let used = Region::footprint(corner.x, corner.y, piece, spacing);
        bin.claim(fit.region, used);
        Some(used)
    }

    #[test]
    fn test_cut_keeps_the_larger_leftover_whole() {
        // Wide leftover to the right: cut down the piece's edge
        let (side, below) = cut(region(0, 0, 100, 40), region(0, 0, 20, 30));
        assert_eq!(side, Some(region(20, 0, 80, 40)));
        assert_eq!(below, Some(region(0, 30, 20, 10)));

        // Long leftover below: cut under the piece
        let (side, below) = cut(region(0, 0, 40, 100), region(0, 0, 30, 20));
        assert_eq!(side, Some(region(30, 0, 10, 20)));
        assert_eq!(below, Some(region(0, 20, 40, 80)));
    }

    #[test]
    fn test_exact_fit_leaves_nothing() {
        let mut bin = GuillotineBin::new(Region::frame(Rect::new(100, 100), 0));
        assert!(place(&mut bin, Rect::new(100, 100), 0).is_some());
        assert!(bin.free.is_empty());
        assert!(place(&mut bin, Rect::new(1, 1), 0).is_none());
    }

    #[test]
    fn test_spacing_between_pieces_only() {
        let mut bin = GuillotineBin::new(Region::frame(Rect::new(100, 100), 5));
        let first = place(&mut bin, Rect::new(50, 100), 5).unwrap();
        assert_eq!((first.x, first.y), (0, 0));
        // 100 - 50 - 5
        let second = place(&mut bin, Rect::new(45, 100), 5).unwrap();
        assert_eq!((second.x, second.y), (55, 0));
        assert!(bin.free.is_empty());
    }

    #[test]
    fn test_neighbouring_leftovers_merge() {
        let mut bin = GuillotineBin::new(region(0, 0, 100, 100));
        bin.free.push(region(100, 60, 50, 40));
        bin.claim(0, region(0, 0, 100, 60));
        assert_eq!(bin.free, vec![region(0, 60, 150, 40)]);
    }

    #[test]
    fn test_regions_stay_disjoint() {
        let mut bin = GuillotineBin::new(Region::frame(Rect::new(97, 61), 3));
        let mut placed = Vec::new();
        for piece in [Rect::new(20, 13), Rect::new(31, 17), Rect::new(9, 40)].repeat(4) {
            if let Some(used) = place(&mut bin, piece, 3) {
                placed.push(used);
            }
        }
        assert!(placed.len() > 3);
        for (i, a) in bin.free.iter().enumerate() {
            assert!(placed.iter().all(|used| !a.intersects(used)));
            assert!(bin.free[i + 1..].iter().all(|b| !a.intersects(b)));
        }
    }
}
