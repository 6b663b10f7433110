//! Free-space bookkeeping for the free-placement bins.
//!
//! Spacing is modelled by growing the bin frame and every footprint by the
//! spacing on their far edges. Coordinates live in a `u64` frame so those sums
//! cannot wrap for any `u32` stock size or margin.

use crate::types::Rect;

/// Axis-aligned area inside a bin frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u64,
    pub y: u64,
    pub width: u64,
    pub length: u64,
}

impl Region {
    /// The whole bin, grown by `spacing` on the far edges.
    pub fn frame(bin: Rect, spacing: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width: u64::from(bin.width) + u64::from(spacing),
            length: u64::from(bin.length) + u64::from(spacing),
        }
    }

    /// Space a piece of `size` at (x, y) claims, trailing gap included.
    pub fn footprint(x: u64, y: u64, size: Rect, spacing: u32) -> Self {
        let (width, length) = grown(size, spacing);
        Self {
            x,
            y,
            width,
            length,
        }
    }

    pub fn x_end(&self) -> u64 {
        self.x + self.width
    }

    pub fn y_end(&self) -> u64 {
        self.y + self.length
    }

    pub fn area(&self) -> u128 {
        u128::from(self.width) * u128::from(self.length)
    }

    pub fn holds(&self, width: u64, length: u64) -> bool {
        width <= self.width && length <= self.length
    }

    pub fn contains(&self, other: &Region) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.x_end() <= self.x_end()
            && other.y_end() <= self.y_end()
    }

    pub fn intersects(&self, other: &Region) -> bool {
        self.x < other.x_end()
            && other.x < self.x_end()
            && self.y < other.y_end()
            && other.y < self.y_end()
    }

    /// Cuts at `x = at` into the parts before and after the line.
    pub fn split_x(&self, at: u64) -> (Option<Region>, Option<Region>) {
        if at <= self.x {
            return (None, Some(*self));
        }
        if at >= self.x_end() {
            return (Some(*self), None);
        }
        (
            Some(Region {
                width: at - self.x,
                ..*self
            }),
            Some(Region {
                x: at,
                width: self.x_end() - at,
                ..*self
            }),
        )
    }

    /// Cuts at `y = at` into the parts before and after the line.
    pub fn split_y(&self, at: u64) -> (Option<Region>, Option<Region>) {
        if at <= self.y {
            return (None, Some(*self));
        }
        if at >= self.y_end() {
            return (Some(*self), None);
        }
        (
            Some(Region {
                length: at - self.y,
                ..*self
            }),
            Some(Region {
                y: at,
                length: self.y_end() - at,
                ..*self
            }),
        )
    }

    /// The single region covering both, when they share a full edge.
    pub fn join(&self, other: &Region) -> Option<Region> {
        let (first, second) = if (self.x, self.y) <= (other.x, other.y) {
            (self, other)
        } else {
            (other, self)
        };
        if first.y == second.y && first.length == second.length && first.x_end() == second.x {
            return Some(Region {
                width: first.width + second.width,
                ..*first
            });
        }
        if first.x == second.x && first.width == second.width && first.y_end() == second.y {
            return Some(Region {
                length: first.length + second.length,
                ..*first
            });
        }
        None
    }
}

fn grown(size: Rect, spacing: u32) -> (u64, u64) {
    (
        u64::from(size.width) + u64::from(spacing),
        u64::from(size.length) + u64::from(spacing),
    )
}

/// How a free region is ranked for a piece. Lower ranks win.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitRule {
    /// Least leftover area, then shortest leftover side.
    Area,
    /// Shortest leftover side, then longest.
    ShortSide,
    /// Longest leftover side, then shortest.
    LongSide,
}

pub const FIT_RULES: [FitRule; 3] = [FitRule::Area, FitRule::ShortSide, FitRule::LongSide];

impl FitRule {
    fn rank(self, region: &Region, width: u64, length: u64) -> (u128, u128) {
        let dw = u128::from(region.width - width);
        let dl = u128::from(region.length - length);
        let (short, long) = (dw.min(dl), dw.max(dl));
        match self {
            FitRule::Area => (region.area() - u128::from(width) * u128::from(length), short),
            FitRule::ShortSide => (short, long),
            FitRule::LongSide => (long, short),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fit {
    /// Index into the bin's regions; the piece goes in its top-left corner.
    pub region: usize,
    pub rotated: bool,
}

/// Best-ranked region for `piece`. The first region wins ties, and the
/// unrotated orientation wins ties within a region.
pub fn best_fit(
    regions: &[Region],
    piece: Rect,
    spacing: u32,
    allow_rotate: bool,
    rule: FitRule,
) -> Option<Fit> {
    let turns: &[bool] = if allow_rotate && piece.width != piece.length {
        &[false, true]
    } else {
        &[false]
    };
    regions
        .iter()
        .enumerate()
        .flat_map(|(index, region)| turns.iter().map(move |&rotated| (index, region, rotated)))
        .filter_map(|(index, region, rotated)| {
            let (width, length) = grown(if rotated { piece.rotated() } else { piece }, spacing);
            region.holds(width, length).then(|| {
                (
                    rule.rank(region, width, length),
                    Fit {
                        region: index,
                        rotated,
                    },
                )
            })
        })
        .min_by_key(|(rank, _)| *rank)
        .map(|(_, fit)| fit)
}

/// Free-space bookkeeping of one bin.
pub trait FreeSpace {
    fn new(frame: Region) -> Self;

    fn regions(&self) -> &[Region];

    /// Removes `used` from the free space. `used` sits in the top-left corner
    /// of region `at`.
    fn claim(&mut self, at: usize, used: Region);
}
