//! Straight-cut shelf packing.
//!
//! Pieces are grouped by exact size, largest groups first, and laid out in
//! rows from the top-left inset corner without rotation. Every row boundary is
//! a full-width cut, so the layout can be produced with guillotine cuts only.
//! The first piece whose row does not fit ends placement on this stock.

use crate::packer::{Insets, Packed};
use crate::types::{Placement, Rect};

pub fn pack(items: &[Rect], bin: Rect, margin: u32, insets: Insets) -> Vec<Packed> {
    let (Some(usable_width), Some(usable_length)) = (
        insets.x.checked_mul(2).and_then(|i| bin.width.checked_sub(i)),
        insets.y.checked_mul(2).and_then(|i| bin.length.checked_sub(i)),
    ) else {
        return Vec::new();
    };
    // Cursor sums run in u64 so a huge margin or stock size cannot wrap
    let margin = u64::from(margin);
    let x_limit = u64::from(usable_width) + u64::from(insets.x);
    let y_limit = u64::from(usable_length) + u64::from(insets.y);

    let mut packed = Vec::new();
    let mut x = u64::from(insets.x);
    let mut y = u64::from(insets.y);
    let mut row_length = 0;

    'groups: for (size, members) in groups(items) {
        if size.is_degenerate() || size.width > usable_width || size.length > usable_length {
            continue;
        }
        let (width, length) = (u64::from(size.width), u64::from(size.length));
        for index in members {
            if x + width > x_limit {
                x = u64::from(insets.x);
                y += row_length + margin;
                row_length = 0;
            }
            if y + length > y_limit {
                break 'groups;
            }
            packed.push(Packed {
                index,
                placement: Placement {
                    rect: size,
                    // Bounded by the limits above, which are stock coordinates
                    x: x as u32,
                    y: y as u32,
                    rotated: false,
                },
            });
            x += width + margin;
            row_length = row_length.max(length);
        }
        // Close the row so the next size starts on a fresh shelf
        if row_length > 0 {
            y += row_length + margin;
        }
        x = u64::from(insets.x);
        row_length = 0;
    }

    packed
}

/// Item indices grouped by exact size, largest area first. Equal areas keep
/// first-seen order.
fn groups(items: &[Rect]) -> Vec<(Rect, Vec<usize>)> {
    let mut groups: Vec<(Rect, Vec<usize>)> = Vec::new();
    for (index, &size) in items.iter().enumerate() {
        match groups.iter_mut().find(|(s, _)| *s == size) {
            Some((_, members)) => members.push(index),
            None => groups.push((size, vec![index])),
        }
    }
    groups.sort_by(|a, b| b.0.area().cmp(&a.0.area()));
    groups
}
