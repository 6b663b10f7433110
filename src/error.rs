//! Error types for the nesting engine.

use thiserror::Error;

/// Result type alias for nesting operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A stock unit or demand piece has a zero width or length.
    #[error("invalid dimension: {kind} '{id}' is {size}, dimensions must be non-zero")]
    InvalidDimension {
        kind: &'static str,
        id: String,
        size: String,
    },

    #[error("invalid quantity: demand '{0}' must request at least one piece")]
    InvalidQuantity(String),

    #[error("duplicate stock id '{0}'")]
    DuplicateStock(String),

    /// Pieces that fit some stock unit raw but none once the profile's border
    /// inset and orientation lock are applied.
    #[error(
        "profile mismatch: {} fit no stock inside a border of {border}{}",
        .pieces.join(", "),
        straight_cut_note(.straight_cuts_only)
    )]
    ProfileMismatch {
        pieces: Vec<String>,
        border: u32,
        straight_cuts_only: bool,
    },

    /// Pieces that fit no stock unit in either orientation.
    #[error("no feasible stock for: {}", .0.join(", "))]
    NoFeasibleStock(Vec<String>),

    #[error("packing exhausted: {unplaced} piece(s) could not be placed after {steps} step(s)")]
    PackingExhausted { unplaced: usize, steps: u64 },
}

fn straight_cut_note(straight_cuts_only: &bool) -> &'static str {
    if *straight_cuts_only {
        " with straight cuts only"
    } else {
        ""
    }
}
