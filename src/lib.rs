//! Cutting-stock nesting engine.
//!
//! Given a catalog of stock units and a demand list, [`Solver`] picks the
//! combination of stock units and per-unit layouts that covers the demand with
//! the least consumed stock area, under a [`types::PackingProfile`].

pub mod aggregate;
pub mod canonical;
pub mod error;
pub mod feasibility;
pub mod guillotine;
pub mod maxrects;
pub mod packer;
pub mod search;
pub mod shelf;
pub mod solver;
pub mod space;
pub mod types;

pub use error::{Error, Result};
pub use solver::{NestingRequest, Outcome, Solver, nest};
