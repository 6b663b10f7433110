use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::aggregate::{Summary, summarize};
use crate::canonical::{DemandPiece, PieceStore};
use crate::error::{Error, Result};
use crate::feasibility::{self, FeasibilityReport, piece_labels};
use crate::packer::{LINEAR_GAUGE, Packer};
use crate::search::{Search, SearchStats};
use crate::types::{DemandRequest, NestingMode, PackingProfile, Rect, SearchLimits, StockUnit};

/// Everything one nesting run consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NestingRequest {
    #[serde(default)]
    pub mode: NestingMode,
    pub stock: Vec<StockUnit>,
    pub demand: Vec<DemandRequest>,
    #[serde(default)]
    pub profile: PackingProfile,
    #[serde(default)]
    pub limits: SearchLimits,
}

/// Demand the search could not cover, e.g. because a limit stopped it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exhaustion {
    pub unplaced: Vec<DemandPiece>,
    pub stats: SearchStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Complete(Summary),
    Infeasible(FeasibilityReport),
    Exhausted(Exhaustion),
}

impl Outcome {
    pub fn summary(&self) -> Option<&Summary> {
        match self {
            Outcome::Complete(summary) => Some(summary),
            _ => None,
        }
    }

    /// Treats anything short of a complete cover as a failure.
    pub fn into_result(self) -> Result<Summary> {
        match self {
            Outcome::Complete(summary) => Ok(summary),
            Outcome::Infeasible(report) => Err(Error::NoFeasibleStock(report.unusable_labels())),
            Outcome::Exhausted(exhaustion) => Err(Error::PackingExhausted {
                unplaced: exhaustion.unplaced.len(),
                steps: exhaustion.stats.steps,
            }),
        }
    }
}

pub struct Solver {
    mode: NestingMode,
    stock: Vec<StockUnit>,
    demand: Vec<DemandRequest>,
    profile: PackingProfile,
    limits: SearchLimits,
}

impl Solver {
    pub fn new(request: NestingRequest) -> Self {
        Self {
            mode: request.mode,
            stock: request.stock,
            demand: request.demand,
            profile: request.profile,
            limits: request.limits,
        }
    }

    /// Validates the request, checks feasibility and searches for the stock
    /// combination with the least consumed area. Every call starts from a
    /// fresh memo.
    pub fn solve(&self) -> Result<Outcome> {
        self.validate()?;

        let stock = self.canonical_stock();
        let store = PieceStore::expand(&self.canonical_demand());
        tracing::info!(
            mode = ?self.mode,
            stock_types = stock.len(),
            pieces = store.len(),
            straight_cuts = self.profile.straight_cuts_only,
            "solving"
        );

        let report = feasibility::assess(&store, &stock);
        if !report.is_feasible() {
            tracing::info!(unusable = report.unusable_pieces.len(), "demand is infeasible");
            return Ok(Outcome::Infeasible(report));
        }

        let packer = Packer::new(&self.profile, self.mode);
        let mismatched = feasibility::profile_mismatches(&store, &stock, &packer);
        if !mismatched.is_empty() {
            return Err(Error::ProfileMismatch {
                pieces: piece_labels(mismatched.into_iter()),
                border: self.profile.border_inset,
                straight_cuts_only: packer.is_straight_cut(),
            });
        }

        let all = store.all();
        let (best, stats) = Search::new(&store, &stock, packer, self.limits).run(&all);
        match best {
            Some(result) => {
                let summary = summarize(result, &stock, store.area_of(&all), &packer, stats);
                tracing::info!(
                    units = summary.sheet_count(),
                    total_area = summary.total_area,
                    waste_percent = summary.waste_percent,
                    steps = stats.steps,
                    "solved"
                );
                Ok(Outcome::Complete(summary))
            }
            None => {
                tracing::info!(steps = stats.steps, "search exhausted without a complete cover");
                Ok(Outcome::Exhausted(Exhaustion {
                    unplaced: store.iter().cloned().collect(),
                    stats,
                }))
            }
        }
    }

    fn validate(&self) -> Result<()> {
        let linear = self.mode == NestingMode::Linear;
        let mut ids = HashSet::new();
        for s in &self.stock {
            if s.length == 0 || (!linear && s.width == 0) {
                return Err(Error::InvalidDimension {
                    kind: "stock",
                    id: s.id.clone(),
                    size: Rect::new(s.width, s.length).to_string(),
                });
            }
            if !ids.insert(s.id.as_str()) {
                return Err(Error::DuplicateStock(s.id.clone()));
            }
        }
        for d in &self.demand {
            if d.length == 0 || (!linear && d.width == 0) {
                return Err(Error::InvalidDimension {
                    kind: "piece",
                    id: d.template_id.clone(),
                    size: Rect::new(d.width, d.length).to_string(),
                });
            }
            if d.quantity == 0 {
                return Err(Error::InvalidQuantity(d.template_id.clone()));
            }
        }
        Ok(())
    }

    fn canonical_stock(&self) -> Vec<StockUnit> {
        self.stock
            .iter()
            .map(|s| {
                let size = match self.mode {
                    NestingMode::Sheet => s.size().normalized(),
                    NestingMode::Linear => Rect::new(LINEAR_GAUGE, s.length),
                };
                StockUnit {
                    width: size.width,
                    length: size.length,
                    ..s.clone()
                }
            })
            .collect()
    }

    fn canonical_demand(&self) -> Vec<DemandRequest> {
        match self.mode {
            NestingMode::Sheet => self.demand.clone(),
            NestingMode::Linear => self
                .demand
                .iter()
                .map(|d| DemandRequest {
                    width: LINEAR_GAUGE,
                    ..d.clone()
                })
                .collect(),
        }
    }
}

/// Convenience wrapper around [`Solver`].
pub fn nest(request: NestingRequest) -> Result<Outcome> {
    Solver::new(request).solve()
}
