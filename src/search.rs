//! Branch-and-bound search over stock-type choices.
//!
//! Each node packs one stock unit against the remaining demand, removes what
//! was placed and recurses on the rest. The area bound is threaded explicitly:
//! `search(remaining, bound)` only reports results strictly cheaper than
//! `bound` and hands back the tightened bound. Results are memoized per
//! remaining-set signature for the lifetime of one [`Search`].

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::canonical::{PieceStore, Remaining, Signature};
use crate::feasibility::fits;
use crate::packer::Packer;
use crate::types::{SearchLimits, StockLayout, StockUnit};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub total_area: u64,
    /// Consumed units per stock id.
    pub counts: BTreeMap<String, u32>,
    pub layouts: Vec<StockLayout>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Single-stock packing calls.
    pub steps: u64,
    pub memo_hits: u64,
    /// Stock choices skipped because they could not beat the bound.
    pub pruned: u64,
    /// A step or time limit stopped the search early.
    pub aborted: bool,
}

enum Memo {
    Solved(SearchResult),
    /// No solution cheaper than `bound` exists.
    Unsolved { bound: u64 },
}

pub struct Search<'a> {
    store: &'a PieceStore,
    stock: Vec<&'a StockUnit>,
    packer: Packer,
    limits: SearchLimits,
    deadline: Option<Instant>,
    memo: HashMap<Signature, Memo>,
    stats: SearchStats,
}

impl<'a> Search<'a> {
    pub fn new(
        store: &'a PieceStore,
        stock: &'a [StockUnit],
        packer: Packer,
        limits: SearchLimits,
    ) -> Self {
        // Larger stock first prunes earlier; id breaks ties so the order is total
        let mut stock: Vec<&StockUnit> = stock.iter().collect();
        stock.sort_by(|a, b| b.area().cmp(&a.area()).then_with(|| a.id.cmp(&b.id)));
        Self {
            store,
            stock,
            packer,
            limits,
            deadline: None,
            memo: HashMap::new(),
            stats: SearchStats::default(),
        }
    }

    /// Cheapest complete cover of `remaining` the search could find.
    pub fn run(mut self, remaining: &Remaining) -> (Option<SearchResult>, SearchStats) {
        self.deadline = self
            .limits
            .time_limit_ms
            .map(|ms| Instant::now() + Duration::from_millis(ms));
        let (best, _) = self.search(remaining, u64::MAX);
        tracing::debug!(
            steps = self.stats.steps,
            memo_entries = self.memo.len(),
            memo_hits = self.stats.memo_hits,
            pruned = self.stats.pruned,
            aborted = self.stats.aborted,
            "search finished"
        );
        (best, self.stats)
    }

    fn search(&mut self, remaining: &Remaining, bound: u64) -> (Option<SearchResult>, u64) {
        if remaining.is_empty() {
            return (Some(SearchResult::default()), 0);
        }

        let key = remaining.signature();
        match self.memo.get(&key) {
            Some(Memo::Solved(result)) => {
                self.stats.memo_hits += 1;
                return if result.total_area < bound {
                    (Some(result.clone()), result.total_area)
                } else {
                    (None, bound)
                };
            }
            Some(Memo::Unsolved { bound: known }) if bound <= *known => {
                self.stats.memo_hits += 1;
                return (None, bound);
            }
            _ => {}
        }

        let entry_bound = bound;
        let mut bound = bound;
        let mut best: Option<SearchResult> = None;

        for si in 0..self.stock.len() {
            if self.out_of_budget() {
                break;
            }
            let st = self.stock[si];
            let store = self.store;
            if !remaining.iter().any(|id| fits(store.get(id).size(), st.size())) {
                continue;
            }
            if st.area() >= bound {
                self.stats.pruned += 1;
                continue;
            }

            self.stats.steps += 1;
            let packed = self.packer.pack(st, store, remaining);
            if packed.placed.is_empty() {
                continue;
            }

            let next = remaining.without(&packed.placed);
            let (sub, _) = self.search(&next, bound - st.area());
            let Some(sub) = sub else {
                continue;
            };

            let total = st.area() + sub.total_area;
            if total < bound {
                let mut counts = sub.counts;
                *counts.entry(st.id.clone()).or_insert(0) += 1;
                let mut layouts = Vec::with_capacity(sub.layouts.len() + 1);
                layouts.push(packed.layout);
                layouts.extend(sub.layouts);

                tracing::debug!(
                    remaining = remaining.len(),
                    stock = %st.id,
                    total,
                    "improved subproblem"
                );
                best = Some(SearchResult {
                    total_area: total,
                    counts,
                    layouts,
                });
                bound = total;
            }
        }

        // An interrupted subtree may have missed cheaper branches
        if !self.stats.aborted {
            let entry = match &best {
                Some(result) => Memo::Solved(result.clone()),
                None => Memo::Unsolved { bound: entry_bound },
            };
            self.memo.insert(key, entry);
        }

        (best, bound)
    }

    fn out_of_budget(&mut self) -> bool {
        if self.stats.aborted {
            return true;
        }
        let steps_spent = self
            .limits
            .max_steps
            .is_some_and(|max| self.stats.steps >= max);
        let time_spent = self.deadline.is_some_and(|d| Instant::now() >= d);
        if steps_spent || time_spent {
            tracing::warn!(steps = self.stats.steps, "search budget exhausted");
            self.stats.aborted = true;
        }
        self.stats.aborted
    }
}
