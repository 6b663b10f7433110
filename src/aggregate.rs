use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::packer::Packer;
use crate::search::{SearchResult, SearchStats};
use crate::types::{StockLayout, StockUnit};

/// How many units of one stock type a solution consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockUsage {
    pub stock_id: String,
    pub name: String,
    pub size_label: String,
    pub area: u64,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Sorted by count, highest first.
    pub stock_usage: Vec<StockUsage>,
    pub counts: BTreeMap<String, u32>,
    pub total_area: u64,
    pub demand_area: u64,
    pub waste_area: u64,
    pub waste_percent: f64,
    /// Present only when every consumed stock type has a price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_weight: Option<f64>,
    pub layouts: Vec<StockLayout>,
    pub stats: SearchStats,
}

impl Summary {
    pub fn sheet_count(&self) -> usize {
        self.layouts.len()
    }

    pub fn placed_count(&self) -> usize {
        self.layouts.iter().map(|l| l.placements.len()).sum()
    }
}

pub fn summarize(
    result: SearchResult,
    stock: &[StockUnit],
    demand_area: u64,
    packer: &Packer,
    stats: SearchStats,
) -> Summary {
    let mut stock_usage: Vec<StockUsage> = Vec::new();
    let mut total_price = Some(0.0);
    let mut total_weight = Some(0.0);

    for (id, &count) in &result.counts {
        let Some(unit) = stock.iter().find(|s| &s.id == id) else {
            tracing::warn!(stock = %id, "search result references unknown stock");
            continue;
        };
        total_price = total_price.zip(unit.price).map(|(t, p)| t + p * count as f64);
        total_weight = total_weight.zip(unit.weight).map(|(t, w)| t + w * count as f64);
        stock_usage.push(StockUsage {
            stock_id: unit.id.clone(),
            name: unit.display_name().to_string(),
            size_label: packer.size_label(unit.size()),
            area: unit.area(),
            count,
        });
    }
    stock_usage.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| b.area.cmp(&a.area))
            .then_with(|| a.stock_id.cmp(&b.stock_id))
    });

    debug_assert_eq!(
        result.total_area,
        stock_usage.iter().map(|u| u.area * u.count as u64).sum::<u64>()
    );
    debug_assert!(result.total_area >= demand_area);
    let waste_area = result.total_area.saturating_sub(demand_area);
    let waste_percent = if result.total_area == 0 {
        0.0
    } else {
        waste_area as f64 / result.total_area as f64 * 100.0
    };

    if result.counts.is_empty() {
        total_price = None;
        total_weight = None;
    }

    Summary {
        stock_usage,
        counts: result.counts,
        total_area: result.total_area,
        demand_area,
        waste_area,
        waste_percent,
        total_price,
        total_weight,
        layouts: result.layouts,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NestingMode, PackingProfile};

    fn result(pairs: &[(&str, u32)], total_area: u64) -> SearchResult {
        SearchResult {
            total_area,
            counts: pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            layouts: Vec::new(),
        }
    }

    fn packer() -> Packer {
        Packer::new(&PackingProfile::default(), NestingMode::Sheet)
    }

    #[test]
    fn test_usage_sorted_by_count() {
        let stock = vec![
            StockUnit::new("A", 100, 100).with_price(10.0),
            StockUnit::new("B", 50, 50).with_price(2.5),
        ];
        let summary = summarize(
            result(&[("A", 1), ("B", 3)], 17_500),
            &stock,
            12_000,
            &packer(),
            SearchStats::default(),
        );
        let ids: Vec<&str> = summary.stock_usage.iter().map(|u| u.stock_id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A"]);
        assert_eq!(summary.stock_usage[0].size_label, "50x50");
        assert_eq!(summary.waste_area, 5_500);
        assert!((summary.waste_percent - 5_500.0 / 17_500.0 * 100.0).abs() < 1e-9);
        assert_eq!(summary.total_price, Some(17.5));
        assert_eq!(summary.total_weight, None);
    }

    #[test]
    fn test_price_needs_every_consumed_stock_priced() {
        let stock = vec![
            StockUnit::new("A", 10, 10).with_price(1.0).with_weight(2.0),
            StockUnit::new("B", 10, 10).with_weight(1.0),
            StockUnit::new("unused", 10, 10),
        ];
        let summary = summarize(
            result(&[("A", 2), ("B", 1)], 300),
            &stock,
            300,
            &packer(),
            SearchStats::default(),
        );
        assert_eq!(summary.total_price, None);
        assert_eq!(summary.total_weight, Some(5.0));
        assert_eq!(summary.waste_area, 0);
        assert_eq!(summary.stock_usage.len(), 2);
    }

    #[test]
    fn test_empty_result() {
        let summary = summarize(
            SearchResult::default(),
            &[],
            0,
            &packer(),
            SearchStats::default(),
        );
        assert_eq!(summary.sheet_count(), 0);
        assert_eq!(summary.waste_percent, 0.0);
        assert_eq!(summary.total_price, None);
    }

    #[test]
    fn test_linear_labels() {
        let stock = vec![StockUnit::new("bar", 1, 6000)];
        let packer = Packer::new(&PackingProfile::default(), NestingMode::Linear);
        let summary = summarize(
            result(&[("bar", 2)], 12_000),
            &stock,
            10_000,
            &packer,
            SearchStats::default(),
        );
        assert_eq!(summary.stock_usage[0].size_label, "6000");
        assert_eq!(summary.waste_area, 2_000);
    }
}
