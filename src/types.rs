use serde::{Deserialize, Deserializer, Serialize};

use crate::canonical::DemandPiece;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub width: u32,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub length: u32,
}

impl Rect {
    pub fn new(width: u32, length: u32) -> Self {
        Self { width, length }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.length as u64
    }

    pub fn rotated(&self) -> Self {
        Self {
            width: self.length,
            length: self.width,
        }
    }

    pub fn fits_in(&self, other: &Rect) -> bool {
        self.width <= other.width && self.length <= other.length
    }

    /// Fit test in either orientation.
    pub fn fits_either(&self, other: &Rect) -> bool {
        self.fits_in(other) || self.rotated().fits_in(other)
    }

    /// Canonical orientation: `length >= width`.
    pub fn normalized(&self) -> Self {
        if self.width > self.length {
            self.rotated()
        } else {
            *self
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.length == 0
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.length)
    }
}

/// A purchasable raw-material unit: a sheet, or a bar in length mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockUnit {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_u32_from_number")]
    pub width: u32,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub length: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl StockUnit {
    pub fn new(id: impl Into<String>, width: u32, length: u32) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            width,
            length,
            price: None,
            weight: None,
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn size(&self) -> Rect {
        Rect::new(self.width, self.length)
    }

    pub fn area(&self) -> u64 {
        self.size().area()
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// One demand line: a piece template and how many copies are required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandRequest {
    #[serde(alias = "id")]
    pub template_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_u32_from_number")]
    pub width: u32,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub length: u32,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub quantity: u32,
}

impl DemandRequest {
    pub fn new(template_id: impl Into<String>, width: u32, length: u32, quantity: u32) -> Self {
        let template_id = template_id.into();
        Self {
            name: template_id.clone(),
            template_id,
            width,
            length,
            quantity,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreeHeuristic {
    #[default]
    MaxRects,
    Guillotine,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NestingMode {
    /// 2-D sheet nesting.
    #[default]
    Sheet,
    /// 1-D length nesting; widths are ignored.
    Linear,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackingProfile {
    #[serde(default, deserialize_with = "deserialize_u32_from_number")]
    pub margin_gap: u32,
    #[serde(default, deserialize_with = "deserialize_u32_from_number")]
    pub border_inset: u32,
    #[serde(default)]
    pub straight_cuts_only: bool,
    #[serde(default)]
    pub heuristic: FreeHeuristic,
}

impl PackingProfile {
    pub fn new(margin_gap: u32, border_inset: u32) -> Self {
        Self {
            margin_gap,
            border_inset,
            ..Default::default()
        }
    }

    pub fn straight_cuts(mut self) -> Self {
        self.straight_cuts_only = true;
        self
    }

    pub fn with_heuristic(mut self, heuristic: FreeHeuristic) -> Self {
        self.heuristic = heuristic;
        self
    }
}

/// Optional bounds a host can put on one search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchLimits {
    /// Maximum number of single-stock packing calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_ms: Option<u64>,
}

/// Raw placement produced by a bin packer, relative to the bin origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub rect: Rect,
    pub x: u32,
    pub y: u32,
    pub rotated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedPiece {
    pub piece: DemandPiece,
    pub x: u32,
    pub y: u32,
    pub placed_width: u32,
    pub placed_length: u32,
    pub rotated: bool,
}

impl PlacedPiece {
    pub fn x_end(&self) -> u32 {
        self.x + self.placed_width
    }

    pub fn y_end(&self) -> u32 {
        self.y + self.placed_length
    }

    pub fn overlaps(&self, other: &PlacedPiece) -> bool {
        self.x < other.x_end()
            && other.x < self.x_end()
            && self.y < other.y_end()
            && other.y < self.y_end()
    }
}

/// Concrete cutting layout for one consumed stock unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockLayout {
    pub stock_id: String,
    pub name: String,
    pub size_label: String,
    pub area: u64,
    pub width: u32,
    pub length: u32,
    pub used_area: u64,
    pub waste_area: u64,
    pub placements: Vec<PlacedPiece>,
}

/// Accepts integral JSON numbers written either as integers or floats (`400` or `400.0`).
pub fn deserialize_u32_from_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    struct U32Visitor;

    impl serde::de::Visitor<'_> for U32Visitor {
        type Value = u32;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("a non-negative integer")
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<u32, E> {
            u32::try_from(v).map_err(|_| E::custom(format!("{v} is out of range")))
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<u32, E> {
            u32::try_from(v).map_err(|_| E::custom(format!("{v} must be non-negative")))
        }

        fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<u32, E> {
            if v.is_finite() && v.fract() == 0.0 && v >= 0.0 && v <= u32::MAX as f64 {
                Ok(v as u32)
            } else {
                Err(E::custom(format!("{v} is not a non-negative integer")))
            }
        }
    }

    deserializer.deserialize_any(U32Visitor)
}
