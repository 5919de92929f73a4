//! Data models for catalog goods, recipes and voltage tiers

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoodsKind {
    Item,
    Fluid,
}

impl GoodsKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GoodsKind::Item => "item",
            GoodsKind::Fluid => "fluid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "item" => Some(GoodsKind::Item),
            "fluid" => Some(GoodsKind::Fluid),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Goods {
    pub id: String,
    pub name: String,
    pub kind: GoodsKind,
}

impl Goods {
    /// Amount a freshly added product starts with: one bucket for fluids,
    /// one unit for items.
    pub fn default_product_amount(&self) -> f64 {
        match self.kind {
            GoodsKind::Fluid => 1000.0,
            GoodsKind::Item => 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub id: String,
    /// Machine type that runs the recipe (e.g., "Bending Machine")
    pub machine: String,
    pub duration_secs: f64,
    /// Lowest voltage tier able to run the recipe
    pub min_tier: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecipeIo {
    pub recipe_id: String,
    pub goods_id: String,
    /// Amount per craft
    pub amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoltageTier {
    pub name: &'static str,
    pub voltage: u64,
}

pub const VOLTAGE_TIERS: [VoltageTier; 15] = [
    VoltageTier { name: "ULV", voltage: 8 },
    VoltageTier { name: "LV", voltage: 32 },
    VoltageTier { name: "MV", voltage: 128 },
    VoltageTier { name: "HV", voltage: 512 },
    VoltageTier { name: "EV", voltage: 2_048 },
    VoltageTier { name: "IV", voltage: 8_192 },
    VoltageTier { name: "LuV", voltage: 32_768 },
    VoltageTier { name: "ZPM", voltage: 131_072 },
    VoltageTier { name: "UV", voltage: 524_288 },
    VoltageTier { name: "UHV", voltage: 2_097_152 },
    VoltageTier { name: "UEV", voltage: 8_388_608 },
    VoltageTier { name: "UIV", voltage: 33_554_432 },
    VoltageTier { name: "UMV", voltage: 134_217_728 },
    VoltageTier { name: "UXV", voltage: 536_870_912 },
    VoltageTier { name: "MAX", voltage: 2_147_483_648 },
];

pub const MAX_TIER: u8 = (VOLTAGE_TIERS.len() - 1) as u8;

pub fn tier_name(tier: u8) -> &'static str {
    VOLTAGE_TIERS
        .get(tier as usize)
        .map_or("?", |t| t.name)
}

/// Accepts either a tier name ("MV", case-insensitive) or its index ("2").
pub fn parse_tier(s: &str) -> Option<u8> {
    if let Ok(index) = s.parse::<u8>() {
        return (index <= MAX_TIER).then_some(index);
    }
    VOLTAGE_TIERS
        .iter()
        .position(|t| t.name.eq_ignore_ascii_case(s))
        .map(|i| i as u8)
}

impl fmt::Display for Goods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_names_parse_both_ways() {
        assert_eq!(parse_tier("mv"), Some(2));
        assert_eq!(parse_tier("LuV"), Some(6));
        assert_eq!(parse_tier("14"), Some(MAX_TIER));
        assert_eq!(parse_tier("15"), None);
        assert_eq!(parse_tier("warp"), None);
        assert_eq!(tier_name(MAX_TIER), "MAX");
    }

    #[test]
    fn fluids_default_to_a_bucket() {
        let water = Goods {
            id: "water".into(),
            name: "Water".into(),
            kind: GoodsKind::Fluid,
        };
        assert_eq!(water.default_product_amount(), 1000.0);
    }
}
