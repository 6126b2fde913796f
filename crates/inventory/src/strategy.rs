//! Location selection policies.
//!
//! Selection is pure: strategies read candidate occupancy but never change it.
//! Committing a choice is the allocator's job, so a selected location can
//! still turn out to be taken by the time it is occupied.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use stockroom_core::DomainError;
use stockroom_products::Product;

use crate::location::Location;

/// Placement policy for new units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStrategy {
    /// "Nearest entrance": first qualifying candidate in supplied order.
    #[default]
    FirstFit,
    /// "Optimal space": qualifying candidate with the least slack; ties go to
    /// the earliest candidate.
    BestFit,
}

impl PlacementStrategy {
    /// Select a location for `product` from `candidates`.
    ///
    /// A candidate qualifies when it is unoccupied and the product fits on
    /// every axis.
    pub fn select<'a>(&self, product: &Product, candidates: &'a [Location]) -> Option<&'a Location> {
        let item = product.dimensions();
        let mut qualifying = candidates
            .iter()
            .filter(|loc| loc.is_available())
            .filter_map(|loc| item.slack_within(loc.dimensions()).map(|slack| (loc, slack)));

        match self {
            PlacementStrategy::FirstFit => qualifying.next().map(|(loc, _)| loc),
            PlacementStrategy::BestFit => {
                let mut best: Option<(&Location, f64)> = None;
                for (loc, slack) in qualifying {
                    // Strictly less: the first of equal-slack candidates wins.
                    if best.is_none_or(|(_, min)| slack < min) {
                        best = Some((loc, slack));
                    }
                }
                best.map(|(loc, _)| loc)
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlacementStrategy::FirstFit => "first_fit",
            PlacementStrategy::BestFit => "best_fit",
        }
    }
}

impl fmt::Display for PlacementStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlacementStrategy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "first_fit" | "nearest_entrance" => Ok(PlacementStrategy::FirstFit),
            "best_fit" | "optimal_space" => Ok(PlacementStrategy::BestFit),
            other => Err(DomainError::validation(format!(
                "unknown placement strategy: {other}"
            ))),
        }
    }
}
