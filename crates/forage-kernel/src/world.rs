//! Resource field generation for the foraging task.
//!
//! Coins are scattered around a handful of centroids; the coordinator's
//! invested endowment fraction determines the probability that each coin is
//! revealed on a forager's map.
//!
//! Randomness is explicit: every generating function takes the RNG as an
//! argument, so a seeded `StdRng` reproduces a field exactly and nothing in
//! this crate touches global random state.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Shape of the resource field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldParams {
    /// Number of resource clusters.
    #[serde(default = "default_num_centroids")]
    pub num_centroids: usize,

    /// Total coins scattered across the clusters.
    #[serde(default = "default_num_coins")]
    pub num_coins: usize,

    /// Maximum per-axis offset of a coin from its centroid.
    #[serde(default = "default_dispersion")]
    pub dispersion: f64,

    /// Side length of the square the centroids are drawn from.
    #[serde(default = "default_extent")]
    pub extent: f64,
}

fn default_num_centroids() -> usize {
    2
}

fn default_num_coins() -> usize {
    100
}

fn default_dispersion() -> f64 {
    10.0
}

fn default_extent() -> f64 {
    100.0
}

impl Default for FieldParams {
    fn default() -> Self {
        Self {
            num_centroids: default_num_centroids(),
            num_coins: default_num_coins(),
            dispersion: default_dispersion(),
            extent: default_extent(),
        }
    }
}

/// One coin, tagged with the cluster it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    pub x: f64,
    pub y: f64,
    pub centroid: usize,
}

/// A generated resource field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinField {
    pub centroids: Vec<(f64, f64)>,
    pub coins: Vec<Coin>,
}

impl CoinField {
    /// Generate a field from explicit parameters and an explicit RNG.
    ///
    /// Coins are dealt round-robin across centroids and offset uniformly
    /// within `[-dispersion, dispersion]` on each axis. A field with zero
    /// centroids has no coins.
    pub fn generate(params: &FieldParams, rng: &mut impl Rng) -> CoinField {
        let centroids: Vec<(f64, f64)> = (0..params.num_centroids)
            .map(|_| (coord(params.extent, rng), coord(params.extent, rng)))
            .collect();

        let coins = if centroids.is_empty() {
            Vec::new()
        } else {
            (0..params.num_coins)
                .map(|i| {
                    let centroid = i % centroids.len();
                    let (cx, cy) = centroids[centroid];
                    Coin {
                        x: cx + offset(params.dispersion, rng),
                        y: cy + offset(params.dispersion, rng),
                        centroid,
                    }
                })
                .collect()
        };

        CoinField { centroids, coins }
    }

    /// The coins revealed to a forager for a given investment fraction.
    ///
    /// Each coin is shown independently with probability equal to the
    /// invested fraction of the endowment, clamped to `[0, 1]`.
    pub fn visible_coins(&self, investment: f64, rng: &mut impl Rng) -> Vec<Coin> {
        let p = if investment.is_finite() {
            investment.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.coins
            .iter()
            .copied()
            .filter(|_| rng.gen_bool(p))
            .collect()
    }
}

fn coord(extent: f64, rng: &mut impl Rng) -> f64 {
    if extent > 0.0 {
        rng.gen_range(0.0..extent)
    } else {
        0.0
    }
}

fn offset(dispersion: f64, rng: &mut impl Rng) -> f64 {
    if dispersion > 0.0 {
        rng.gen_range(-dispersion..=dispersion)
    } else {
        0.0
    }
}
