use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::core::error::ConsensusError;

/// Raw units per whole stake unit (18 decimals, as on-chain balances are denominated).
pub const RAW_UNITS_PER_WHOLE: u128 = 1_000_000_000_000_000_000;

/// A stake amount in the smallest on-chain denomination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stake(pub u128);

impl Stake {
    pub const fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    pub const fn from_whole_units(units: u64) -> Self {
        Self(units as u128 * RAW_UNITS_PER_WHOLE)
    }

    /// Truncating conversion to whole units.
    pub const fn whole_units(&self) -> u128 {
        self.0 / RAW_UNITS_PER_WHOLE
    }
}

impl FromStr for Stake {
    type Err = ConsensusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u128>()
            .map(Stake::from_raw)
            .map_err(|e| ConsensusError::invalid("stake", format!("`{}` is not a raw amount: {}", s, e)))
    }
}

/// Stake multiplier: linear below `zeta`, `zeta + sqrt(stake - zeta)` from `zeta` up to the cap.
pub fn staking_modifier(stake: Stake, zeta: f64, max_stake: f64) -> f64 {
    let units = (stake.whole_units() as f64).min(max_stake);
    if units >= zeta {
        zeta + (units - zeta).sqrt()
    } else {
        units
    }
}
