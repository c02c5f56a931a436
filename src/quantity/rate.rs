use std::fmt::{Debug, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Energy price per kilowatt-hour.
#[derive(
    Clone,
    Copy,
    Deserialize,
    PartialEq,
    PartialOrd,
    Serialize,
    derive_more::From,
    derive_more::FromStr,
)]
#[must_use]
pub struct EuroPerKilowattHour(pub f64);

impl EuroPerKilowattHour {
    #[must_use]
    pub fn is_positive(self) -> bool {
        self.0 > 0.0
    }
}

impl Display for EuroPerKilowattHour {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "€{:.4}/kWh", self.0)
    }
}

impl Debug for EuroPerKilowattHour {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "€{:.4}", self.0)
    }
}
