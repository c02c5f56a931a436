use std::fmt::{Debug, Display, Formatter};

use serde::{Deserialize, Serialize};

#[derive(
    Clone,
    Copy,
    Deserialize,
    PartialEq,
    PartialOrd,
    Serialize,
    derive_more::Add,
    derive_more::AddAssign,
    derive_more::From,
    derive_more::Sub,
    derive_more::Sum,
)]
#[must_use]
pub struct Euros(pub f64);

impl Euros {
    pub const ZERO: Self = Self(0.0);

    /// Round to whole cents, the resolution the statistics are stored at.
    pub fn rounded(self) -> Self {
        Self((self.0 * 100.0).round() / 100.0)
    }
}

impl Display for Euros {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "€{:.2}", self.0)
    }
}

impl Debug for Euros {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "€{:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_rounded() {
        assert_relative_eq!(Euros(3.59999).rounded().0, 3.6);
        assert_relative_eq!(Euros(0.004).rounded().0, 0.0);
    }
}
