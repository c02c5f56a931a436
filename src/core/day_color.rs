use serde::{Deserialize, Serialize};

/// Tempo tariff day color, published one day at a time by the grid operator.
#[derive(
    Copy,
    Clone,
    Debug,
    Deserialize,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum DayColor {
    #[serde(alias = "BLUE")]
    #[display("blue")]
    Blue,

    #[serde(alias = "WHITE")]
    #[display("white")]
    White,

    #[serde(alias = "RED")]
    #[display("red")]
    Red,
}
