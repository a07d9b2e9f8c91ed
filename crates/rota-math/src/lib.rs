//! Rota math utilities.

pub mod math;

pub use math::forest::{ForestConfig, RandomForestRegressor};
pub use math::isolation::{IsolationForest, IsolationForestConfig};
pub use math::scaler::StandardScaler;
pub use math::stats::*;
pub use math::MathError;
