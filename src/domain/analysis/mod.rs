// Market structure analysis domain
pub mod correlation;
pub mod regime;
pub mod report;
pub mod stats;
pub mod volatility;
pub mod volume_profile;
