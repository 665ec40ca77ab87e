pub mod builder;
pub mod encoding;
pub mod row;

pub use builder::{build_features, DerivedRatios, FeatureBuilder};
pub use encoding::OneHotEncoder;
pub use row::FeatureRow;
