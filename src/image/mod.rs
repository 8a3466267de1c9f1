pub mod feature;
pub mod io;
pub mod preprocess;
pub mod traits;

pub use self::feature::FeatureMap;
pub use self::preprocess::{ChannelOrder, Preprocess};
pub use self::traits::{FeatureView, Rows};
