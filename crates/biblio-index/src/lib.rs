pub mod flat;
pub mod store;

pub use flat::{normalize_l2, FlatIndex};
pub use store::{load_pair, save_pair};
