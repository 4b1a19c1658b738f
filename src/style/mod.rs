pub mod bandit;
pub mod catalog;
pub mod selector;

pub use catalog::{Style, StyleCatalog};
pub use selector::{
    StyleSelector, StyleWeights, DEFAULT_STYLE_WEIGHT, MAX_STYLE_WEIGHT, MIN_STYLE_WEIGHT,
};
