//! Utility modules

pub mod path_normalizer;
