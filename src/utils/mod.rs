pub mod range_utils;

pub use range_utils::LineIndex;
