mod discount;

pub use discount::*;
