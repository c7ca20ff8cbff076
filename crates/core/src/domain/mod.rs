pub mod features;
pub mod product;
pub mod segment;
