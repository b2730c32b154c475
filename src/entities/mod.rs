pub mod product;
pub mod warehouse;
