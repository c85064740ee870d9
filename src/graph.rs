pub mod builder;
pub mod filter;
