pub mod parse;
pub mod select;
pub mod timing;
