pub mod common;
pub mod expression;
pub mod reference;
