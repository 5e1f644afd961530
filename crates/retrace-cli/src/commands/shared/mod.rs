pub mod input;
pub mod limit;
