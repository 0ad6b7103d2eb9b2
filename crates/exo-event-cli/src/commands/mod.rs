pub mod conform;
pub mod encode;
pub mod export;
