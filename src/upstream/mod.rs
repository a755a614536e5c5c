pub mod cache;
pub mod client;
pub mod models;
pub mod normalize;
