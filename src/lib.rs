pub mod core;
pub mod dataprovider;
pub mod handlers;
pub mod models;
pub mod scanner;
pub mod stores;
pub mod utils;
