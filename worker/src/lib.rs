pub mod config;
pub mod token_exchange;
pub mod token_refresh;
