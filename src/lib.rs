pub mod api;
pub mod coin_resolver;
pub mod config;
pub mod error;
pub mod http;
pub mod pager;
pub mod portfolio;
pub mod providers;
pub mod risk_engine;
pub mod server;
pub mod trade_plan;
pub mod utils;
