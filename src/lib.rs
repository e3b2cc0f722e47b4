pub mod app;
pub mod config;
pub mod error;
pub mod filter;
pub mod formation;
pub mod http_client;
pub mod local_store;
pub mod logging;
pub mod model;
pub mod preferences;
pub mod remote;
pub mod search;
pub mod session;
pub mod sync;
pub mod value;
