pub mod config;
pub mod fetch;
pub mod logging;
pub mod proxy_check;
pub mod transport;
