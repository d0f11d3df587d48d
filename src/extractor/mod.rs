pub mod api;
pub mod client;
pub mod download;
pub mod extract;
pub mod json;
pub mod player;
pub mod ytcfg;
