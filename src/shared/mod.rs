pub mod config;
pub mod error;
pub mod mail;
pub mod response;
pub mod security;
pub mod storage;
pub mod utils;
