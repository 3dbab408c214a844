pub mod config;
pub mod form_state;
pub mod kv;
pub mod logging;
