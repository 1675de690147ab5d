//! Web Module - HTTP service layer (thin framework glue)

pub mod server;

pub use server::{router, serve, AppState};
