pub mod bench;
pub mod client_app;
pub mod client_net;
pub mod config;
pub mod connection;
pub mod directory;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod offline;
pub mod popular;
pub mod protocol;
pub mod room;
pub mod server;
pub mod user;

/// Installs a `tracing` subscriber honoring `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
