pub mod actors;
pub mod arena;
pub mod collaborators;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod input;
pub mod placement;
pub mod question_bank;
pub mod result_store;
pub mod rng;
pub mod runtime;
pub mod types;

pub use engine::{Phase, Session, Snapshot};

/// Installs the fmt subscriber on stderr, filtered by `RUST_LOG` with an
/// `info` floor.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .try_init();
}
