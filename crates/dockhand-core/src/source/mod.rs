//! Configuration sources: remote location and local ancestor files

mod local;
mod remote;

pub use local::load_local_layers;
pub use remote::{DEFAULT_REMOTE_FILE, RemoteFetcher};
