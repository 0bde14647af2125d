//! CLI command implementations

pub mod backends;
pub mod cache;
pub mod completions;
pub mod config;
pub mod refresh;
pub mod status;
pub mod upgrade;

pub use backends::execute as backends;
pub use cache::execute as cache;
pub use completions::execute as completions;
pub use config::execute as config;
pub use refresh::execute as refresh;
pub use status::execute as status;
pub use upgrade::execute as upgrade;
