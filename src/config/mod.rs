mod server;

pub use server::{GitHubConfig, ServerConfig};
