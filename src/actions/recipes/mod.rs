//! Recipes shipped with stepflow

pub mod cache;
pub mod docker;
pub mod http;
pub mod slack;

pub use cache::CacheRecipe;
pub use docker::DockerRecipe;
pub use http::HttpRecipe;
pub use slack::SlackRecipe;
