//! Name-resolution adapters.

mod null;
mod route_file;

pub use null::NullResolver;
pub use route_file::{RouteFileResolver, default_routes_path};
