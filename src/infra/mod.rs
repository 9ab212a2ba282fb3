//! Upstream access: fetching, payload shapes, aggregation and the JSON route.

pub mod aggregator;
pub mod fetch;
#[cfg(test)]
pub(crate) mod mock;
pub mod server;
pub mod shapes;
