mod client;
mod error;
mod models;
mod query;
mod transport;

pub use client::*;
pub use error::*;
pub use models::*;
pub use query::*;
pub use transport::*;
