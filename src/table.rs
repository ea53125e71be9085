mod cell;
mod csv;
mod frame;
mod metadata;

pub use cell::*;
pub use frame::*;
pub use metadata::*;
