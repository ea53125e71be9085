mod decoder;
mod error;
mod measurement;
mod sensor_family;
mod sensors;

pub use decoder::*;
pub use error::*;
pub use measurement::*;
pub use sensor_family::*;
