pub mod data_source;
pub mod descriptor;

pub use data_source::*;
pub use descriptor::*;
