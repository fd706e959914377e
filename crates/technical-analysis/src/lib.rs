pub mod indicators;
pub mod pipeline;


pub use indicators::*;
pub use pipeline::*;
