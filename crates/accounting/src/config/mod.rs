pub mod cli;
pub mod cluster;
pub mod report;

pub use cli::*;
pub use cluster::*;
pub use report::*;
