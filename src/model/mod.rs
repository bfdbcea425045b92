pub mod bed;
pub mod board;
pub mod config;
pub mod fragment;
pub mod task;

pub use bed::*;
pub use board::*;
pub use config::*;
pub use fragment::*;
pub use task::*;
