pub mod duckduckgo;
pub mod mock;
pub mod opentdb;
pub mod wikipedia;

pub use duckduckgo::*;
pub use mock::*;
pub use opentdb::*;
pub use wikipedia::*;
