mod reader;

#[cfg(test)]
pub mod mock;

pub use reader::ReadMemory;

#[cfg(test)]
pub use mock::{MockProcess, MockProcessProvider};
