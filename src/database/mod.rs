pub mod connection;
pub mod memory;
pub mod quiz;

pub use connection::{Connection, QuizAccessor, StoreResult};
pub use memory::MemoryAccessor;
