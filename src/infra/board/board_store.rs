// Implementations of the board store.

pub mod in_memory;
pub mod sqlite_store;

// Re-export for convenience
pub use in_memory::InMemoryBoardStore;
pub use sqlite_store::SqliteBoardStore;
