//! Reading store adapters.
//!
//! - [`DynamoReadingStore`]: production store (DynamoDB scan / query).
//! - [`FileReadingStore`]: JSON array on disk, for replays.
//! - [`MemoryReadingStore`]: in-process store for tests.

pub mod dynamo;
pub mod file;
pub mod memory;

pub use dynamo::DynamoReadingStore;
pub use file::FileReadingStore;
pub use memory::MemoryReadingStore;
