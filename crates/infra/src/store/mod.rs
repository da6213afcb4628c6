//! Record store adapters implementing `slotwatch_core::RecordStore`

pub mod memory;
pub mod postgrest;

pub use memory::InMemoryRecordStore;
pub use postgrest::PostgrestRecordStore;
