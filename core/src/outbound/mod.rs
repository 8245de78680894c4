//! Driven adapters implementing the domain's repository ports.

pub mod memory;

pub use memory::InMemoryStore;
