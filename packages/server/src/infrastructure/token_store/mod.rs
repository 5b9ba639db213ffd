//! TokenStore implementations.

pub mod inmemory;

pub use inmemory::InMemoryTokenStore;
