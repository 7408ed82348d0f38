pub mod traits;

// Cloud document stores
pub mod firestore;
pub mod memory;

// Price lookup
pub mod price_api;
