pub mod auth;
pub mod firestore;
pub mod mock_store;

pub use firestore::FirestoreOrderSource;
