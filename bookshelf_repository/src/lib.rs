pub mod api;
pub mod book_repository;
pub mod error;
pub mod favorites_store;
pub mod live;
pub mod remote_data_source;

#[cfg(any(feature = "client", test))]
pub mod client;
