//! Client-side persistence layer of the MBlog CMS.
//!
//! Content collections, categories, the profile and site settings are stored
//! as JSON documents in a string key-value store. Every write is validated,
//! backed up and announced on a synchronous event bus; every read recovers
//! from corrupt data instead of failing.

pub mod backup;
#[cfg(feature = "sqlite")]
pub mod db;
pub mod domain;
pub mod error;
pub mod error_conversions;
pub mod events;
pub mod models;
pub mod repository;
#[cfg(feature = "sqlite")]
pub mod schema;
pub mod services;
pub mod storage;
