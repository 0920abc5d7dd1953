//! Persistence adapters: relational store and object storage

pub mod database;
pub mod object_store;

pub use database::DocumentDb;
pub use object_store::{LocalObjectStore, ObjectStore};
