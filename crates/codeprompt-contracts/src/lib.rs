pub mod activity;
pub mod catalog;
pub mod chat;
pub mod features;
pub mod local_store;
pub mod results;
pub mod schema;
