pub mod events;
mod models;
mod schema;
mod store;

pub use events::*;
pub use store::{DataStore, TxRef};
