mod address;
mod bytes32;
mod chain;
mod u256;

pub use address::*;
pub use bytes32::*;
pub use chain::*;
pub use u256::*;
