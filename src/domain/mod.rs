pub mod cart;
pub mod errors;
pub mod factory;
pub mod order;
pub mod ports;
pub mod status;
