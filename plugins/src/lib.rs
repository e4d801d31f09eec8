pub mod capabilities;
pub mod factory;
