//! Docker domain — connection, container lifecycle, and inventory shaping.

pub mod client;
pub mod container;
pub mod error_map;
pub mod inventory;
