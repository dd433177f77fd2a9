pub mod evaluate;
pub mod filter;
pub mod sets;
pub mod version;
