pub mod list;
pub mod lookup;
