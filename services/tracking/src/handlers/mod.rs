pub mod attribution;
pub mod collect;
pub mod events;
