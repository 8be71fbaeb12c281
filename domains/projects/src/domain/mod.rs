pub mod entities;
pub mod identity;
pub mod state;
