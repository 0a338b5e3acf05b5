pub mod gesture;
pub mod state;
