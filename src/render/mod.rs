pub mod compositor;
pub mod settings;
