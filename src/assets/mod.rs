pub mod decode;
pub mod handle;
