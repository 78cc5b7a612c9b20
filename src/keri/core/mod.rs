pub mod filing;
pub mod serdering;
pub mod streaming;
pub mod structing;
