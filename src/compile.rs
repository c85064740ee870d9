pub mod audio;
pub mod overlay;
