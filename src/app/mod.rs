pub mod keymap;
mod keymap_ext;
mod state;
mod types;

pub use types::{ActivePanel, App, InputMode, Popup, View};
