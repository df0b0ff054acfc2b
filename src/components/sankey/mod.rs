mod component;
mod format;
mod layout;
mod render;
mod state;

pub use component::SankeyCanvas;
pub use format::format_capacity;
