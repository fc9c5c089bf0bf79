pub mod list;
pub mod text_input;

pub use list::Selection;
pub use text_input::TextInput;
