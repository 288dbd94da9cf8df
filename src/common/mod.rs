pub mod document;
pub mod events;
pub mod properties;
