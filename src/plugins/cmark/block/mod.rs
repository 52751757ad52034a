pub mod blockquote;
pub mod fence;
pub mod heading;
pub mod hr;
pub mod list;
pub mod paragraph;
