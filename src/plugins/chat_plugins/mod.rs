//! Chat-specific rendering: math, chemistry, code, links and images.
pub mod chem;
pub mod highlight;
pub mod image;
pub mod inkjet;
pub mod link;
pub mod math;
pub mod math_block;
