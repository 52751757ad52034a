//! GFM-style extras: pipe tables, heading slugs and typography.
pub mod slugger;
pub mod tables;
pub mod typographer;
