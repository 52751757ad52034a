//! Block scanners and chat-specific renderers.
//!
//! `cmark` holds the basic block constructs, `extra` the GFM-style tables and
//! heading slugs, and `chat_plugins` math, chemistry, code, links and images.
pub mod chat_plugins;
pub mod cmark;
pub mod extra;
