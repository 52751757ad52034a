pub mod block;
pub mod cache;
pub mod constants;
pub mod inline;
pub mod node;
pub mod preprocess;
pub mod renderer;
pub mod sanitize;
pub mod token;
pub mod tokenizer;
