mod batcher;

pub use batcher::{is_delete_key, InputBatcher, InputEffect};
