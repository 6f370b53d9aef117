mod blocks;
mod markers;
mod sanitize;

pub use blocks::{parse, parse_settled, BlockParser, ParserOptions};
pub use markers::find_continuation;
pub use sanitize::sanitize;
