//! Built-in locales.

mod de;
mod en;
mod zh;

pub use de::german;
pub use en::english;
pub use zh::simplified_chinese;
