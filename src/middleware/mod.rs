pub mod locale;

pub use locale::{page_guard, Locale};
