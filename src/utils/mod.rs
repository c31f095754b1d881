pub mod input;
pub(crate) mod progress_bar_builder;
