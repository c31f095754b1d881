pub mod decorate;
pub mod init_config;
pub mod pipeline;
pub mod summarize;
