mod parsing;
mod secret;
mod settings;
mod types;

pub(crate) use types::{ConfigError, Settings};

#[cfg(test)]
mod tests;
