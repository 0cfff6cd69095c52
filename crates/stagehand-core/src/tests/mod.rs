#[cfg(test)]
pub mod integration;
