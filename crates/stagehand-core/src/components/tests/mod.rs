// Component scheduler test modules
#[cfg(test)]
mod common;
