#![cfg(test)]

pub mod lifecycle_tests;
