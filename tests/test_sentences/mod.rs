// Each test crate uses its own subset of the helpers.
#![allow(dead_code, unused_imports)]

pub mod generate;

pub use generate::{SAMPLE, SentenceBuilder};
