pub mod args;
pub mod op;
pub mod ops;

pub use ops::{Auth, Bucket, File, Health, Init, Provider, Version};
