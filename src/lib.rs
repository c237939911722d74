#![doc = include_str!("RUSTDOC.md")]

#[cfg(all(target_arch = "wasm32", not(feature = "wasm-web")))]
compile_error!("Building nexcard-sw for wasm32 requires enabling the `wasm-web` feature.");

pub mod logger;
pub mod platform;
pub mod worker;

#[cfg(test)]
pub mod test_support;
