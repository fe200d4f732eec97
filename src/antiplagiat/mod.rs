mod client;
pub mod protocol;

pub use client::{CheckApi, RemoteCheckClient};
