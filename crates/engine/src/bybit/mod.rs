mod rest;

pub use rest::BybitClient;
