pub mod cli;
pub mod cloudprovider;
pub mod config;
pub mod constants;
pub mod manifest;
pub mod ocm;
pub mod packages;
pub mod service;

pub use anyhow::Result;
