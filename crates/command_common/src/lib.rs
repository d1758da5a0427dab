//! Shared types for the Command API: the persistence model, transfer
//! shapes, mapping, patch documents and configuration.

pub mod config;
pub mod dtos;
pub mod mapper;
pub mod model;
pub mod patch;

pub use config::{
    BackendKind, CommandApiConfig, ConfigError, DatabaseConfig, DbLocation, LogConfig, ServerConfig,
};
pub use dtos::{CommandCreateDto, CommandReadDto, CommandUpdateDto};
pub use model::Command;
pub use patch::{PatchDocument, PatchError, PatchOperation};
