#![warn(clippy::all, missing_docs)]

//! Core domain logic for the recipebox terminal app.
//!
//! This crate hosts the recipe data model, configuration handling,
//! the single-slot persistence layer, and the card render mapping
//! used by the terminal UI and any future frontends.

pub mod card;
pub mod config;
pub mod models;
pub mod store;

pub use card::{render, CardView};
pub use config::AppConfig;
pub use models::Recipe;
pub use store::{RecipeStore, StoreError};
