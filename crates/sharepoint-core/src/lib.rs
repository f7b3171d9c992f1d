//! Microsoft Graph client for SharePoint document libraries.
//!
//! This crate maps virtual file paths such as `/Reports/q1.xlsx` onto the
//! default document library of a single SharePoint site and performs file
//! operations against it through Microsoft Graph.
//!
//! # Key Components
//!
//! - **Configuration**: [`Config`] loaded from the environment or a TOML file
//! - **Credentials**: [`credential::TokenProvider`] with the Azure
//!   implementation [`AzureCredential`]
//! - **Resolver**: lazily cached site and drive identifiers
//! - **Facade**: [`SharePointClient`] with list, read, write, delete, create
//!   folder, existence and site metadata operations
//!
//! # Example
//!
//! ```no_run
//! use sharepoint_core::{Config, SharePointClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = SharePointClient::new(Config::from_env()?)?;
//!
//! client.create_folder("/Reports").await?;
//! client.write_file("/Reports/q1.txt", "revenue: 42", true).await?;
//! let text = client.read_file_text("/Reports/q1.txt", Default::default()).await?;
//! assert_eq!(text, "revenue: 42");
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! [`SharePointClient`] is `Clone + Send + Sync`. Clones share the resolved
//! identifiers, which are the only mutable state.

pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod graph;
pub mod path;
pub mod resolver;
pub mod text;
pub mod types;

pub use client::{SharePointClient, SharePointClientBuilder};
pub use config::{Config, ConfigError};
pub use credential::{AzureCredential, CredentialSource, TokenProvider};
pub use error::{Error, Result};
pub use text::TextEncoding;
pub use types::{Descriptor, ItemKind, SiteInfo};
