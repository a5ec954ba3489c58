//! Normalize publisher metadata exports and load them into a metadata API.
//!
//! `bibingest` reads the catalogue files small academic presses produce and
//! turns every book into typed records on a remote metadata service, creating
//! what is missing and updating what changed.
//!
//! # Key Features
//!
//! - **Input formats**: CSV, JSON, MARCXML and ONIX 3.0
//! - **Publisher layouts**: one [`Mapper`](pipeline::Mapper) per export, see
//!   [`loaders`]
//! - **Normalization**: ISBN hyphenation, ISSN, DOI and ORCID canonical forms,
//!   dates, titles and page counts
//! - **Idempotent loading**: records already present are matched by DOI,
//!   ISBN, ORCID or name and only changed fields are sent again
//! - **Dry runs** against the in-process [`MemoryApi`](api::memory::MemoryApi)
//!
//! # Normalizing values
//!
//! ```rust
//! use bibingest::identifiers;
//! use bibingest::normalize::{self, Title};
//!
//! let isbn = identifiers::isbn("9781234567897").unwrap();
//! assert_eq!(isbn.as_deref(), Some("978-1-234-56789-7"));
//!
//! let title = Title::split("Foo: Bar");
//! assert_eq!(title.title, "Foo");
//! assert_eq!(title.subtitle.as_deref(), Some("Bar"));
//!
//! assert_eq!(normalize::date("2023").as_deref(), Some("2023-01-01"));
//! ```
//!
//! # Loading a file
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use bibingest::api::memory::MemoryApi;
//! use bibingest::loaders::{self, LoaderKind};
//! use bibingest::pipeline::{Pipeline, PipelineOptions};
//! use bibingest::resolver::NoResolver;
//!
//! let mut pipeline =
//!     Pipeline::new(MemoryApi::new(), NoResolver, PipelineOptions::default()).unwrap();
//! let report = loaders::run(LoaderKind::Punctum, &mut pipeline, Path::new("books.csv")).unwrap();
//! print!("{report}");
//! ```
//!
//! # Error Handling
//!
//! Reading an input file fails with [`LoadError`](error::LoadError). Problems
//! inside one record never stop the run: they are collected per record in the
//! [`RunReport`](report::RunReport).

pub mod api;
pub mod cache;
pub mod config;
pub mod csv;
pub mod draft;
pub mod error;
pub mod identifiers;
pub mod json;
pub mod loaders;
pub mod logging;
pub mod marcxml;
pub mod model;
pub mod normalize;
pub mod onix;
pub mod pipeline;
pub mod reconcile;
mod regex;
pub mod report;
pub mod resolver;

pub use error::{LoadError, ValueError};

pub type Result<T, E = LoadError> = std::result::Result<T, E>;
