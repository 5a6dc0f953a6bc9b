//! pgmirror - bidirectional PostgreSQL schema synchronization.
//!
//! This crate reads the system catalogs of a live database into a typed
//! schema model, serializes that model to declarative YAML, and computes the
//! ordered DDL delta between a YAML description and a live database.
//!
//! # Quick start
//!
//! ```no_run
//! use pgmirror::model::Database;
//! use pgmirror::diff::{compute_diff, planner::plan_changes};
//! use pgmirror::pg::sqlgen::generate_sql;
//!
//! let current = Database::new();
//! let desired: Database = pgmirror::yaml::load::database_from_str("schema public:\n  owner: postgres\n").unwrap();
//! let plan = compute_diff(&current, &desired).unwrap();
//! for statement in generate_sql(&plan_changes(plan, &current, &desired)) {
//!     println!("{statement}");
//! }
//! ```
//!
//! # Modules
//!
//! - [`model`] - Schema model types for every catalog object kind
//! - [`yaml`] - Model to/from YAML mapping and the multiple-files layout
//! - [`depend`] - Dependency linker building the object graph
//! - [`diff`] - Schema comparison and change planning
//! - [`pg`] - Catalog reader and SQL generation
//! - [`augment`] - Audit-column augmentation of a desired model

pub mod apply;
pub mod augment;
pub mod cli;
pub mod config;
pub mod depend;
pub mod diff;
pub mod filter;
pub mod model;
pub mod pg;
pub mod util;
pub mod yaml;
