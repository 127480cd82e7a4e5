//! Core components for signing direct uploads.
//!
//! This crate provides the foundational types and traits shared by every
//! upload backend in the upsign workspace.
//!
//! ## Overview
//!
//! The crate is built around several key concepts:
//!
//! - **SigningRequest**: A minimal `{method, path, raw_query, headers}` value that signers
//!   consume, with adapters from and to `http` request types
//! - **MultipartForm**: An encoder for the `multipart/form-data` bodies posted to object stores
//! - **UploadTarget**: The capability set every storage backend exposes: where the upload
//!   goes and how to build the request that carries the file
//! - **Context**: A container that holds implementations for HTTP sending and environment access
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use upsign_core::{DirectUploadTarget, UploadTarget};
//!
//! # fn example() -> upsign_core::Result<()> {
//! let target = DirectUploadTarget::new("http://127.0.0.1:9000/upload")
//!     .with_field("token", "abc");
//!
//! let req = target.create_upload_request(Path::new("video.mp4"))?;
//! assert_eq!(req.method(), http::Method::POST);
//! # Ok(())
//! # }
//! ```
//!
//! ## Traits
//!
//! - [`UploadTarget`]: For describing where and how a file is uploaded
//! - [`HttpSend`]: For sending HTTP requests
//! - [`Env`]: For environment variable access
//!
//! ## Utilities
//!
//! - [`hash`]: Cryptographic hashing utilities
//! - [`time`]: Time manipulation utilities
//! - [`utils`]: General utilities including data redaction

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod error;
pub use error::{Error, ErrorKind, Result};

mod context;
pub use context::Context;
mod http;
pub use http::HttpSend;
mod env;
pub use env::{Env, OsEnv, StaticEnv};

mod request;
pub use request::{canonical_header_key, SigningRequest};
mod form;
pub use form::{FilePart, MultipartForm};
mod api;
pub use api::{
    build_form_request, read_upload_file, upload_file_name, DirectUploadTarget, UploadTarget,
};
