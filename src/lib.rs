//! Server-side rendering of webpack-built bundles in an external interpreter.
//!
//! A render resolves a bundle name through the build manifest, fetches the
//! bundle (from the dev server, retrying while it compiles, or from the
//! public directory), wraps it with a console-capturing preamble and the
//! serialized props, and runs it, returning what it wrote to stdout.

pub mod config;
pub mod error;
pub mod execution;
pub mod fetcher;
pub mod process;
pub mod registry;
pub mod renderer;
pub mod resolver;
pub mod script;

pub use error::{Error, Result};
pub use renderer::{render, OutputTemp, RenderOptions, Renderer};
