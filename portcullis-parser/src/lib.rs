//! Parsers for the textual forms exchanged with portcullis: `Authorization`
//! style credentials and `WWW-Authenticate` style challenges.
//!
//! These grammars are kept in their own crate so that the pipeline and the
//! HTTP adapters share one definition of what a well formed header looks like.

pub mod error;
pub mod parser;
