//! A front end for the eight command tape language, with two backends: a tape
//! interpreter that runs the tokens directly, and a lowerer that builds a
//! basic block graph for a code generator.

extern crate thiserror;

pub mod brackets;
pub mod cell;
pub mod cfg;
pub mod codegen;
pub mod config;
pub mod error;
pub mod interpreter;
pub mod io;
pub mod lexer;
pub mod pipeline;

pub use crate::{
    config::Config,
    error::Error,
    pipeline::{execute, interpret, lower, Interpretation, Program},
};
