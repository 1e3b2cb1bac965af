//! Backend side of the GUI: command queue types and the worker thread that owns the upload controller.

pub mod commands;
pub mod runtime;
