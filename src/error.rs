//! Error types for wiring and plugin loading.
//!
//! Grounded on the `thiserror`-based error enums used throughout the pack
//! (e.g. `fa957707_FRC-4121-VikingVision__src-pipeline-component.rs.rs`'s
//! `TypeMismatch`), and chosen over the original engine's plain `bool`
//! return values (`DSPatch::Circuit::ConnectOutToIn` returns `bool`) per
//! the REDESIGN FLAGS section of the spec: a typed `Result` tells the
//! caller *why* a connection was rejected instead of just that it was.

use thiserror::Error;

/// Why a wiring operation (`Circuit::connect` / `Component::connect_input`)
/// was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConnectError {
    #[error("source component is not in this circuit")]
    SourceNotInCircuit,
    #[error("destination component is not in this circuit")]
    DestNotInCircuit,
    #[error("output port {0} is out of range")]
    OutputOutOfRange(usize),
    #[error("input port {0} is out of range")]
    InputOutOfRange(usize),
    #[error("an identical wire already exists")]
    DuplicateWire,
}

/// Why loading a plugin failed.
#[cfg(feature = "plugins")]
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("failed to load plugin library: {0}")]
    Load(#[from] libloading::Error),
    #[error("plugin library does not export a component factory: {0}")]
    MissingFactory(libloading::Error),
}
