// ABOUTME: Tool registry and dispatch seam between transports and tool implementations
// ABOUTME: Tool business logic lives behind the ToolHandler trait, outside the transport core

//! Tool registration and dispatch
//!
//! The transport layer never knows what a tool does; it resolves a name in
//! the [`ToolRegistry`] and hands over a validated arguments object. Real
//! deployments register their own handlers; [`builtin`] ships two diagnostic
//! tools so the dispatch path works out of the box.

/// Built-in diagnostic tools
pub mod builtin;

/// Tool handler trait and registry
pub mod registry;

pub use registry::{ToolDescriptor, ToolError, ToolHandler, ToolRegistry};
