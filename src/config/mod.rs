// ABOUTME: Configuration module exposing environment-based server settings
// ABOUTME: All configuration comes from environment variables, no config files

//! Configuration management

/// Environment-based configuration
pub mod environment;
