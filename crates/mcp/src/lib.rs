// MCP (Model Context Protocol) server exposing GitHub operations
// to agent clients (Claude Code, etc.)

pub mod config;
pub mod protocol;
pub mod server;
pub mod tools;

pub use server::McpServer;
