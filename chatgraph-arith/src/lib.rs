//! Integer arithmetic tool server.
//!
//! Exposes `add`, `sub`, `mul`, `div` and `mod` over line-delimited JSON-RPC 2.0
//! (`initialize`, `tools/list`, `tools/call`). Each tool takes integer arguments `a` and `b`.
//! Division and modulus floor toward negative infinity; a zero divisor is reported as a tool
//! error ("Division by zero is not allowed", "Modulo by zero is not allowed").
//!
//! Run as a subprocess with the `arith-server` binary, or embed [`serve`] over any async reader
//! and writer.

pub mod ops;
pub mod server;

pub use ops::{ArithError, ArithOp};
pub use server::{handle, handle_line, serve, Request, Response, SERVER_NAME};
