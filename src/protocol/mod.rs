//! Wire protocol subsystem.
//!
//! # Data Flow
//! ```text
//! client                                server worker
//!   Request ── codec.rs (u32 length + JSON) ──▶ decode
//!   Response ◀── codec.rs (u32 length + JSON) ── encode
//! ```
//!
//! # Design Decisions
//! - One request and one response per connection, no pipelining
//! - Decode failures are distinguishable from transport failures
//! - Frame size capped before allocating the payload buffer

pub mod codec;
pub mod message;

pub use codec::{FrameError, FramedStream, MAX_FRAME_LEN};
pub use message::{Request, Response};
