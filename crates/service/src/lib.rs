//! Request/response boundary for Merkle proof operations.
//!
//! Transports hand [`Request`]s to a caller-owned [`SpiContext`] and get a
//! [`Response`] back for each, with failures reported as a [`Status`] code
//! rather than an error.  The context holds any number of independent trees,
//! each behind its own read/write lock.
//!
//! # Direct use
//!
//! ```
//! use spi_codec::encode_to_vec;
//! use spi_service::*;
//!
//! let ctx = SpiContext::new(ContextConfig::default());
//! let params = CreateTreeParams::new(4, 0, 0);
//! let resp = ctx.process_request(
//!     &Request::new(1, Operation::CreateTree).with_payload(encode_to_vec(&params).unwrap()),
//! );
//! assert_eq!(resp.status, Status::Success);
//! ```
//!
//! # Command worker
//!
//! [`spawn_worker`] moves a context onto its own thread and returns a
//! cloneable [`SpiHandle`].  Requests sent through the handle are queued on
//! a bounded channel and answered through a [`CommandCompletionSender`], so
//! the same worker serves both async and blocking callers.
//!
//! ```rust,ignore
//! let (handle, join) = spawn_worker(ctx, DEFAULT_QUEUE_LEN)?;
//! let resp = handle.process(req).await?;
//! drop(handle);
//! let ctx = join.join().unwrap();
//! ```

mod command;
mod context;
mod dispatch;
mod errors;
pub mod payload;
mod types;
mod worker;

pub use command::{CommandCompletionSender, CommandHandle};
pub use context::{
    ContextConfig, DEFAULT_MAX_BATCH_SIZE, DEFAULT_MAX_TREE_SIZE, SharedTree, SpiContext,
};
pub use dispatch::validate_request;
pub use errors::{RequestError, RequestResult, ServiceError};
pub use payload::{CreateTreeParams, TreeInfo};
pub use types::*;
pub use worker::{DEFAULT_QUEUE_LEN, ServiceCommand, SpiHandle, spawn_worker};

