//! Dedicated dispatch thread fed by a command queue.

use std::thread;

use tokio::sync::mpsc;
use tracing::*;

use crate::command::{CommandCompletionSender, CommandHandle};
use crate::context::SpiContext;
use crate::errors::ServiceError;
use crate::types::{Request, Response};

/// Default depth of the worker's input queue.
pub const DEFAULT_QUEUE_LEN: usize = 64;

/// Message accepted by the worker.
#[derive(Debug)]
pub enum ServiceCommand {
    /// Process one request.
    Process(Request, CommandCompletionSender<Response>),

    /// Process several requests in order.
    ProcessBatch(Vec<Request>, CommandCompletionSender<Vec<Response>>),
}

/// Handle for submitting requests to a worker spawned with [`spawn_worker`].
///
/// The worker exits once every handle has been dropped.
#[derive(Clone, Debug)]
pub struct SpiHandle {
    inner: CommandHandle<ServiceCommand>,
}

impl SpiHandle {
    /// Returns the underlying command handle.
    pub fn command_handle(&self) -> &CommandHandle<ServiceCommand> {
        &self.inner
    }

    /// Number of commands waiting for the worker.
    pub fn pending(&self) -> usize {
        self.inner.pending()
    }

    /// Submits a request and waits for its response.
    pub async fn process(&self, req: Request) -> Result<Response, ServiceError> {
        self.inner
            .send_and_wait(|c| ServiceCommand::Process(req, c))
            .await
    }

    /// Blocking version of [`Self::process`].
    pub fn process_blocking(&self, req: Request) -> Result<Response, ServiceError> {
        self.inner
            .send_and_wait_blocking(|c| ServiceCommand::Process(req, c))
    }

    /// Submits several requests and waits for all their responses.
    pub async fn process_batch(&self, reqs: Vec<Request>) -> Result<Vec<Response>, ServiceError> {
        self.inner
            .send_and_wait(|c| ServiceCommand::ProcessBatch(reqs, c))
            .await
    }

    /// Blocking version of [`Self::process_batch`].
    pub fn process_batch_blocking(&self, reqs: Vec<Request>) -> Result<Vec<Response>, ServiceError> {
        self.inner
            .send_and_wait_blocking(|c| ServiceCommand::ProcessBatch(reqs, c))
    }
}

/// Moves `ctx` onto a new thread that processes commands until every handle
/// is dropped, then hands the context back through the join handle.
pub fn spawn_worker(
    ctx: SpiContext,
    queue_len: usize,
) -> Result<(SpiHandle, thread::JoinHandle<SpiContext>), ServiceError> {
    let (tx, rx) = mpsc::channel(queue_len.max(1));
    let join = thread::Builder::new()
        .name("spi-worker".to_owned())
        .spawn(move || worker_task(ctx, rx))?;

    let handle = SpiHandle {
        inner: CommandHandle::new(tx),
    };
    Ok((handle, join))
}

fn worker_task(ctx: SpiContext, mut rx: mpsc::Receiver<ServiceCommand>) -> SpiContext {
    debug!("spi worker started");

    while let Some(cmd) = rx.blocking_recv() {
        match cmd {
            ServiceCommand::Process(req, completion) => {
                let span = debug_span!("handlemsg", kind = "process");
                let _g = span.enter();
                completion.send_blocking(ctx.process_request(&req));
            }
            ServiceCommand::ProcessBatch(reqs, completion) => {
                let span = debug_span!("handlemsg", kind = "batch", len = reqs.len());
                let _g = span.enter();
                completion.send_blocking(ctx.process_batch(&reqs));
            }
        }
    }

    debug!(trees = ctx.num_trees(), "all handles dropped, spi worker exiting");
    ctx
}

#[cfg(test)]
mod tests {
    use spi_codec::{decode_buf_exact, encode_to_vec};

    use super::*;
    use crate::context::ContextConfig;
    use crate::payload::{CreateTreeParams, TreeInfo};
    use crate::types::{Operation, Status, TreeId};

    fn create_req(id: u32) -> Request {
        let params = CreateTreeParams::new(2, 0, 0);
        Request::new(id, Operation::CreateTree).with_payload(encode_to_vec(&params).unwrap())
    }

    #[test]
    fn test_blocking_roundtrip() {
        let (handle, join) = spawn_worker(SpiContext::new(ContextConfig::default()), 4).unwrap();

        let resp = handle.process_blocking(create_req(1)).unwrap();
        assert_eq!(resp.status, Status::Success);
        let info: TreeInfo = decode_buf_exact(&resp.payload).unwrap();
        let id = TreeId(*info.tree_id());

        let build = Request::new(2, Operation::BuildTree)
            .with_tree(id)
            .with_payload(vec![5; 64]);
        let proof = Request::new(3, Operation::GenerateProof)
            .with_tree(id)
            .with_leaf_index(1);
        let resps = handle.process_batch_blocking(vec![build, proof]).unwrap();
        assert_eq!(resps.len(), 2);
        assert!(resps.iter().all(|r| r.status.is_success()));
        assert_eq!(resps[1].payload.len(), 32 + 8 + 8 + 33 + 32);

        drop(handle);
        let ctx = join.join().unwrap();
        assert_eq!(ctx.num_trees(), 1);
    }

    #[tokio::test]
    async fn test_async_handle() {
        let (handle, join) =
            spawn_worker(SpiContext::new(ContextConfig::default()), DEFAULT_QUEUE_LEN).unwrap();

        let a = handle.process(create_req(1)).await.unwrap();
        let b = handle.process(create_req(2)).await.unwrap();
        let ia: TreeInfo = decode_buf_exact(&a.payload).unwrap();
        let ib: TreeInfo = decode_buf_exact(&b.payload).unwrap();
        assert_eq!(*ia.tree_id(), 1);
        assert_eq!(*ib.tree_id(), 2);

        let resps = handle
            .process_batch(vec![Request::new(3, Operation::DestroyTree).with_tree(TreeId(1))])
            .await
            .unwrap();
        assert_eq!(resps[0].status, Status::Success);

        drop(handle);
        let ctx = join.join().unwrap();
        assert_eq!(ctx.num_trees(), 1);
    }
}
