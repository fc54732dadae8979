//! Request validation and per-operation handlers.

use std::time::Instant;

use spi_codec::{CodecError, decode_buf_exact, encode_to_vec};
use spi_hash::HashAlgorithm;
use spi_merkle::{MerkleError, MerkleProof, ProofVerifier};
use tracing::*;

use crate::context::{ContextConfig, SpiContext, read_tree, write_tree};
use crate::errors::{RequestError, RequestResult};
use crate::payload::{
    CreateTreeParams, VerifyProofPayload, decode_batch_verify, encode_byte_list, encode_results,
};
use crate::types::{Operation, Request, RequestId, Response, Status};

/// Checks the envelope fields before any tree is touched.
pub fn validate_request(req: &Request, config: &ContextConfig) -> RequestResult<()> {
    if req.request_id == RequestId(0) {
        return Err(RequestError::Invalid("zero request id"));
    }
    if req.leaf_indices.len() > config.max_batch_size {
        return Err(RequestError::Invalid("batch too large"));
    }
    if req.leaf_index >= config.max_tree_size {
        return Err(RequestError::Invalid("leaf index beyond max tree size"));
    }
    if req.operation.needs_tree() && req.tree_id.0 == 0 {
        return Err(RequestError::Invalid("zero tree id"));
    }
    Ok(())
}

/// Deadline tracking for one request.
#[derive(Copy, Clone, Debug)]
struct Deadline(Option<Instant>);

impl Deadline {
    fn check(self) -> RequestResult<()> {
        match self.0 {
            Some(at) if Instant::now() >= at => Err(RequestError::Timeout),
            _ => Ok(()),
        }
    }
}

impl SpiContext {
    /// Processes one request.  Failures are reported through the response
    /// status, never as an error.
    pub fn process_request(&self, req: &Request) -> Response {
        let span = debug_span!(
            "request",
            id = %req.request_id,
            op = ?req.operation,
            tree = %req.tree_id
        );
        let _g = span.enter();

        let start = Instant::now();
        let deadline = Deadline(req.timeout.and_then(|t| start.checked_add(t)));

        let res = validate_request(req, self.config()).and_then(|_| self.dispatch(req, deadline));
        let processing_time = start.elapsed();

        let (status, payload) = match res {
            Ok(payload) => {
                debug!(?processing_time, "request done");
                (Status::Success, payload)
            }
            Err(e) => {
                let status = e.status();
                warn!(%e, %status, ?processing_time, "request failed");
                (status, Vec::new())
            }
        };

        Response {
            request_id: req.request_id,
            status,
            payload,
            processing_time,
        }
    }

    /// Processes requests in order.  Each gets its own response, one failing
    /// does not affect the others.
    pub fn process_batch(&self, reqs: &[Request]) -> Vec<Response> {
        reqs.iter().map(|r| self.process_request(r)).collect()
    }

    fn dispatch(&self, req: &Request, deadline: Deadline) -> RequestResult<Vec<u8>> {
        match req.operation {
            Operation::CreateTree => self.handle_create(req),
            Operation::BuildTree => self.handle_build(req),
            Operation::UpdateLeaf => self.handle_update(req),
            Operation::GenerateProof => self.handle_prove(req),
            Operation::VerifyProof => self.handle_verify(req),
            Operation::BatchGenerate => self.handle_batch_prove(req, deadline),
            Operation::BatchVerify => self.handle_batch_verify(req, deadline),
            Operation::TreeInfo => Ok(encode_to_vec(&self.tree_info(req.tree_id)?)?),
            Operation::DestroyTree => {
                self.destroy_tree(req.tree_id)?;
                Ok(Vec::new())
            }
        }
    }

    fn handle_create(&self, req: &Request) -> RequestResult<Vec<u8>> {
        let params = decode_buf_exact::<CreateTreeParams>(&req.payload)?;
        let alg = HashAlgorithm::try_from(*params.hash_type()).map_err(MerkleError::from)?;
        let leaf_size = match *params.leaf_size() {
            0 => None,
            n => Some(n as usize),
        };

        let id = self.create_tree(*params.num_leaves(), alg, leaf_size)?;
        Ok(encode_to_vec(&self.tree_info(id)?)?)
    }

    fn handle_build(&self, req: &Request) -> RequestResult<Vec<u8>> {
        let shared = self.tree(req.tree_id)?;
        let mut tree = write_tree(&shared, req.tree_id)?;
        let root = tree.build(&req.payload)?;
        Ok(root.to_vec())
    }

    fn handle_update(&self, req: &Request) -> RequestResult<Vec<u8>> {
        let shared = self.tree(req.tree_id)?;
        let mut tree = write_tree(&shared, req.tree_id)?;
        let root = tree.update_leaf(req.leaf_index, &req.payload)?;
        Ok(root.to_vec())
    }

    fn handle_prove(&self, req: &Request) -> RequestResult<Vec<u8>> {
        let shared = self.tree(req.tree_id)?;
        let tree = read_tree(&shared, req.tree_id)?;
        Ok(tree.prove(req.leaf_index)?.to_bytes()?)
    }

    fn handle_verify(&self, req: &Request) -> RequestResult<Vec<u8>> {
        let p = decode_buf_exact::<VerifyProofPayload>(&req.payload)?;
        let proof = MerkleProof::from_bytes(&p.proof)?;

        let shared = self.tree(req.tree_id)?;
        let tree = read_tree(&shared, req.tree_id)?;
        let root = tree.root()?;
        let verifier = ProofVerifier::new(tree.algorithm());
        drop(tree);

        let ok = verifier.verify(&proof, &p.record, &root);
        trace!(leaf_index = proof.leaf_index(), %ok, "verified proof");
        Ok(encode_to_vec(&ok)?)
    }

    fn handle_batch_prove(&self, req: &Request, deadline: Deadline) -> RequestResult<Vec<u8>> {
        let shared = self.tree(req.tree_id)?;
        let tree = read_tree(&shared, req.tree_id)?;

        let mut proofs = Vec::with_capacity(req.leaf_indices.len());
        for &index in &req.leaf_indices {
            deadline.check()?;
            proofs.push(tree.prove(index)?.to_bytes()?);
        }
        Ok(encode_byte_list(&proofs)?)
    }

    fn handle_batch_verify(&self, req: &Request, deadline: Deadline) -> RequestResult<Vec<u8>> {
        let entries = decode_batch_verify(&req.payload, self.config().max_batch_size)
            .map_err(|e| match e {
                CodecError::OverflowContainer => RequestError::Invalid("batch too large"),
                e => e.into(),
            })?;

        let shared = self.tree(req.tree_id)?;
        let (verifier, root) = {
            let tree = read_tree(&shared, req.tree_id)?;
            (ProofVerifier::new(tree.algorithm()), tree.root()?)
        };

        let mut results = Vec::with_capacity(entries.len());
        for entry in &entries {
            deadline.check()?;
            // An undecodable proof counts as a failed entry.
            let ok = MerkleProof::from_bytes(&entry.proof)
                .map(|proof| verifier.verify(&proof, &entry.record, &root))
                .unwrap_or(false);
            results.push(ok);
        }

        let passed = results.iter().filter(|r| **r).count();
        debug!(total = results.len(), %passed, "batch verified");
        Ok(encode_results(&results)?)
    }
}
