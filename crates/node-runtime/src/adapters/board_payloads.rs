//! Stage payloads carrying this board's identity.
//!
//! Every stage body is a small JSON document naming the board and the stage.
//! Key material itself is produced elsewhere; this adapter keeps the
//! exchange self-describing and checks that peers answer the stage asked.

use crate::container::BoardConfig;
use km_03_exchange_coordinator::{PayloadError, StagePayloads};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shared_types::{ExchangeKind, PeerId};
use std::collections::HashMap;

/// JSON body of every stage request and response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageBody {
    pub board_uid: String,
    pub board_name: String,
    pub stage: ExchangeKind,
}

/// [`StagePayloads`] for a board. Remembers the last body each peer sent per
/// stage.
#[derive(Debug)]
pub struct BoardPayloads {
    board_uid: String,
    board_name: String,
    received: Mutex<HashMap<(PeerId, ExchangeKind), StageBody>>,
}

impl BoardPayloads {
    pub fn new(board: &BoardConfig) -> Self {
        Self {
            board_uid: board.uid.clone(),
            board_name: board.name.clone(),
            received: Mutex::new(HashMap::new()),
        }
    }

    fn body(&self, kind: ExchangeKind) -> Result<Vec<u8>, PayloadError> {
        serde_json::to_vec(&StageBody {
            board_uid: self.board_uid.clone(),
            board_name: self.board_name.clone(),
            stage: kind,
        })
        .map_err(|e| PayloadError::Unavailable {
            peer_id: PeerId::new(self.board_uid.clone()),
            kind,
            reason: e.to_string(),
        })
    }

    /// What `peer_id` sent for `kind`, if anything.
    pub fn received(&self, peer_id: &PeerId, kind: ExchangeKind) -> Option<StageBody> {
        self.received.lock().get(&(peer_id.clone(), kind)).cloned()
    }
}

impl StagePayloads for BoardPayloads {
    fn request_body(&self, _peer_id: &PeerId, kind: ExchangeKind) -> Result<Vec<u8>, PayloadError> {
        self.body(kind)
    }

    fn consume_response(
        &self,
        peer_id: &PeerId,
        kind: ExchangeKind,
        body: &[u8],
    ) -> Result<(), PayloadError> {
        let rejected = |reason: String| PayloadError::Rejected {
            peer_id: peer_id.clone(),
            kind,
            reason,
        };

        let parsed: StageBody =
            serde_json::from_slice(body).map_err(|e| rejected(e.to_string()))?;

        if parsed.stage != kind {
            return Err(rejected(format!("body is for stage {}", parsed.stage)));
        }
        if parsed.board_uid != peer_id.as_str() {
            return Err(rejected(format!("body names board {}", parsed.board_uid)));
        }

        self.received.lock().insert((peer_id.clone(), kind), parsed);
        Ok(())
    }

    fn respond(
        &self,
        _requester: &PeerId,
        kind: ExchangeKind,
        _request_body: &[u8],
    ) -> Result<Vec<u8>, PayloadError> {
        self.body(kind)
    }
}
