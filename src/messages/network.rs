//! Network messages - communication between App and Network layers

use crate::app::draft::RequestDraft;
use crate::classify::ResponseArtifact;

/// Commands sent from App layer to Network layer
#[derive(Debug, Clone)]
pub enum NetworkCommand {
    /// Run one dispatch for a draft snapshot. The backend is taken from the draft.
    Dispatch { id: u64, draft: RequestDraft },
    /// Shutdown the network actor
    Shutdown,
}

/// Responses sent from Network layer to App layer
#[derive(Debug, Clone)]
pub enum NetworkResponse {
    /// A dispatch finished; failures arrive as error artifacts
    Settled { id: u64, artifact: ResponseArtifact },
}

impl NetworkResponse {
    /// Get the request ID from the response
    pub fn id(&self) -> u64 {
        match self {
            NetworkResponse::Settled { id, .. } => *id,
        }
    }
}
