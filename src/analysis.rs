//! Hand-off to the external analysis collaborator.
//!
//! Symbol recognition happens outside this crate, typically in a vision
//! model behind an HTTP API. This module only fixes the contract: the
//! collaborator receives one PNG-encoded frame at a time and answers with a
//! JSON object whose `equipment` array lists what it found.
//!
//! ```json
//! { "equipment": [ { "type": "pump", "symbol": "P-101", "description": "Feed pump" } ] }
//! ```

use crate::error::AnalysisError;
use crate::pipeline::encode::EncodedFrame;
use serde::{Deserialize, Serialize};

/// One detected equipment symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    /// Equipment class, e.g. "pump", "control valve".
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Tag as printed on the drawing, e.g. "FV-201".
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub description: String,
}

/// Top-level reply from the collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentReport {
    #[serde(default)]
    pub equipment: Vec<Equipment>,
}

/// Decode a collaborator reply. A missing `equipment` key means nothing found.
pub fn parse_equipment_response(json: &str) -> Result<Vec<Equipment>, AnalysisError> {
    let report: EquipmentReport = serde_json::from_str(json)?;
    Ok(report.equipment)
}

/// Anything that can look at one encoded frame and list its equipment.
///
/// Implementations must be `Send + Sync` so one analyzer can serve several
/// documents processed concurrently.
pub trait FrameAnalyzer: Send + Sync {
    fn analyze(&self, frame: &EncodedFrame) -> Result<Vec<Equipment>, AnalysisError>;
}

impl<F> FrameAnalyzer for F
where
    F: Fn(&EncodedFrame) -> Result<Vec<Equipment>, AnalysisError> + Send + Sync,
{
    fn analyze(&self, frame: &EncodedFrame) -> Result<Vec<Equipment>, AnalysisError> {
        self(frame)
    }
}
