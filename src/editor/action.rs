//! Operator actions, completion events and the side effects they request.

use geojson::Geometry;
use serde::Serialize;

use super::{EditMode, SaveRequest};
use crate::error::EditorError;
use crate::models::{ClassificationId, ZoneId};

/// Everything that can happen to the editor
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SwitchMode(EditMode),
    SelectBarangay(Option<ZoneId>),
    SelectClassification(ClassificationId),
    ActivateDraw,
    /// The draw tool finished a shape; `label` names new boundaries
    ShapeCompleted {
        geometry: Geometry,
        label: Option<String>,
    },
    BeginEdit {
        zone_id: ZoneId,
    },
    ConfirmEdit {
        geometry: Geometry,
    },
    /// The map could not give a usable shape for the draw or edit in progress
    ShapeRejected {
        error: EditorError,
    },
    /// Delete the drawn shape but keep the zone record
    ClearGeometry {
        zone_id: ZoneId,
    },
    DeleteZone {
        zone_id: ZoneId,
    },
    SaveSucceeded,
    SaveFailed {
        message: String,
    },
    Cancel,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::SwitchMode(_) => "switch mode",
            Action::SelectBarangay(_) => "select a barangay",
            Action::SelectClassification(_) => "select a classification",
            Action::ActivateDraw => "start drawing",
            Action::ShapeCompleted { .. } => "finish a shape",
            Action::BeginEdit { .. } => "edit boundaries",
            Action::ConfirmEdit { .. } => "save an edit",
            Action::ShapeRejected { .. } => "reject a shape",
            Action::ClearGeometry { .. } => "delete a shape",
            Action::DeleteZone { .. } => "delete a zone",
            Action::SaveSucceeded | Action::SaveFailed { .. } => "complete a save",
            Action::Cancel => "cancel",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Message for the operator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Side effects requested by a transition, executed by the controller
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ActivateDrawTool,
    DeactivateDrawTool,
    DiscardDrawnShape,
    BeginEdit {
        zone_id: ZoneId,
    },
    /// Leave edit mode on a layer; `restore` reverts it to the snapshot
    EndEdit {
        zone_id: ZoneId,
        restore: Option<Geometry>,
    },
    Save(SaveRequest),
    /// Re-fetch the working set from the backend
    Reload,
    Rerender,
    Notify(Notice),
    /// The action was rejected; the state was still moved back to safety
    Reject(EditorError),
}
