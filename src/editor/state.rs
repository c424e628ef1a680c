//! Editor state: which layer family is being edited and what the operator
//! is in the middle of.

use geojson::Geometry;
use serde::{Deserialize, Serialize};

use crate::models::{BoundaryType, ClassificationId, ZoneId};
use crate::render::RenderScope;

/// The three mutually exclusive edit modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditMode {
    /// Land-use zones inside barangays
    #[default]
    Zoning,
    /// The municipal outline
    Municipal,
    /// Barangay outlines
    Barangay,
}

impl EditMode {
    /// Boundary type of the records this mode edits
    pub fn boundary_type(&self) -> BoundaryType {
        match self {
            EditMode::Zoning => BoundaryType::Zoning,
            EditMode::Municipal => BoundaryType::Municipal,
            EditMode::Barangay => BoundaryType::Barangay,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            EditMode::Zoning => "in zoning mode",
            EditMode::Municipal => "in municipal boundary mode",
            EditMode::Barangay => "in barangay boundary mode",
        }
    }
}

/// Remote mutation the editor is waiting on
#[derive(Debug, Clone, PartialEq)]
pub enum SaveRequest {
    CreateZone {
        classification_id: ClassificationId,
        geometry: Geometry,
        label: Option<String>,
        is_active: bool,
    },
    CreateMunicipal {
        geometry: Geometry,
        label: String,
    },
    CreateBarangay {
        geometry: Geometry,
        label: String,
    },
    /// `geometry: None` clears the shape but keeps the record
    UpdateGeometry {
        zone_id: ZoneId,
        boundary_type: BoundaryType,
        geometry: Option<Geometry>,
    },
    DeleteZone {
        zone_id: ZoneId,
    },
}

impl SaveRequest {
    pub fn zone_id(&self) -> Option<ZoneId> {
        match self {
            SaveRequest::UpdateGeometry { zone_id, .. } | SaveRequest::DeleteZone { zone_id } => {
                Some(*zone_id)
            }
            _ => None,
        }
    }

    /// Past-tense summary for success notices
    pub fn describe(&self) -> &'static str {
        match self {
            SaveRequest::CreateZone { .. } => "Zone created",
            SaveRequest::CreateMunicipal { .. } => "Municipal boundary saved",
            SaveRequest::CreateBarangay { .. } => "Barangay boundary created",
            SaveRequest::UpdateGeometry { geometry: None, .. } => "Shape removed",
            SaveRequest::UpdateGeometry { .. } => "Boundaries updated",
            SaveRequest::DeleteZone { .. } => "Zone deleted",
        }
    }
}

/// Where a save came from, so a failure can put things back
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOrigin {
    /// A freshly drawn shape
    Draw,
    /// A confirmed vertex edit, with the geometry from before the edit
    Edit { zone_id: ZoneId, snapshot: Geometry },
    /// Popup actions that need no drawing
    Direct,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// Zoning mode only: classification and barangay chosen, nothing drawn
    ClassificationSelected { classification_id: ClassificationId },
    /// The draw tool is active
    Drawing {
        classification_id: Option<ClassificationId>,
    },
    /// Vertices of an existing shape are being dragged
    Editing { zone_id: ZoneId, snapshot: Geometry },
    Saving {
        request: SaveRequest,
        origin: SaveOrigin,
    },
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::ClassificationSelected { .. } => "a classification is selected",
            Phase::Drawing { .. } => "drawing",
            Phase::Editing { .. } => "editing",
            Phase::Saving { .. } => "saving",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EditorState {
    pub mode: EditMode,
    /// Barangay scoping new zoning zones
    pub selected_barangay: Option<ZoneId>,
    pub phase: Phase,
}

impl EditorState {
    pub fn new(mode: EditMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn classification(&self) -> Option<ClassificationId> {
        match &self.phase {
            Phase::ClassificationSelected { classification_id } => Some(*classification_id),
            Phase::Drawing { classification_id } => *classification_id,
            Phase::Saving {
                request: SaveRequest::CreateZone {
                    classification_id, ..
                },
                ..
            } => Some(*classification_id),
            _ => None,
        }
    }

    /// Zone whose vertices are under edit (also while its save is pending)
    pub fn editing_zone(&self) -> Option<ZoneId> {
        match &self.phase {
            Phase::Editing { zone_id, .. } => Some(*zone_id),
            Phase::Saving {
                origin: SaveOrigin::Edit { zone_id, .. },
                ..
            } => Some(*zone_id),
            _ => None,
        }
    }

    pub fn is_saving(&self) -> bool {
        matches!(self.phase, Phase::Saving { .. })
    }

    /// Drawing and editing controls are only enabled when nothing is pending
    pub fn controls_enabled(&self) -> bool {
        !self.is_saving()
    }

    pub fn render_scope(&self) -> RenderScope {
        RenderScope {
            mode: self.mode,
            selected_barangay: self.selected_barangay,
        }
    }
}
