//! The single reducer behind the edit-mode state machine.
//!
//! `reduce` never talks to the map or the backend; it returns the next
//! state together with the effects the controller must carry out.

use geojson::Geometry;

use super::{Action, EditMode, EditorState, Effect, Notice, Phase, SaveOrigin, SaveRequest};
use crate::constraint::ConstraintEngine;
use crate::error::{EditorError, EditorResult};
use crate::index::ZoneIndex;
use crate::models::{BoundaryType, ClassificationId, Zone, ZoneId, ZoneSet, ZoningClassification};

const DEFAULT_MUNICIPAL_LABEL: &str = "Municipal Boundary";

/// Read-only data the reducer consults
pub struct ReduceContext<'a> {
    pub zones: &'a ZoneSet,
    pub classifications: &'a [ZoningClassification],
    pub engine: &'a ConstraintEngine,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: EditorState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(state: EditorState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }

    fn with(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    fn with_all(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }

    /// The error surfaced to the operator, if the action was rejected
    pub fn rejection(&self) -> Option<&EditorError> {
        self.effects.iter().find_map(|e| match e {
            Effect::Reject(err) => Some(err),
            _ => None,
        })
    }
}

/// Apply `action` to `state`.
///
/// `Err` means the action was refused outright and nothing changed.
/// Rejections that still move the state (a shape clipped away, a failed
/// save) come back as `Ok` with an [`Effect::Reject`].
pub fn reduce(
    state: &EditorState,
    action: Action,
    ctx: &ReduceContext<'_>,
) -> EditorResult<Transition> {
    if let Phase::Saving { request, origin } = &state.phase {
        return match action {
            Action::SaveSucceeded => Ok(save_succeeded(state, request, origin)),
            Action::SaveFailed { message } => Ok(save_failed(state, request, origin, message)),
            _ => Err(EditorError::Busy),
        };
    }

    let name = action.name();
    match action {
        Action::SwitchMode(mode) => Ok(switch_mode(state, mode)),
        Action::SelectBarangay(id) => select_barangay(state, id, name, ctx),
        Action::SelectClassification(id) => select_classification(state, id, name, ctx),
        Action::ActivateDraw => activate_draw(state, name),
        Action::ShapeCompleted { geometry, label } => {
            shape_completed(state, geometry, label, name, ctx)
        }
        Action::BeginEdit { zone_id } => begin_edit(state, zone_id, name, ctx),
        Action::ConfirmEdit { geometry } => confirm_edit(state, geometry, name, ctx),
        Action::ShapeRejected { error } => match &state.phase {
            Phase::Drawing { classification_id } => {
                Ok(draw_rejected(state, *classification_id, error))
            }
            Phase::Editing { zone_id, snapshot } => {
                Ok(edit_rejected(state, *zone_id, snapshot, error))
            }
            _ => Err(invalid(name, state)),
        },
        Action::ClearGeometry { zone_id } => {
            let zone = idle_zone(state, zone_id, name, ctx)?;
            if zone.geometry.is_none() {
                return Err(EditorError::NoGeometry(zone_id));
            }
            Ok(direct_save(
                state,
                SaveRequest::UpdateGeometry {
                    zone_id,
                    boundary_type: zone.boundary_type,
                    geometry: None,
                },
            ))
        }
        Action::DeleteZone { zone_id } => {
            idle_zone(state, zone_id, name, ctx)?;
            Ok(direct_save(state, SaveRequest::DeleteZone { zone_id }))
        }
        Action::SaveSucceeded | Action::SaveFailed { .. } => Err(invalid(name, state)),
        Action::Cancel => Ok(cancel(state)),
    }
}

fn invalid(action: &'static str, state: &EditorState) -> EditorError {
    EditorError::InvalidTransition {
        action,
        phase: state.phase.name(),
    }
}

fn is_selecting(state: &EditorState) -> bool {
    matches!(
        state.phase,
        Phase::Idle | Phase::ClassificationSelected { .. }
    )
}

/// Effects that tear down whatever the operator was in the middle of
fn leave_current(state: &EditorState) -> Vec<Effect> {
    match &state.phase {
        Phase::Drawing { .. } => vec![Effect::DeactivateDrawTool, Effect::DiscardDrawnShape],
        Phase::Editing { zone_id, snapshot } => vec![Effect::EndEdit {
            zone_id: *zone_id,
            restore: Some(snapshot.clone()),
        }],
        _ => Vec::new(),
    }
}

fn switch_mode(state: &EditorState, mode: EditMode) -> Transition {
    Transition::to(EditorState::new(mode))
        .with_all(leave_current(state))
        .with(Effect::Rerender)
}

fn select_barangay(
    state: &EditorState,
    id: Option<ZoneId>,
    name: &'static str,
    ctx: &ReduceContext<'_>,
) -> EditorResult<Transition> {
    if state.mode != EditMode::Zoning || !is_selecting(state) {
        return Err(invalid(name, state));
    }
    if let Some(id) = id {
        let is_barangay = ctx
            .zones
            .get(id)
            .is_some_and(|z| z.boundary_type == BoundaryType::Barangay);
        if !is_barangay {
            return Err(EditorError::UnknownZone(id));
        }
    }

    let phase = match id {
        Some(_) => state.phase.clone(),
        None => Phase::Idle,
    };
    Ok(Transition::to(EditorState {
        selected_barangay: id,
        phase,
        ..state.clone()
    })
    .with(Effect::Rerender))
}

fn select_classification(
    state: &EditorState,
    id: ClassificationId,
    name: &'static str,
    ctx: &ReduceContext<'_>,
) -> EditorResult<Transition> {
    if state.mode != EditMode::Zoning || !is_selecting(state) {
        return Err(invalid(name, state));
    }
    if state.selected_barangay.is_none() {
        return Err(EditorError::MissingSelection("barangay"));
    }
    if !ctx
        .classifications
        .iter()
        .any(|c| c.id == id && c.is_active)
    {
        return Err(EditorError::UnknownClassification(id));
    }

    Ok(Transition::to(EditorState {
        phase: Phase::ClassificationSelected {
            classification_id: id,
        },
        ..state.clone()
    }))
}

fn activate_draw(state: &EditorState, name: &'static str) -> EditorResult<Transition> {
    let classification_id = match (state.mode, &state.phase) {
        (EditMode::Zoning, Phase::ClassificationSelected { classification_id }) => {
            Some(*classification_id)
        }
        (EditMode::Zoning, Phase::Idle) if state.selected_barangay.is_none() => {
            return Err(EditorError::MissingSelection("barangay"));
        }
        (EditMode::Zoning, Phase::Idle) => {
            return Err(EditorError::MissingSelection("zoning classification"));
        }
        (EditMode::Municipal | EditMode::Barangay, Phase::Idle) => None,
        _ => return Err(invalid(name, state)),
    };

    Ok(Transition::to(EditorState {
        phase: Phase::Drawing { classification_id },
        ..state.clone()
    })
    .with(Effect::ActivateDrawTool))
}

fn shape_completed(
    state: &EditorState,
    geometry: Geometry,
    label: Option<String>,
    name: &'static str,
    ctx: &ReduceContext<'_>,
) -> EditorResult<Transition> {
    let Phase::Drawing { classification_id } = state.phase else {
        return Err(invalid(name, state));
    };
    let label = label.filter(|l| !l.trim().is_empty());

    let request = match state.mode {
        EditMode::Zoning => classification_id
            .ok_or(EditorError::MissingSelection("zoning classification"))
            .and_then(|classification_id| {
                let boundary = selected_barangay_geometry(state, ctx)?;
                let others = ctx.zones.zoning_neighbours(None);
                let geometry = ctx.engine.constrain(&geometry, Some(boundary), &others)?;
                Ok(SaveRequest::CreateZone {
                    classification_id,
                    geometry,
                    label,
                    is_active: true,
                })
            }),
        EditMode::Municipal => ctx
            .engine
            .constrain(&geometry, None, &[])
            .map_err(EditorError::from)
            .map(|geometry| SaveRequest::CreateMunicipal {
                geometry,
                label: label.unwrap_or_else(|| DEFAULT_MUNICIPAL_LABEL.to_string()),
            }),
        EditMode::Barangay => label
            .ok_or(EditorError::MissingSelection("barangay name"))
            .and_then(|label| {
                let geometry = ctx.engine.constrain(&geometry, None, &[])?;
                Ok(SaveRequest::CreateBarangay { geometry, label })
            }),
    };

    match request {
        Ok(request) => Ok(Transition::to(EditorState {
            phase: Phase::Saving {
                request: request.clone(),
                origin: SaveOrigin::Draw,
            },
            ..state.clone()
        })
        .with_all([Effect::DeactivateDrawTool, Effect::DiscardDrawnShape])
        .with(Effect::Save(request))),
        Err(err) => Ok(draw_rejected(state, classification_id, err)),
    }
}

/// Drop the drawn shape and go back to where drawing started
fn draw_rejected(
    state: &EditorState,
    classification_id: Option<ClassificationId>,
    err: EditorError,
) -> Transition {
    let phase = match classification_id {
        Some(classification_id) => Phase::ClassificationSelected { classification_id },
        None => Phase::Idle,
    };
    Transition::to(EditorState {
        phase,
        ..state.clone()
    })
    .with(Effect::DeactivateDrawTool)
    .with(Effect::DiscardDrawnShape)
    .with(Effect::Reject(err))
}

/// Revert the layer under edit to its snapshot
fn edit_rejected(
    state: &EditorState,
    zone_id: ZoneId,
    snapshot: &Geometry,
    err: EditorError,
) -> Transition {
    Transition::to(EditorState {
        phase: Phase::Idle,
        ..state.clone()
    })
    .with(Effect::EndEdit {
        zone_id,
        restore: Some(snapshot.clone()),
    })
    .with(Effect::Reject(err))
}

fn selected_barangay_geometry<'a>(
    state: &EditorState,
    ctx: &ReduceContext<'a>,
) -> EditorResult<&'a Geometry> {
    let id = state
        .selected_barangay
        .ok_or(EditorError::MissingSelection("barangay"))?;
    let barangay = ctx.zones.get(id).ok_or(EditorError::UnknownZone(id))?;
    barangay.geometry.as_ref().ok_or(EditorError::NoGeometry(id))
}

fn begin_edit(
    state: &EditorState,
    zone_id: ZoneId,
    name: &'static str,
    ctx: &ReduceContext<'_>,
) -> EditorResult<Transition> {
    // A pending classification would be lost under the edit
    if state.phase != Phase::Idle {
        return Err(invalid(name, state));
    }
    let zone = idle_zone(state, zone_id, name, ctx)?;
    if zone.boundary_type != state.mode.boundary_type() {
        return Err(EditorError::InvalidTransition {
            action: name,
            phase: state.mode.describe(),
        });
    }
    let snapshot = zone
        .geometry
        .clone()
        .ok_or(EditorError::NoGeometry(zone_id))?;

    Ok(Transition::to(EditorState {
        phase: Phase::Editing { zone_id, snapshot },
        ..state.clone()
    })
    .with(Effect::BeginEdit { zone_id }))
}

fn confirm_edit(
    state: &EditorState,
    geometry: Geometry,
    name: &'static str,
    ctx: &ReduceContext<'_>,
) -> EditorResult<Transition> {
    let Phase::Editing { zone_id, snapshot } = &state.phase else {
        return Err(invalid(name, state));
    };
    let zone_id = *zone_id;

    let result = match ctx.zones.get(zone_id) {
        None => Err(EditorError::UnknownZone(zone_id)),
        Some(zone) if zone.is_zoning() => {
            let boundary = edit_boundary(state, snapshot, ctx);
            let others = ctx.zones.zoning_neighbours(Some(zone_id));
            ctx.engine
                .constrain(&geometry, boundary, &others)
                .map_err(EditorError::from)
                .map(|g| (zone.boundary_type, g))
        }
        Some(zone) => ctx
            .engine
            .constrain(&geometry, None, &[])
            .map_err(EditorError::from)
            .map(|g| (zone.boundary_type, g)),
    };

    match result {
        Ok((boundary_type, geometry)) => {
            let request = SaveRequest::UpdateGeometry {
                zone_id,
                boundary_type,
                geometry: Some(geometry),
            };
            Ok(Transition::to(EditorState {
                phase: Phase::Saving {
                    request: request.clone(),
                    origin: SaveOrigin::Edit {
                        zone_id,
                        snapshot: snapshot.clone(),
                    },
                },
                ..state.clone()
            })
            .with(Effect::Save(request)))
        }
        Err(err) => Ok(edit_rejected(state, zone_id, snapshot, err)),
    }
}

/// Barangay an edited zoning zone is clipped to: the one holding most of the
/// pre-edit shape, else the operator's selection
fn edit_boundary<'a>(
    state: &EditorState,
    snapshot: &Geometry,
    ctx: &ReduceContext<'a>,
) -> Option<&'a Geometry> {
    let containing = crate::geometry::to_geo(snapshot).ok().and_then(|shape| {
        ZoneIndex::build(ctx.zones.barangays()).best_container(&shape)
    });
    containing
        .or(state.selected_barangay)
        .and_then(|id| ctx.zones.get(id))
        .and_then(|z| z.geometry.as_ref())
}

fn idle_zone<'a>(
    state: &EditorState,
    zone_id: ZoneId,
    name: &'static str,
    ctx: &ReduceContext<'a>,
) -> EditorResult<&'a Zone> {
    if !is_selecting(state) {
        return Err(invalid(name, state));
    }
    ctx.zones
        .get(zone_id)
        .ok_or(EditorError::UnknownZone(zone_id))
}

fn direct_save(state: &EditorState, request: SaveRequest) -> Transition {
    Transition::to(EditorState {
        phase: Phase::Saving {
            request: request.clone(),
            origin: SaveOrigin::Direct,
        },
        ..state.clone()
    })
    .with(Effect::Save(request))
}

fn save_succeeded(state: &EditorState, request: &SaveRequest, origin: &SaveOrigin) -> Transition {
    let selected_barangay = match request {
        SaveRequest::DeleteZone { zone_id } if state.selected_barangay == Some(*zone_id) => None,
        _ => state.selected_barangay,
    };

    let mut transition = Transition::to(EditorState {
        mode: state.mode,
        selected_barangay,
        phase: Phase::Idle,
    });
    if let SaveOrigin::Edit { zone_id, .. } = origin {
        transition = transition.with(Effect::EndEdit {
            zone_id: *zone_id,
            restore: None,
        });
    }
    transition
        .with(Effect::Reload)
        .with(Effect::Rerender)
        .with(Effect::Notify(Notice::success(request.describe())))
}

fn save_failed(
    state: &EditorState,
    request: &SaveRequest,
    origin: &SaveOrigin,
    message: String,
) -> Transition {
    let phase = match (origin, request) {
        (
            SaveOrigin::Draw,
            SaveRequest::CreateZone {
                classification_id, ..
            },
        ) => Phase::ClassificationSelected {
            classification_id: *classification_id,
        },
        _ => Phase::Idle,
    };

    let mut transition = Transition::to(EditorState {
        phase,
        ..state.clone()
    });
    if let SaveOrigin::Edit { zone_id, snapshot } = origin {
        transition = transition.with(Effect::EndEdit {
            zone_id: *zone_id,
            restore: Some(snapshot.clone()),
        });
    }
    transition
        .with(Effect::Rerender)
        .with(Effect::Reject(EditorError::RemoteFailure(message)))
}

fn cancel(state: &EditorState) -> Transition {
    let effects = leave_current(state);
    let rerender = !effects.is_empty();
    let transition = Transition::to(EditorState {
        phase: Phase::Idle,
        ..state.clone()
    })
    .with_all(effects);
    if rerender {
        transition.with(Effect::Rerender)
    } else {
        transition
    }
}
