//! Drives the state machine against a backend and a map renderer.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::{reduce, Action, Effect, EditorState, Notice, ReduceContext, SaveRequest};
use crate::api::{NewBoundary, NewZone, ZoneApi, ZonePatch};
use crate::config::Config;
use crate::constraint::ConstraintEngine;
use crate::error::{ApiError, ConstraintError, EditorError, EditorResult};
use crate::geometry::{to_geojson, LatLng, NativeShape, StylePalette};
use crate::index::ZoneIndex;
use crate::models::{BoundaryType, ZoneSet, ZoningClassification};
use crate::render::{Debouncer, RenderManager, RenderStats, Renderer, Viewport};

/// One editing session on the zoning map
pub struct MapEditor<A: ZoneApi, R: Renderer> {
    api: A,
    zones: ZoneSet,
    classifications: Vec<ZoningClassification>,
    state: EditorState,
    engine: ConstraintEngine,
    render: RenderManager<R>,
    viewport_events: Debouncer<Viewport>,
}

impl<A: ZoneApi, R: Renderer> MapEditor<A, R> {
    pub fn new(api: A, renderer: R, config: &Config) -> Self {
        Self {
            api,
            zones: ZoneSet::default(),
            classifications: Vec::new(),
            state: EditorState::default(),
            engine: ConstraintEngine::from_config(&config.constraint),
            render: RenderManager::new(
                renderer,
                StylePalette::from_config(&config.style),
                &config.render,
            ),
            viewport_events: Debouncer::new(config.render.debounce()),
        }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn zones(&self) -> &ZoneSet {
        &self.zones
    }

    pub fn classifications(&self) -> &[ZoningClassification] {
        &self.classifications
    }

    pub fn renderer(&self) -> &R {
        self.render.renderer()
    }

    pub fn render_manager(&self) -> &RenderManager<R> {
        &self.render
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Fetch zones, boundaries and active classifications
    pub async fn load(&mut self) -> EditorResult<()> {
        let zones = self.api.list_zones().await?;
        let municipal = self.api.municipal_boundary().await?;
        let barangays = self.api.barangay_boundaries().await?;
        let classifications = self.api.list_classifications(true).await?;

        self.zones.replace_all(zones);
        // Boundary endpoints win over whatever the zone listing carried
        for boundary in municipal.into_iter().chain(barangays) {
            self.zones.upsert(boundary);
        }
        self.classifications = classifications;

        info!(
            "Loaded {} zones ({} barangays) and {} classifications",
            self.zones.len(),
            self.zones.barangays().count(),
            self.classifications.len()
        );
        Ok(())
    }

    /// Run an action through the state machine and carry out its effects.
    ///
    /// Saves are awaited here and their outcome fed back as
    /// `SaveSucceeded`/`SaveFailed`. Returns the notices raised along the
    /// way, or the first rejection.
    pub async fn dispatch(&mut self, action: Action) -> EditorResult<Vec<Notice>> {
        let mut notices = Vec::new();
        let mut rejection: Option<EditorError> = None;
        let mut next = Some(action);

        while let Some(action) = next.take() {
            debug!("Dispatching '{}' while {}", action.name(), self.state.phase.name());
            let transition = reduce(&self.state, action, &self.context())?;
            self.state = transition.state;

            for effect in transition.effects {
                match effect {
                    Effect::Save(request) => {
                        next = Some(match self.save(&request).await {
                            Ok(()) => Action::SaveSucceeded,
                            Err(e) => {
                                warn!("Save failed: {}", e);
                                Action::SaveFailed {
                                    message: e.operator_message(),
                                }
                            }
                        });
                    }
                    Effect::Reload => {
                        if let Err(e) = self.load().await {
                            warn!("Reload after save failed: {}", e);
                            notices.push(Notice::error(e.to_string()));
                        }
                    }
                    Effect::Notify(notice) => notices.push(notice),
                    Effect::Reject(err) => {
                        notices.push(Notice::error(err.to_string()));
                        rejection.get_or_insert(err);
                    }
                    other => {
                        if let Some(follow) = self.apply(other) {
                            next = Some(follow);
                        }
                    }
                }
            }
        }

        match rejection {
            Some(err) => Err(err),
            None => Ok(notices),
        }
    }

    /// The draw tool produced a shape
    pub async fn shape_completed(
        &mut self,
        shape: &NativeShape,
        label: Option<String>,
    ) -> EditorResult<Vec<Notice>> {
        let action = match to_geojson(shape) {
            Some(geometry) => Action::ShapeCompleted { geometry, label },
            None => Action::ShapeRejected {
                error: unusable_shape(),
            },
        };
        self.dispatch(action).await
    }

    /// The operator confirmed the vertices of the layer under edit
    pub async fn edit_completed(&mut self, shape: &NativeShape) -> EditorResult<Vec<Notice>> {
        let action = match to_geojson(shape) {
            Some(geometry) => Action::ConfirmEdit { geometry },
            None => Action::ShapeRejected {
                error: unusable_shape(),
            },
        };
        self.dispatch(action).await
    }

    /// Select the barangay under a map click, or clear the selection on a miss
    pub async fn select_barangay_at(&mut self, point: LatLng) -> EditorResult<Vec<Notice>> {
        let hit = ZoneIndex::build(self.zones.barangays())
            .lookup(point.lng, point.lat)
            .into_iter()
            .min();
        self.dispatch(Action::SelectBarangay(hit)).await
    }

    /// Record a pan or zoom; the re-render waits for the burst to settle
    pub fn viewport_changed(&mut self, viewport: Viewport, now: Instant) {
        self.viewport_events.push(viewport, now);
    }

    /// Render if the debounced viewport is due
    pub fn tick(&mut self, now: Instant) -> Option<RenderStats> {
        let viewport = self.viewport_events.poll(now)?;
        Some(self.render_now(viewport))
    }

    /// Time until the pending viewport is due, if any
    pub fn next_tick(&self, now: Instant) -> Option<Duration> {
        self.viewport_events
            .deadline()
            .map(|d| d.saturating_duration_since(now))
    }

    /// Wait for the current pan/zoom burst to settle, then render it
    pub async fn settle(&mut self) -> Option<RenderStats> {
        let viewport = self.viewport_events.settled().await?;
        Some(self.render_now(viewport))
    }

    pub fn render_now(&mut self, viewport: Viewport) -> RenderStats {
        self.render
            .render(viewport, &self.zones, &self.state.render_scope())
    }

    fn context(&self) -> ReduceContext<'_> {
        ReduceContext {
            zones: &self.zones,
            classifications: &self.classifications,
            engine: &self.engine,
        }
    }

    /// Effects that only touch the map. Returns the follow-up action when the
    /// map could not carry the effect out.
    fn apply(&mut self, effect: Effect) -> Option<Action> {
        let scope = self.state.render_scope();
        match effect {
            Effect::ActivateDrawTool => self.render.renderer_mut().set_draw_tool(true),
            Effect::DeactivateDrawTool => self.render.renderer_mut().set_draw_tool(false),
            Effect::DiscardDrawnShape => self.render.renderer_mut().discard_drawn_shape(),
            Effect::BeginEdit { zone_id } => {
                let started = self
                    .zones
                    .get(zone_id)
                    .is_some_and(|zone| self.render.begin_edit(zone, &scope));
                if !started {
                    warn!("Zone {} could not be put into edit mode", zone_id);
                    return Some(Action::ShapeRejected {
                        error: EditorError::NotDrawable(zone_id),
                    });
                }
            }
            Effect::EndEdit { zone_id, restore } => {
                self.render.end_edit(zone_id, restore.is_some());
                if let Some(snapshot) = restore {
                    let current = self.zones.get(zone_id).and_then(|z| z.geometry.as_ref());
                    if current != Some(&snapshot) {
                        self.zones.set_geometry(zone_id, Some(snapshot));
                    }
                }
            }
            Effect::Rerender => {
                self.render.rerender(&self.zones, &scope);
            }
            Effect::Save(_) | Effect::Reload | Effect::Notify(_) | Effect::Reject(_) => {
                debug!("Effect handled by dispatch");
            }
        }
        None
    }

    async fn save(&self, request: &SaveRequest) -> Result<(), ApiError> {
        info!("Saving: {}", request.describe());
        match request {
            SaveRequest::CreateZone {
                classification_id,
                geometry,
                label,
                is_active,
            } => {
                self.api
                    .create_zone(&NewZone {
                        classification_id: *classification_id,
                        geometry: geometry.clone(),
                        label: label.clone(),
                        is_active: *is_active,
                    })
                    .await
            }
            SaveRequest::CreateMunicipal { geometry, label } => {
                self.api
                    .create_municipal(&NewBoundary {
                        geometry: geometry.clone(),
                        label: label.clone(),
                    })
                    .await
            }
            SaveRequest::CreateBarangay { geometry, label } => {
                self.api
                    .create_barangay(&NewBoundary {
                        geometry: geometry.clone(),
                        label: label.clone(),
                    })
                    .await
            }
            SaveRequest::UpdateGeometry {
                zone_id,
                boundary_type: BoundaryType::Barangay,
                geometry,
            } => {
                self.api
                    .update_barangay(*zone_id, &ZonePatch::geometry(geometry.clone()))
                    .await
            }
            SaveRequest::UpdateGeometry {
                zone_id, geometry, ..
            } => {
                self.api
                    .update_zone(*zone_id, &ZonePatch::geometry(geometry.clone()))
                    .await
            }
            SaveRequest::DeleteZone { zone_id } => self.api.delete_zone(*zone_id).await,
        }
    }
}

fn unusable_shape() -> EditorError {
    ConstraintError::InvalidGeometry("drawn shape needs at least three distinct vertices".to_string())
        .into()
}
