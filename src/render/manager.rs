//! Viewport-aware drawing of zones and boundaries.

use serde::Serialize;
use tracing::debug;

use super::{HandleRegistry, Viewport};
use crate::config::RenderConfig;
use crate::editor::{Action, EditMode};
use crate::geometry::{from_geojson, Drawable, LayerStyle, StylePalette};
use crate::index::ZoneIndex;
use crate::models::{BoundaryType, Zone, ZoneId, ZoneSet};

/// The map drawing library, as seen by the editor core.
///
/// Handles are opaque; the core only stores them in a [`HandleRegistry`].
pub trait Renderer {
    type Handle;

    /// Add a layer to the map
    fn draw(&mut self, zone_id: ZoneId, layer: &Drawable, popup: Option<&Popup>) -> Self::Handle;

    fn remove(&mut self, handle: Self::Handle);

    /// Put the layer into the editable group and show vertex handles
    fn enable_editing(&mut self, handle: &Self::Handle);

    /// Hide vertex handles; `revert` restores the vertices the edit started from
    fn disable_editing(&mut self, handle: &Self::Handle, revert: bool);

    fn set_draw_tool(&mut self, active: bool);

    /// Drop the shape the draw tool just produced
    fn discard_drawn_shape(&mut self);
}

/// Popup attached to an interactive layer
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub title: String,
    pub lines: Vec<String>,
    pub actions: Vec<PopupAction>,
}

/// Button in a popup; the host dispatches `action` when it is clicked
#[derive(Debug, Clone, PartialEq)]
pub struct PopupAction {
    pub label: &'static str,
    pub action: Action,
}

/// What the current editor state wants on the map
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderScope {
    pub mode: EditMode,
    pub selected_barangay: Option<ZoneId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderStats {
    pub drawn: usize,
    /// Layers kept across the pass because they are under edit
    pub reused: usize,
    pub removed: usize,
}

pub struct RenderManager<R: Renderer> {
    renderer: R,
    registry: HandleRegistry<R::Handle>,
    palette: StylePalette,
    low_zoom_threshold: f64,
    index: ZoneIndex,
    index_revision: Option<u64>,
    last_viewport: Option<Viewport>,
}

impl<R: Renderer> RenderManager<R> {
    pub fn new(renderer: R, palette: StylePalette, config: &RenderConfig) -> Self {
        Self {
            renderer,
            registry: HandleRegistry::new(),
            palette,
            low_zoom_threshold: config.low_zoom_threshold,
            index: ZoneIndex::build(std::iter::empty::<&Zone>()),
            index_revision: None,
            last_viewport: None,
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn registry(&self) -> &HandleRegistry<R::Handle> {
        &self.registry
    }

    pub fn last_viewport(&self) -> Option<Viewport> {
        self.last_viewport
    }

    /// Redraw everything visible in `viewport`.
    ///
    /// Layers retained for editing are neither removed nor redrawn; editing
    /// is re-enabled on them once the pass is done.
    pub fn render(&mut self, viewport: Viewport, zones: &ZoneSet, scope: &RenderScope) -> RenderStats {
        self.last_viewport = Some(viewport);
        let mut stats = RenderStats::default();

        for (_, handle) in self.registry.sweep() {
            self.renderer.remove(handle);
            stats.removed += 1;
        }

        self.refresh_index(zones);
        let candidates = select_candidates(
            zones,
            &self.index,
            &viewport,
            scope,
            self.low_zoom_threshold,
        );

        for zone in candidates {
            if self.registry.is_retained(zone.id) {
                stats.reused += 1;
                continue;
            }
            if self.draw_zone(zone, scope) {
                stats.drawn += 1;
            }
        }

        for (_, handle) in self.registry.retained() {
            self.renderer.enable_editing(handle);
        }

        debug!(
            "Render pass at zoom {}: {} drawn, {} reused, {} removed",
            viewport.zoom, stats.drawn, stats.reused, stats.removed
        );
        stats
    }

    /// Render again with the last viewport, if there was one
    pub fn rerender(&mut self, zones: &ZoneSet, scope: &RenderScope) -> Option<RenderStats> {
        let viewport = self.last_viewport?;
        Some(self.render(viewport, zones, scope))
    }

    /// Pin the zone's layer and show its edit handles, drawing it if needed
    pub fn begin_edit(&mut self, zone: &Zone, scope: &RenderScope) -> bool {
        if !self.registry.contains(zone.id) && !self.draw_zone(zone, scope) {
            return false;
        }
        self.registry.retain(zone.id);
        if let Some(handle) = self.registry.get(zone.id) {
            self.renderer.enable_editing(handle);
        }
        true
    }

    /// Hide edit handles and let the next pass rebuild the layer
    pub fn end_edit(&mut self, id: ZoneId, revert: bool) {
        if let Some(handle) = self.registry.get(id) {
            self.renderer.disable_editing(handle, revert);
        }
        self.registry.release(id);
    }

    /// Remove every layer, retained or not
    pub fn clear(&mut self) {
        let ids: Vec<ZoneId> = self.registry.retained().map(|(id, _)| id).collect();
        for id in ids {
            self.registry.release(id);
        }
        for (_, handle) in self.registry.sweep() {
            self.renderer.remove(handle);
        }
    }

    fn draw_zone(&mut self, zone: &Zone, scope: &RenderScope) -> bool {
        let Some(geometry) = zone.geometry.as_ref() else {
            return false;
        };
        let style = style_for(&self.palette, zone, scope);
        let Some(drawable) = from_geojson(geometry, &style) else {
            debug!("Zone {} has no drawable geometry", zone.id);
            return false;
        };

        let popup = if style.interactive {
            Some(popup_for(zone))
        } else {
            None
        };
        let handle = self.renderer.draw(zone.id, &drawable, popup.as_ref());
        if let Some(old) = self.registry.insert(zone.id, handle) {
            self.renderer.remove(old);
        }
        true
    }

    fn refresh_index(&mut self, zones: &ZoneSet) {
        if self.index_revision != Some(zones.revision()) {
            self.index = ZoneIndex::build(zones.iter());
            self.index_revision = Some(zones.revision());
        }
    }
}

/// Zones to draw for a pass, bottom layer first
pub fn select_candidates<'a>(
    zones: &'a ZoneSet,
    index: &ZoneIndex,
    viewport: &Viewport,
    scope: &RenderScope,
    low_zoom_threshold: f64,
) -> Vec<&'a Zone> {
    let visible = index.in_rect(&viewport.bounds);
    let in_view = |z: &&Zone| z.geometry.is_some() && visible.contains(&z.id);

    let restrict_barangays = viewport.zoom < low_zoom_threshold && scope.selected_barangay.is_some();
    let barangays = zones
        .barangays()
        .filter(|z| !restrict_barangays || Some(z.id) == scope.selected_barangay);

    let mut out: Vec<&Zone> = Vec::new();
    match scope.mode {
        EditMode::Zoning => {
            out.extend(zones.municipal_boundary().filter(in_view));
            out.extend(barangays.filter(in_view));
            out.extend(zones.zoning_zones().filter(in_view));
        }
        EditMode::Municipal => out.extend(zones.municipal_boundary().filter(in_view)),
        EditMode::Barangay => out.extend(zones.barangays().filter(in_view)),
    }
    out
}

fn style_for(palette: &StylePalette, zone: &Zone, scope: &RenderScope) -> LayerStyle {
    let editable_mode = match zone.boundary_type {
        BoundaryType::Zoning => EditMode::Zoning,
        BoundaryType::Municipal => EditMode::Municipal,
        BoundaryType::Barangay => EditMode::Barangay,
    };
    let interactive = editable_mode == scope.mode;

    match zone.boundary_type {
        BoundaryType::Zoning => palette.zoning(zone.color.as_deref()),
        BoundaryType::Municipal => palette.municipal.clone().with_interactive(interactive),
        BoundaryType::Barangay if Some(zone.id) == scope.selected_barangay => {
            palette.selected_barangay.clone().with_interactive(interactive)
        }
        BoundaryType::Barangay => palette.barangay.clone().with_interactive(interactive),
    }
}

fn popup_for(zone: &Zone) -> Popup {
    let mut lines = Vec::new();
    if zone.is_zoning() {
        lines.push(format!("{} - {}", zone.code, zone.name));
        if !zone.is_active {
            lines.push("Inactive".to_string());
        }
    } else {
        lines.push(format!("{} boundary", zone.boundary_type));
    }

    let mut actions = vec![PopupAction {
        label: "Edit boundaries",
        action: Action::BeginEdit { zone_id: zone.id },
    }];
    // Boundaries are replaced by drawing or importing, never cleared
    if zone.is_zoning() {
        actions.push(PopupAction {
            label: "Delete shape",
            action: Action::ClearGeometry { zone_id: zone.id },
        });
    }

    Popup {
        title: zone.display_name().to_string(),
        lines,
        actions,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    /// Renderer that records every call, for tests across the crate
    #[derive(Default)]
    pub(crate) struct RecordingRenderer {
        next: u32,
        pub drawn: Vec<(ZoneId, Drawable, Option<Popup>)>,
        pub removed: Vec<u32>,
        pub editing: Vec<u32>,
        pub reverted: Vec<u32>,
        pub draw_tool: bool,
        pub discarded: usize,
    }

    impl Renderer for RecordingRenderer {
        type Handle = u32;

        fn draw(&mut self, zone_id: ZoneId, layer: &Drawable, popup: Option<&Popup>) -> u32 {
            self.next += 1;
            self.drawn.push((zone_id, layer.clone(), popup.cloned()));
            self.next
        }

        fn remove(&mut self, handle: u32) {
            self.removed.push(handle);
        }

        fn enable_editing(&mut self, handle: &u32) {
            self.editing.push(*handle);
        }

        fn disable_editing(&mut self, handle: &u32, revert: bool) {
            if revert {
                self.reverted.push(*handle);
            }
        }

        fn set_draw_tool(&mut self, active: bool) {
            self.draw_tool = active;
        }

        fn discard_drawn_shape(&mut self) {
            self.discarded += 1;
        }
    }

    pub(crate) fn square_zone(id: i64, boundary_type: Option<&str>, x0: f64, y0: f64, size: f64) -> Zone {
        serde_json::from_value(json!({
            "id": id,
            "classification_id": if boundary_type.is_none() { Some(1) } else { None },
            "code": "R1",
            "name": "Residential",
            "label": format!("Zone {}", id),
            "boundary_type": boundary_type,
            "geometry": {
                "type": "Polygon",
                "coordinates": [[
                    [x0, y0], [x0 + size, y0], [x0 + size, y0 + size], [x0, y0 + size], [x0, y0]
                ]]
            },
            "has_geometry": true
        }))
        .unwrap()
    }

    fn sample_set() -> ZoneSet {
        ZoneSet::new(vec![
            square_zone(1, Some("municipal"), 0.0, 0.0, 10.0),
            square_zone(2, Some("barangay"), 0.0, 0.0, 5.0),
            square_zone(3, Some("barangay"), 5.0, 0.0, 5.0),
            square_zone(10, None, 1.0, 1.0, 1.0),
            square_zone(11, None, 6.0, 1.0, 1.0),
        ])
    }

    fn manager() -> RenderManager<RecordingRenderer> {
        RenderManager::new(
            RecordingRenderer::default(),
            StylePalette::default(),
            &RenderConfig::default(),
        )
    }

    fn scope(mode: EditMode, selected: Option<i64>) -> RenderScope {
        RenderScope {
            mode,
            selected_barangay: selected.map(ZoneId),
        }
    }

    fn drawn_ids(manager: &RenderManager<RecordingRenderer>) -> Vec<ZoneId> {
        manager.renderer().drawn.iter().map(|(id, _, _)| *id).collect()
    }

    #[test]
    fn test_zoning_mode_draws_everything_in_order() {
        let mut m = manager();
        let set = sample_set();
        let stats = m.render(
            Viewport::new(-1.0, -1.0, 11.0, 11.0, 16.0),
            &set,
            &scope(EditMode::Zoning, None),
        );
        assert_eq!(stats.drawn, 5);
        assert_eq!(
            drawn_ids(&m),
            vec![ZoneId(1), ZoneId(2), ZoneId(3), ZoneId(10), ZoneId(11)]
        );

        // Only zoning zones are interactive and carry a popup
        for (id, drawable, popup) in &m.renderer().drawn {
            let is_zoning = id.0 >= 10;
            assert_eq!(drawable.style.interactive, is_zoning);
            assert_eq!(popup.is_some(), is_zoning);
        }
    }

    #[test]
    fn test_modes_filter_candidates() {
        let set = sample_set();
        let view = Viewport::new(-1.0, -1.0, 11.0, 11.0, 16.0);

        let mut m = manager();
        m.render(view, &set, &scope(EditMode::Municipal, None));
        assert_eq!(drawn_ids(&m), vec![ZoneId(1)]);
        assert!(m.renderer().drawn[0].1.style.interactive);

        let mut m = manager();
        m.render(view, &set, &scope(EditMode::Barangay, None));
        assert_eq!(drawn_ids(&m), vec![ZoneId(2), ZoneId(3)]);
    }

    #[test]
    fn test_low_zoom_shows_only_selected_barangay() {
        let set = sample_set();
        let mut m = manager();
        m.render(
            Viewport::new(-1.0, -1.0, 11.0, 11.0, 12.0),
            &set,
            &scope(EditMode::Zoning, Some(3)),
        );
        let ids = drawn_ids(&m);
        assert!(ids.contains(&ZoneId(3)));
        assert!(!ids.contains(&ZoneId(2)));

        let mut m = manager();
        m.render(
            Viewport::new(-1.0, -1.0, 11.0, 11.0, 15.0),
            &set,
            &scope(EditMode::Zoning, Some(3)),
        );
        assert!(drawn_ids(&m).contains(&ZoneId(2)));
    }

    #[test]
    fn test_viewport_culls_offscreen_zones() {
        let set = sample_set();
        let mut m = manager();
        m.render(
            Viewport::new(0.5, 0.5, 2.5, 2.5, 17.0),
            &set,
            &scope(EditMode::Zoning, None),
        );
        let ids = drawn_ids(&m);
        assert!(ids.contains(&ZoneId(10)));
        assert!(!ids.contains(&ZoneId(11)));
        assert!(!ids.contains(&ZoneId(3)));
    }

    #[test]
    fn test_second_pass_replaces_previous_layers() {
        let set = sample_set();
        let mut m = manager();
        let view = Viewport::new(-1.0, -1.0, 11.0, 11.0, 16.0);
        m.render(view, &set, &scope(EditMode::Zoning, None));
        let stats = m.render(view, &set, &scope(EditMode::Zoning, None));
        assert_eq!(stats.removed, 5);
        assert_eq!(stats.drawn, 5);
        assert_eq!(m.registry().len(), 5);
    }

    #[test]
    fn test_edited_layer_survives_rerender() {
        let set = sample_set();
        let mut m = manager();
        let view = Viewport::new(-1.0, -1.0, 11.0, 11.0, 16.0);
        let s = scope(EditMode::Zoning, None);
        m.render(view, &set, &s);

        let zone = set.get(ZoneId(10)).unwrap();
        assert!(m.begin_edit(zone, &s));
        let handle = *m.registry().get(ZoneId(10)).unwrap();

        let stats = m.render(view, &set, &s);
        assert_eq!(stats.reused, 1);
        assert_eq!(stats.removed, 4);
        assert_eq!(m.registry().get(ZoneId(10)), Some(&handle));
        assert!(!m.renderer().removed.contains(&handle));
        // Edit handles reactivated after the pass
        assert_eq!(m.renderer().editing.last(), Some(&handle));

        m.end_edit(ZoneId(10), true);
        assert_eq!(m.renderer().reverted, vec![handle]);
        m.render(view, &set, &s);
        assert!(m.renderer().removed.contains(&handle));
    }

    #[test]
    fn test_popup_offers_edit_action() {
        let set = sample_set();
        let mut m = manager();
        m.render(
            Viewport::new(-1.0, -1.0, 11.0, 11.0, 16.0),
            &set,
            &scope(EditMode::Zoning, None),
        );
        let (_, _, popup) = m
            .renderer()
            .drawn
            .iter()
            .find(|(id, _, _)| *id == ZoneId(10))
            .unwrap();
        let popup = popup.as_ref().unwrap();
        assert_eq!(popup.title, "Zone 10");
        assert_eq!(
            popup.actions[0].action,
            Action::BeginEdit { zone_id: ZoneId(10) }
        );
        assert_eq!(
            popup.actions[1].action,
            Action::ClearGeometry { zone_id: ZoneId(10) }
        );
    }

    #[test]
    fn test_boundary_popup_cannot_clear_shape() {
        let set = sample_set();
        let mut m = manager();
        m.render(
            Viewport::new(-1.0, -1.0, 11.0, 11.0, 16.0),
            &set,
            &scope(EditMode::Municipal, None),
        );
        let (id, _, popup) = &m.renderer().drawn[0];
        let popup = popup.as_ref().unwrap();
        assert_eq!(*id, ZoneId(1));
        assert_eq!(popup.actions.len(), 1);
        assert_eq!(popup.actions[0].action, Action::BeginEdit { zone_id: ZoneId(1) });
    }
}
