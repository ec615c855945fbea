use std::collections::HashMap;

use crate::geo::{Bounds, Coordinate, Role};

/// Handle to a marker the surface created. Meaningful only to the surface
/// that issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MarkerId(pub u64);

/// The map display collaborator: marker primitives, viewport control, the
/// directions/error/help panels, and the form mirror the session writes
/// through. All methods mutate display state only.
pub trait MapSurface {
    fn add_marker(&mut self, role: Role, at: Coordinate) -> MarkerId;
    fn remove_marker(&mut self, id: MarkerId);
    fn pan_to(&mut self, at: Coordinate);
    fn fit_bounds(&mut self, bounds: Bounds);
    fn show_directions(&mut self, steps: &[String]);
    fn hide_directions(&mut self);
    fn show_error(&mut self, message: &str);
    fn show_help(&mut self, message: &str);
    fn set_endpoint_text(&mut self, role: Role, text: &str);
    fn set_building_label(&mut self, role: Role, label: &str);
}

/// Owns at most one live marker per role, removing the old marker before a
/// replacement is created.
#[derive(Debug, Default)]
pub struct MarkerManager {
    live: HashMap<Role, MarkerId>,
}

impl MarkerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place (or move) the marker for `role`. The previous marker for the
    /// role, if any, is destroyed first.
    pub fn set_marker(&mut self, map: &mut impl MapSurface, role: Role, at: Coordinate) {
        if let Some(old) = self.live.remove(&role) {
            map.remove_marker(old);
        }
        let id = map.add_marker(role, at);
        self.live.insert(role, id);
    }

    pub fn clear(&mut self, map: &mut impl MapSurface, role: Role) {
        if let Some(id) = self.live.remove(&role) {
            map.remove_marker(id);
        }
    }

    pub fn clear_all(&mut self, map: &mut impl MapSurface) {
        for (_, id) in self.live.drain() {
            map.remove_marker(id);
        }
    }

    pub fn has_marker(&self, role: Role) -> bool {
        self.live.contains_key(&role)
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Fit the viewport around `bounds` extended to keep `also_include`
    /// visible; with no bounds, pan to `focus` instead.
    pub fn fit_view(
        &self,
        map: &mut impl MapSurface,
        bounds: Option<Bounds>,
        focus: Coordinate,
        also_include: Option<Coordinate>,
    ) {
        match bounds {
            Some(mut bounds) => {
                if let Some(other) = also_include {
                    bounds.extend(other);
                }
                map.fit_bounds(bounds);
            }
            None => map.pan_to(focus),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingMap {
        next_id: u64,
        live: Vec<(MarkerId, Role)>,
        max_live_per_role: usize,
        pans: Vec<Coordinate>,
        fits: Vec<Bounds>,
    }

    impl RecordingMap {
        fn live_for(&self, role: Role) -> usize {
            self.live.iter().filter(|(_, r)| *r == role).count()
        }
    }

    impl MapSurface for RecordingMap {
        fn add_marker(&mut self, role: Role, _at: Coordinate) -> MarkerId {
            self.next_id += 1;
            let id = MarkerId(self.next_id);
            self.live.push((id, role));
            let live_now = self.live_for(role);
            self.max_live_per_role = self.max_live_per_role.max(live_now);
            id
        }

        fn remove_marker(&mut self, id: MarkerId) {
            self.live.retain(|(live_id, _)| *live_id != id);
        }

        fn pan_to(&mut self, at: Coordinate) {
            self.pans.push(at);
        }

        fn fit_bounds(&mut self, bounds: Bounds) {
            self.fits.push(bounds);
        }

        fn show_directions(&mut self, _steps: &[String]) {}
        fn hide_directions(&mut self) {}
        fn show_error(&mut self, _message: &str) {}
        fn show_help(&mut self, _message: &str) {}
        fn set_endpoint_text(&mut self, _role: Role, _text: &str) {}
        fn set_building_label(&mut self, _role: Role, _label: &str) {}
    }

    #[test]
    fn repeated_selection_never_stacks_markers() {
        let mut map = RecordingMap::default();
        let mut markers = MarkerManager::new();

        for i in 0..5 {
            markers.set_marker(&mut map, Role::Source, Coordinate::new(40.0 + i as f64, -79.0));
            markers.set_marker(&mut map, Role::Destination, Coordinate::new(41.0, -80.0));
        }

        assert_eq!(map.max_live_per_role, 1);
        assert_eq!(map.live_for(Role::Source), 1);
        assert_eq!(map.live_for(Role::Destination), 1);
    }

    #[test]
    fn clear_all_removes_every_marker() {
        let mut map = RecordingMap::default();
        let mut markers = MarkerManager::new();
        markers.set_marker(&mut map, Role::Source, Coordinate::new(40.0, -79.0));
        markers.set_marker(&mut map, Role::Destination, Coordinate::new(41.0, -80.0));

        markers.clear_all(&mut map);

        assert!(map.live.is_empty());
        assert!(markers.is_empty());
    }

    #[test]
    fn clear_without_marker_is_a_no_op() {
        let mut map = RecordingMap::default();
        let mut markers = MarkerManager::new();
        markers.clear(&mut map, Role::Source);
        assert!(map.live.is_empty());
    }

    #[test]
    fn fit_view_extends_bounds_to_keep_both_endpoints_visible() {
        let mut map = RecordingMap::default();
        let markers = MarkerManager::new();
        let bounds = Bounds::new(Coordinate::new(40.0, -80.0), Coordinate::new(40.5, -79.5));
        let other = Coordinate::new(41.0, -79.0);

        markers.fit_view(&mut map, Some(bounds), Coordinate::new(40.2, -79.8), Some(other));

        assert_eq!(map.fits.len(), 1);
        assert!(map.fits[0].contains(other));
        assert!(map.pans.is_empty());
    }

    #[test]
    fn fit_view_pans_when_bounds_are_absent() {
        let mut map = RecordingMap::default();
        let markers = MarkerManager::new();
        let focus = Coordinate::new(40.4446, -79.9533);

        markers.fit_view(&mut map, None, focus, None);

        assert_eq!(map.pans, vec![focus]);
        assert!(map.fits.is_empty());
    }
}
