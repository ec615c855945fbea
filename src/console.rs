//! Console stand-ins for the map display and the host voice bridge, used by
//! the binary so the session can be driven end to end without a GUI.

use std::collections::HashMap;

use crate::geo::{Bounds, Coordinate, Role};
use crate::map::{MapSurface, MarkerId};
use crate::voice::VoiceOutput;

/// Prints every display mutation instead of drawing it.
#[derive(Default)]
pub struct ConsoleMap {
    next_id: u64,
    live: HashMap<MarkerId, Role>,
}

impl ConsoleMap {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MapSurface for ConsoleMap {
    fn add_marker(&mut self, role: Role, at: Coordinate) -> MarkerId {
        self.next_id += 1;
        let id = MarkerId(self.next_id);
        self.live.insert(id, role);
        println!("[map] marker {} ({}) at {at}", role.icon_letter(), role);
        id
    }

    fn remove_marker(&mut self, id: MarkerId) {
        if let Some(role) = self.live.remove(&id) {
            println!("[map] marker {} ({role}) removed", role.icon_letter());
        }
    }

    fn pan_to(&mut self, at: Coordinate) {
        println!("[map] pan to {at}");
    }

    fn fit_bounds(&mut self, bounds: Bounds) {
        println!(
            "[map] fit bounds {} .. {}",
            bounds.southwest, bounds.northeast
        );
    }

    fn show_directions(&mut self, steps: &[String]) {
        println!("[directions]");
        for (index, step) in steps.iter().enumerate() {
            println!("  {}. {step}", index + 1);
        }
    }

    fn hide_directions(&mut self) {
        println!("[directions] hidden");
    }

    fn show_error(&mut self, message: &str) {
        println!("[error] {message}");
    }

    fn show_help(&mut self, message: &str) {
        println!("[help] {message}");
    }

    fn set_endpoint_text(&mut self, role: Role, text: &str) {
        println!("[form] {role}: {text:?}");
    }

    fn set_building_label(&mut self, role: Role, label: &str) {
        println!("[form] {role} building: {label}");
    }
}

/// Speaks by printing.
#[derive(Default)]
pub struct ConsoleVoice;

impl VoiceOutput for ConsoleVoice {
    fn speak(&self, text: &str) {
        println!("[voice] {text}");
    }
}
