#![cfg_attr(not(test), no_std)]

use defmt::Format;
use embassy_sync::{blocking_mutex::raw::RawMutex, signal::Signal};

pub const MIN_VOLUME_DB: i8 = -63;
pub const MAX_VOLUME_DB: i8 = 0;
pub const DEFAULT_VOLUME_DB: i8 = -20;

#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    VolumeDown,
    NextPatch,
    VolumeUp,
}

#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelEvent {
    Pressed(Button),
}

/// Turns a polled, pulled-up button level into one event per press.
#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeDetector {
    armed: bool,
}

impl EdgeDetector {
    /// `level` is the pin as first read, `true` when released.
    pub const fn new(level: bool) -> Self {
        Self { armed: level }
    }

    /// Returns `true` once on each falling edge.
    pub fn update(&mut self, level: bool) -> bool {
        if level {
            self.armed = true;
            false
        } else if self.armed {
            self.armed = false;
            true
        } else {
            false
        }
    }
}

#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelState<const PATCH_COUNT: usize> {
    volume_db: i8,
    patch: u8,
}

impl<const PATCH_COUNT: usize> PanelState<PATCH_COUNT> {
    fn new() -> Self {
        Self {
            volume_db: DEFAULT_VOLUME_DB,
            patch: 0,
        }
    }

    pub const fn volume_db(&self) -> i8 {
        self.volume_db
    }

    pub const fn patch(&self) -> u8 {
        self.patch
    }
}

pub struct PanelManager<'ch, M: RawMutex, const PATCH_COUNT: usize> {
    signal: &'ch Signal<M, PanelState<PATCH_COUNT>>,
    pub(crate) state: PanelState<PATCH_COUNT>,
}

impl<'ch, M: RawMutex, const PATCH_COUNT: usize> PanelManager<'ch, M, PATCH_COUNT> {
    pub fn new(signal: &'ch Signal<M, PanelState<PATCH_COUNT>>) -> Self {
        assert!(PATCH_COUNT > 0);
        assert!(PATCH_COUNT <= 256);

        let state = PanelState::new();
        if !signal.signaled() {
            signal.signal(state);
        }

        Self { signal, state }
    }

    pub const fn state(&self) -> PanelState<PATCH_COUNT> {
        self.state
    }

    pub fn handle_event(&mut self, event: PanelEvent) {
        let previous = self.state;

        match event {
            PanelEvent::Pressed(Button::VolumeDown) => {
                self.state.volume_db = (self.state.volume_db - 1).max(MIN_VOLUME_DB);
            }
            PanelEvent::Pressed(Button::VolumeUp) => {
                self.state.volume_db = (self.state.volume_db + 1).min(MAX_VOLUME_DB);
            }
            PanelEvent::Pressed(Button::NextPatch) => {
                self.state.patch = ((self.state.patch as usize + 1) % PATCH_COUNT) as u8;
            }
        }

        if self.state != previous {
            self.signal.signal(self.state);
        }
    }
}
