use std::collections::VecDeque;

use midi::ThinningState;
use pretty_assertions::assert_eq;
use voice_pool::{GateVoice, Note};

use super::*;

const KEYBOARD: Peer = Peer::Device(DeviceInfo {
    vid: 0x09e8,
    pid: 0x0076,
});

/// Plays back a fixed sequence of scan and poll results.
#[derive(Default)]
struct ScriptedTransport {
    scans: VecDeque<Result<Option<Peer>, TransportError>>,
    packets: VecDeque<Result<Option<RawPacket>, TransportError>>,
    disconnects: usize,
}

impl ScriptedTransport {
    fn found(&mut self, peer: Peer) -> &mut Self {
        self.scans.push_back(Ok(Some(peer)));
        self
    }

    fn not_found(&mut self) -> &mut Self {
        self.scans.push_back(Ok(None));
        self
    }

    fn scan_error(&mut self, err: TransportError) -> &mut Self {
        self.scans.push_back(Err(err));
        self
    }

    fn packet(&mut self, bytes: [u8; 4]) -> &mut Self {
        self.packets.push_back(Ok(Some(RawPacket::new(bytes))));
        self
    }

    fn nothing(&mut self) -> &mut Self {
        self.packets.push_back(Ok(None));
        self
    }

    fn fail(&mut self, err: TransportError) -> &mut Self {
        self.packets.push_back(Err(err));
        self
    }
}

impl Transport for ScriptedTransport {
    fn scan(&mut self) -> Result<Option<Peer>, TransportError> {
        self.scans.pop_front().unwrap_or(Ok(None))
    }

    fn poll_packet(&mut self) -> Result<Option<RawPacket>, TransportError> {
        self.packets.pop_front().unwrap_or(Ok(None))
    }

    fn disconnect(&mut self) {
        self.disconnects += 1;
        self.packets.clear();
    }
}

macro_rules! setup_supervisor {
    ($supervisor:ident) => {
        setup_supervisor!($supervisor, SupervisorConfig::default());
    };
    ($supervisor:ident, $config:expr) => {
        #[allow(unused_mut)]
        let mut $supervisor = Supervisor::new(
            $config,
            ScriptedTransport::default(),
            VoicePool::<GateVoice>::default(),
        );
    };
}

const NOTE_ON_60: [u8; 4] = [0x09, 0x90, 0x3c, 0x64];
const NOTE_OFF_60: [u8; 4] = [0x08, 0x80, 0x3c, 0x00];
const PANIC_CHANNEL_3: [u8; 4] = [0x0b, 0xb2, 0x7b, 0x00];
const POLY_PRESSURE: [u8; 4] = [0x0a, 0xa0, 0x3c, 0x40];

#[test]
fn starts_scanning_and_waits_while_nothing_is_found() {
    setup_supervisor!(supervisor);
    supervisor.transport_mut().not_found().not_found();

    assert_eq!(supervisor.state(), ConnectionState::Scanning);
    assert_eq!(supervisor.step(), Step::NotFound);
    assert_eq!(supervisor.step(), Step::NotFound);
    assert_eq!(supervisor.step().pace(), Pace::Scan);
    assert_eq!(supervisor.state(), ConnectionState::Scanning);
    assert_eq!(supervisor.peer(), None);
}

#[test]
fn connects_when_a_device_is_found() {
    setup_supervisor!(supervisor);
    supervisor.transport_mut().not_found().found(KEYBOARD);

    supervisor.step();
    let step = supervisor.step();

    assert_eq!(step, Step::Found(KEYBOARD));
    assert_eq!(step.pace(), Pace::Immediate);
    assert_eq!(supervisor.state(), ConnectionState::Connected);
    assert_eq!(supervisor.peer(), Some(KEYBOARD));
}

#[test]
fn packets_flow_through_to_the_voice_pool_in_order() {
    setup_supervisor!(supervisor);
    supervisor
        .transport_mut()
        .found(KEYBOARD)
        .packet(NOTE_ON_60)
        .packet(NOTE_OFF_60)
        .packet(NOTE_ON_60);

    supervisor.step();

    assert_eq!(
        supervisor.step(),
        Step::Dispatched(Dispatch::Pressed(Note::new(60)))
    );
    assert!(supervisor.pool().is_active(Note::new(60)));

    assert_eq!(
        supervisor.step(),
        Step::Dispatched(Dispatch::Released(Note::new(60)))
    );
    assert!(!supervisor.pool().is_active(Note::new(60)));

    supervisor.step();
    assert!(supervisor.pool().is_active(Note::new(60)));
}

#[test]
fn empty_poll_is_idle_and_keeps_the_connection() {
    setup_supervisor!(supervisor);
    supervisor.transport_mut().found(KEYBOARD).nothing();

    supervisor.step();
    let step = supervisor.step();

    assert_eq!(step, Step::Idle);
    assert_eq!(step.pace(), Pace::Poll);
    assert_eq!(supervisor.state(), ConnectionState::Connected);
}

#[test]
fn fault_mid_stream_rescans_and_leaves_held_notes_sounding() {
    setup_supervisor!(supervisor);
    supervisor
        .transport_mut()
        .found(KEYBOARD)
        .packet(POLY_PRESSURE)
        .packet(POLY_PRESSURE)
        .packet(NOTE_ON_60)
        .fail(TransportError::Fault);

    for _ in 0..4 {
        supervisor.step();
    }
    assert_ne!(*supervisor.decoder().thinning(), ThinningState::default());

    assert_eq!(
        supervisor.step(),
        Step::Disconnected(TransportError::Fault)
    );
    assert_eq!(supervisor.state(), ConnectionState::Draining);
    assert_eq!(supervisor.peer(), None);
    assert_eq!(supervisor.transport_mut().disconnects, 1);
    assert_eq!(*supervisor.decoder().thinning(), ThinningState::default());
    assert!(supervisor.pool().is_active(Note::new(60)));

    assert_eq!(supervisor.step(), Step::Rescanning);
    assert_eq!(supervisor.state(), ConnectionState::Scanning);
    assert!(supervisor.pool().is_active(Note::new(60)));
}

#[test]
fn stuck_note_is_cleared_by_a_panic_after_reconnect() {
    setup_supervisor!(supervisor);
    supervisor
        .transport_mut()
        .found(KEYBOARD)
        .packet(NOTE_ON_60)
        .fail(TransportError::EndOfStream);

    for _ in 0..4 {
        supervisor.step();
    }
    assert_eq!(supervisor.state(), ConnectionState::Scanning);
    assert!(supervisor.pool().is_active(Note::new(60)));

    supervisor
        .transport_mut()
        .found(KEYBOARD)
        .packet(PANIC_CHANNEL_3);

    assert_eq!(supervisor.step(), Step::Found(KEYBOARD));
    assert_eq!(supervisor.step(), Step::Dispatched(Dispatch::Panic));
    assert_eq!(supervisor.pool().active_count(), 0);
}

#[test]
fn stuck_note_is_cleared_by_a_note_off_after_reconnect() {
    setup_supervisor!(supervisor);
    supervisor
        .transport_mut()
        .found(KEYBOARD)
        .packet(NOTE_ON_60)
        .fail(TransportError::Fault);

    for _ in 0..4 {
        supervisor.step();
    }
    supervisor.transport_mut().found(KEYBOARD).packet(NOTE_OFF_60);
    supervisor.step();
    supervisor.step();

    assert_eq!(supervisor.pool().active_count(), 0);
}

#[test]
fn packets_queued_before_a_fault_are_not_carried_across() {
    setup_supervisor!(supervisor);
    supervisor
        .transport_mut()
        .found(KEYBOARD)
        .fail(TransportError::Fault)
        .packet(NOTE_ON_60);

    supervisor.step();
    supervisor.step();
    supervisor.step();
    supervisor.transport_mut().found(KEYBOARD);
    supervisor.step();

    assert_eq!(supervisor.step(), Step::Idle);
    assert_eq!(supervisor.pool().active_count(), 0);
}

#[test]
fn handshake_glitch_while_scanning_is_recovered() {
    setup_supervisor!(supervisor);
    supervisor
        .transport_mut()
        .scan_error(TransportError::ProtocolGlitch)
        .found(KEYBOARD);

    let step = supervisor.step();
    assert_eq!(step, Step::Disconnected(TransportError::ProtocolGlitch));
    assert_eq!(step.pace(), Pace::Scan);
    assert_eq!(supervisor.transport_mut().disconnects, 1);

    assert_eq!(supervisor.step(), Step::Rescanning);
    assert_eq!(supervisor.step(), Step::Found(KEYBOARD));
}

#[test]
fn thinning_follows_the_configured_skip_count() {
    setup_supervisor!(
        supervisor,
        SupervisorConfig {
            skip_count: 2,
            trace_events: true,
            ..SupervisorConfig::default()
        }
    );
    supervisor
        .transport_mut()
        .found(KEYBOARD)
        .packet(POLY_PRESSURE)
        .packet(POLY_PRESSURE)
        .packet(POLY_PRESSURE)
        .packet(POLY_PRESSURE);

    supervisor.step();
    let steps: Vec<Step> = (0..4).map(|_| supervisor.step()).collect();

    assert_eq!(
        steps,
        vec![
            Step::Dispatched(Dispatch::Ignored),
            Step::Dispatched(Dispatch::Unhandled),
            Step::Dispatched(Dispatch::Ignored),
            Step::Dispatched(Dispatch::Unhandled),
        ]
    );
}

#[test]
fn default_config_matches_the_firmware_loop() {
    let config = SupervisorConfig::default();

    assert_eq!(config.skip_count, 6);
    assert_eq!(config.scan_interval_ms, 400);
    assert!(!config.trace_events);
}

#[test]
fn tracing_events_does_not_change_what_is_dispatched() {
    let run = |trace_events| {
        setup_supervisor!(
            supervisor,
            SupervisorConfig {
                trace_events,
                ..SupervisorConfig::default()
            }
        );
        supervisor
            .transport_mut()
            .found(KEYBOARD)
            .packet(NOTE_ON_60)
            .packet([0x0e, 0xe0, 0x00, 0x40])
            .packet(PANIC_CHANNEL_3);

        let steps: Vec<Step> = (0..4).map(|_| supervisor.step()).collect();
        (steps, supervisor.pool().active_count())
    };

    assert_eq!(run(true), run(false));
    assert_eq!(
        run(true).0[1..].to_vec(),
        vec![
            Step::Dispatched(Dispatch::Pressed(Note::new(60))),
            Step::Dispatched(Dispatch::Unhandled),
            Step::Dispatched(Dispatch::Panic),
        ]
    );
}
