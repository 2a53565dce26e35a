#![cfg_attr(not(test), no_std)]

use defmt::{Format, info, trace, warn};
use midi::{ChannelVoiceEvent, DEFAULT_SKIP_COUNT, PacketDecoder, RawPacket};
use voice_pool::{Dispatch, Voice, VoicePool, dispatch};

pub mod link;

pub use link::{ChannelTransport, LinkMessage};

/// Identity of a USB device.
#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    pub vid: u16,
    pub pid: u16,
}

/// What the transport bound to.
#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Peer {
    /// A MIDI device enumerated on our host port.
    Device(DeviceInfo),
    /// A USB host that configured us as its device. Its identity is unknown.
    Host,
}

/// Everything the transport can report. All of it is recovered by rescanning.
#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Device removed or a USB level I/O error.
    Fault,
    /// The device handshake went wrong while identifying it.
    ProtocolGlitch,
    EndOfStream,
}

/// Source of raw USB-MIDI packets.
///
/// Both calls must return promptly; neither may wait for the bus.
pub trait Transport {
    /// Looks for a usable peer once. `Ok(None)` means nothing was found yet.
    fn scan(&mut self) -> Result<Option<Peer>, TransportError>;

    /// Takes the next packet if one is ready.
    fn poll_packet(&mut self) -> Result<Option<RawPacket>, TransportError>;

    /// Drops every bit of state held for the current device.
    fn disconnect(&mut self);
}

#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Scanning,
    Connected,
    /// Torn down after an error, about to scan again.
    Draining,
}

#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorConfig {
    pub skip_count: u8,
    pub scan_interval_ms: u32,
    pub poll_interval_us: u32,
    /// Log every decoded event. Costs time on the packet path.
    pub trace_events: bool,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            skip_count: DEFAULT_SKIP_COUNT,
            scan_interval_ms: 400,
            poll_interval_us: 1000,
            trace_events: false,
        }
    }
}

/// Outcome of a single [`Supervisor::step`].
#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    NotFound,
    Found(Peer),
    Dispatched(Dispatch),
    /// Connected, but the transport had nothing this tick.
    Idle,
    Disconnected(TransportError),
    Rescanning,
}

/// How long the caller should wait before the next step.
#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pace {
    Immediate,
    Poll,
    Scan,
}

impl Step {
    pub const fn pace(&self) -> Pace {
        match self {
            Step::NotFound | Step::Disconnected(_) => Pace::Scan,
            Step::Idle => Pace::Poll,
            Step::Found(_) | Step::Dispatched(_) | Step::Rescanning => Pace::Immediate,
        }
    }
}

/// Owns the transport and the decode/dispatch pipeline behind it.
///
/// The state machine never waits on its own; the caller sleeps according to
/// [`Step::pace`] between steps.
pub struct Supervisor<T: Transport, V: Voice> {
    config: SupervisorConfig,
    transport: T,
    state: ConnectionState,
    peer: Option<Peer>,
    decoder: PacketDecoder,
    pool: VoicePool<V>,
}

impl<T: Transport, V: Voice> Supervisor<T, V> {
    pub fn new(config: SupervisorConfig, transport: T, pool: VoicePool<V>) -> Self {
        info!("USB Host: scanning bus...");

        Self {
            config,
            transport,
            state: ConnectionState::Scanning,
            peer: None,
            decoder: PacketDecoder::new(config.skip_count),
            pool,
        }
    }

    pub fn step(&mut self) -> Step {
        match self.state {
            ConnectionState::Scanning => match self.transport.scan() {
                Ok(Some(peer)) => {
                    match peer {
                        Peer::Device(device) => info!(
                            "found MIDI device vid:pid {=u16:04X}:{=u16:04X}",
                            device.vid, device.pid
                        ),
                        Peer::Host => info!("USB host connected"),
                    }
                    self.peer = Some(peer);
                    self.state = ConnectionState::Connected;
                    Step::Found(peer)
                }
                Ok(None) => Step::NotFound,
                Err(err) => self.tear_down(err),
            },
            ConnectionState::Connected => match self.transport.poll_packet() {
                Ok(None) => Step::Idle,
                Ok(packet) => Step::Dispatched(self.process(packet)),
                Err(err) => self.tear_down(err),
            },
            ConnectionState::Draining => {
                info!("USB Host: scanning bus...");
                self.state = ConnectionState::Scanning;
                Step::Rescanning
            }
        }
    }

    fn process(&mut self, packet: Option<RawPacket>) -> Dispatch {
        let event = self.decoder.decode(packet);
        let outcome = dispatch(event, &mut self.pool);

        if outcome == Dispatch::Panic {
            info!("PANIC");
        } else if self.config.trace_events {
            trace_event(&event);
        }

        outcome
    }

    // Voices are left alone: a note held across an unplug keeps sounding until
    // a note off or a panic arrives from the next device.
    fn tear_down(&mut self, err: TransportError) -> Step {
        warn!("USB error: {} (device unplugged?)", err);
        self.transport.disconnect();
        self.decoder.reset();
        self.peer = None;
        self.state = ConnectionState::Draining;
        Step::Disconnected(err)
    }

    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    pub const fn peer(&self) -> Option<Peer> {
        self.peer
    }

    pub const fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    pub const fn decoder(&self) -> &PacketDecoder {
        &self.decoder
    }

    pub const fn pool(&self) -> &VoicePool<V> {
        &self.pool
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

fn trace_event(event: &ChannelVoiceEvent) {
    match *event {
        ChannelVoiceEvent::NoteOff {
            channel,
            note,
            velocity,
        } => trace!("Off {} {} {}", channel, note, velocity),
        ChannelVoiceEvent::NoteOn {
            channel,
            note,
            velocity,
        } => trace!("On  {} {} {}", channel, note, velocity),
        ChannelVoiceEvent::PolyPressure {
            channel,
            note,
            pressure,
        } => trace!("PP  {} {} {}", channel, note, pressure),
        ChannelVoiceEvent::ControlChange {
            channel,
            control,
            value,
        } => trace!("CC  {} {} {}", channel, control, value),
        ChannelVoiceEvent::ChannelPressure { channel, pressure } => {
            trace!("CP  {} {}", channel, pressure)
        }
        ChannelVoiceEvent::PitchBend { channel, bend } => trace!("PB  {} {}", channel, bend),
        ChannelVoiceEvent::Ignored => {}
    }
}

#[cfg(test)]
mod test;
