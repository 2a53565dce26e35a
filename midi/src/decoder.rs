use defmt::Format;

use crate::{ChannelVoiceEvent, CodeIndex, RawPacket};

/// Pressure messages let through: one in this many.
pub const DEFAULT_SKIP_COUNT: u8 = 6;

/// Rate limiter for aftertouch.
///
/// Keyboards with aftertouch stream pressure as fast as the bus allows, and
/// handling all of it eats the latency budget that note messages need. Each
/// pressure kind gets its own countdown; it is not tracked per note or per
/// channel.
#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThinningState {
    skip_count: u8,
    poly_pressure: u8,
    channel_pressure: u8,
}

impl ThinningState {
    pub const fn new(skip_count: u8) -> Self {
        Self {
            skip_count,
            poly_pressure: skip_count,
            channel_pressure: skip_count,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.skip_count);
    }

    pub const fn skip_count(&self) -> u8 {
        self.skip_count
    }

    pub const fn poly_pressure_remaining(&self) -> u8 {
        self.poly_pressure
    }

    pub const fn channel_pressure_remaining(&self) -> u8 {
        self.channel_pressure
    }

    fn let_through(counter: &mut u8, skip_count: u8) -> bool {
        *counter = counter.saturating_sub(1);
        if *counter == 0 {
            *counter = skip_count;
            true
        } else {
            false
        }
    }

    fn let_poly_pressure_through(&mut self) -> bool {
        Self::let_through(&mut self.poly_pressure, self.skip_count)
    }

    fn let_channel_pressure_through(&mut self) -> bool {
        Self::let_through(&mut self.channel_pressure, self.skip_count)
    }
}

impl Default for ThinningState {
    fn default() -> Self {
        Self::new(DEFAULT_SKIP_COUNT)
    }
}

/// Decodes one packet. `None` means the transport had nothing this tick.
///
/// Never fails: anything that is not a channel-voice message, or that the
/// thinning policy drops, comes back as [`ChannelVoiceEvent::Ignored`].
pub fn decode(packet: Option<RawPacket>, thinning: &mut ThinningState) -> ChannelVoiceEvent {
    let Some(packet) = packet else {
        return ChannelVoiceEvent::Ignored;
    };

    // The cable number is dropped here, merging every port into one stream.
    let code_index = packet.code_index();
    let [_, status, data1, data2] = packet.bytes();

    // Clock, start/stop and friends arrive constantly during sequencer playback
    if code_index == CodeIndex::SingleByte && status >= 0xf8 {
        return ChannelVoiceEvent::Ignored;
    }

    let channel = (status & 0x0f) + 1;

    match code_index {
        CodeIndex::NoteOff => ChannelVoiceEvent::NoteOff {
            channel,
            note: data1,
            velocity: data2,
        },
        CodeIndex::NoteOn => ChannelVoiceEvent::NoteOn {
            channel,
            note: data1,
            velocity: data2,
        },
        CodeIndex::PolyPressure if thinning.let_poly_pressure_through() => {
            ChannelVoiceEvent::PolyPressure {
                channel,
                note: data1,
                pressure: data2,
            }
        }
        CodeIndex::ControlChange => ChannelVoiceEvent::ControlChange {
            channel,
            control: data1,
            value: data2,
        },
        CodeIndex::ChannelPressure if thinning.let_channel_pressure_through() => {
            ChannelVoiceEvent::ChannelPressure {
                channel,
                pressure: data1,
            }
        }
        CodeIndex::PitchBend => ChannelVoiceEvent::PitchBend {
            channel,
            bend: (u16::from(data2 & 0x7f) << 7) | u16::from(data1 & 0x7f),
        },
        _ => ChannelVoiceEvent::Ignored,
    }
}

/// Owns the thinning counters for one connection.
#[derive(Format, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PacketDecoder {
    thinning: ThinningState,
}

impl PacketDecoder {
    pub const fn new(skip_count: u8) -> Self {
        Self {
            thinning: ThinningState::new(skip_count),
        }
    }

    pub fn decode(&mut self, packet: Option<RawPacket>) -> ChannelVoiceEvent {
        decode(packet, &mut self.thinning)
    }

    /// Puts the counters back to their initial values, e.g. after a reconnect.
    pub fn reset(&mut self) {
        self.thinning.reset();
    }

    pub const fn thinning(&self) -> &ThinningState {
        &self.thinning
    }
}
