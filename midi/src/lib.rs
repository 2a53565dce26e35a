#![cfg_attr(not(test), no_std)]

mod decoder;
mod packet;

use defmt::Format;

pub use decoder::{DEFAULT_SKIP_COUNT, PacketDecoder, ThinningState, decode};
pub use midly::num::u7;
pub use packet::{CodeIndex, PACKET_SIZE, RawPacket};

/// Controller number of the "All Notes Off" channel mode message.
pub const ALL_NOTES_OFF: u8 = 123;

/// A decoded channel-voice message.
///
/// `channel` is reported 1-16. Data fields are the raw wire bytes; nothing
/// here guarantees they are inside the 7-bit range.
#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelVoiceEvent {
    NoteOff { channel: u8, note: u8, velocity: u8 },
    NoteOn { channel: u8, note: u8, velocity: u8 },
    PolyPressure { channel: u8, note: u8, pressure: u8 },
    ControlChange { channel: u8, control: u8, value: u8 },
    ChannelPressure { channel: u8, pressure: u8 },
    PitchBend { channel: u8, bend: u16 },
    Ignored,
}

impl ChannelVoiceEvent {
    pub const fn is_ignored(&self) -> bool {
        matches!(self, ChannelVoiceEvent::Ignored)
    }

    /// CC 123 with value 0, on any channel.
    pub const fn is_all_notes_off(&self) -> bool {
        matches!(
            self,
            ChannelVoiceEvent::ControlChange {
                control: ALL_NOTES_OFF,
                value: 0,
                ..
            }
        )
    }
}
