use defmt::Format;

/// USB-MIDI event packets are always 4 bytes: [Cable/CIN][MIDI0][MIDI1][MIDI2]
pub const PACKET_SIZE: usize = 4;

/// Code Index Number, the low nibble of the packet header.
#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeIndex {
    Misc = 0x0,
    CableEvent = 0x1,
    SystemCommon2 = 0x2,
    SystemCommon3 = 0x3,
    SysExStart = 0x4,
    SysExEnd1 = 0x5,
    SysExEnd2 = 0x6,
    SysExEnd3 = 0x7,
    NoteOff = 0x8,
    NoteOn = 0x9,
    PolyPressure = 0xa,
    ControlChange = 0xb,
    ProgramChange = 0xc,
    ChannelPressure = 0xd,
    PitchBend = 0xe,
    SingleByte = 0xf,
}

impl CodeIndex {
    /// Only the low nibble is looked at.
    pub const fn from_header(header: u8) -> Self {
        match header & 0x0f {
            0x0 => CodeIndex::Misc,
            0x1 => CodeIndex::CableEvent,
            0x2 => CodeIndex::SystemCommon2,
            0x3 => CodeIndex::SystemCommon3,
            0x4 => CodeIndex::SysExStart,
            0x5 => CodeIndex::SysExEnd1,
            0x6 => CodeIndex::SysExEnd2,
            0x7 => CodeIndex::SysExEnd3,
            0x8 => CodeIndex::NoteOff,
            0x9 => CodeIndex::NoteOn,
            0xa => CodeIndex::PolyPressure,
            0xb => CodeIndex::ControlChange,
            0xc => CodeIndex::ProgramChange,
            0xd => CodeIndex::ChannelPressure,
            0xe => CodeIndex::PitchBend,
            _ => CodeIndex::SingleByte,
        }
    }

}

/// One raw USB-MIDI event packet, exactly as the transport delivered it.
#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawPacket([u8; PACKET_SIZE]);

impl RawPacket {
    pub const fn new(bytes: [u8; PACKET_SIZE]) -> Self {
        Self(bytes)
    }

    pub const fn bytes(self) -> [u8; PACKET_SIZE] {
        self.0
    }

    pub const fn code_index(self) -> CodeIndex {
        CodeIndex::from_header(self.0[0])
    }

    /// Splits a bulk transfer into packets. A trailing partial packet is dropped.
    pub fn chunks(buffer: &[u8]) -> impl Iterator<Item = RawPacket> + '_ {
        buffer
            .chunks_exact(PACKET_SIZE)
            .map(|chunk| RawPacket([chunk[0], chunk[1], chunk[2], chunk[3]]))
    }
}

impl From<[u8; PACKET_SIZE]> for RawPacket {
    fn from(bytes: [u8; PACKET_SIZE]) -> Self {
        Self(bytes)
    }
}

impl From<RawPacket> for [u8; PACKET_SIZE] {
    fn from(packet: RawPacket) -> Self {
        packet.0
    }
}
