pub mod hardware;

use defmt::info;
use embassy_executor::SpawnToken;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_usb::class::midi::MidiClass;
use embassy_usb::driver::EndpointError;
use midi::RawPacket;
use static_cell::StaticCell;
use supervisor::{ChannelTransport, LinkMessage, Peer, TransportError};

use crate::usb::{USB_PID, USB_VID, UsbDriver};
use hardware::MidiUsbHardware;

pub const MIDI_CHANNEL_SIZE: usize = 64;

pub type LinkChannel = Channel<CriticalSectionRawMutex, LinkMessage, MIDI_CHANNEL_SIZE>;

pub static MIDI_TASK_CHANNEL: LinkChannel = Channel::new();

pub struct MidiTaskState {
    midi_class: MidiClass<'static, UsbDriver>,
}

impl MidiTaskState {
    pub fn new(midi_class: MidiClass<'static, UsbDriver>) -> MidiTaskState {
        MidiTaskState { midi_class }
    }
}

pub static MIDI_TASK_STATE: StaticCell<MidiTaskState> = StaticCell::new();

pub fn create_midi_task(midi_hardware: MidiUsbHardware) -> SpawnToken<impl Sized> {
    midi_task(MIDI_TASK_STATE.init(MidiTaskState::new(midi_hardware.midi_class)))
}

struct Disconnected(TransportError);

impl From<EndpointError> for Disconnected {
    fn from(val: EndpointError) -> Self {
        match val {
            EndpointError::BufferOverflow => Disconnected(TransportError::ProtocolGlitch),
            EndpointError::Disabled => Disconnected(TransportError::Fault),
        }
    }
}

async fn midi_handler(state: &mut MidiTaskState) -> Result<(), Disconnected> {
    let mut buffer = [0; 64];
    loop {
        let n = state.midi_class.read_packet(&mut buffer).await?;

        // Waits when the supervisor falls behind instead of dropping packets
        for packet in RawPacket::chunks(&buffer[..n]) {
            MIDI_TASK_CHANNEL.send(LinkMessage::Packet(packet)).await;
        }
    }
}

#[embassy_executor::task]
pub async fn midi_task(state: &'static mut MidiTaskState) {
    loop {
        state.midi_class.wait_connection().await;
        info!(
            "USB MIDI configured by host as {=u16:04X}:{=u16:04X}",
            USB_VID, USB_PID
        );
        MIDI_TASK_CHANNEL.send(LinkMessage::Connected).await;

        if let Err(Disconnected(err)) = midi_handler(state).await {
            MIDI_TASK_CHANNEL.send(LinkMessage::Disconnected(err)).await;
        }

        info!("USB MIDI disconnected");
    }
}

/// The supervisor's view of the USB task.
pub type UsbMidiTransport = ChannelTransport<'static, CriticalSectionRawMutex, MIDI_CHANNEL_SIZE>;

pub fn create_transport() -> UsbMidiTransport {
    ChannelTransport::new(&MIDI_TASK_CHANNEL, Peer::Host)
}
