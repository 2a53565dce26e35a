use defmt::Format;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::{Channel, TryReceiveError};
use midi::RawPacket;

use crate::{Peer, Transport, TransportError};

/// What the USB task tells the supervisor, in bus order.
#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMessage {
    Connected,
    Packet(RawPacket),
    Disconnected(TransportError),
}

/// [`Transport`] over a queue fed by a separate USB task.
///
/// Every session starts with a `Connected`. Packets queued ahead of it
/// belong to an earlier session and are dropped.
pub struct ChannelTransport<'ch, M: RawMutex, const N: usize> {
    channel: &'ch Channel<M, LinkMessage, N>,
    peer: Peer,
    reconnected: bool,
}

impl<'ch, M: RawMutex, const N: usize> ChannelTransport<'ch, M, N> {
    pub const fn new(channel: &'ch Channel<M, LinkMessage, N>, peer: Peer) -> Self {
        Self {
            channel,
            peer,
            reconnected: false,
        }
    }
}

impl<'ch, M: RawMutex, const N: usize> Transport for ChannelTransport<'ch, M, N> {
    fn scan(&mut self) -> Result<Option<Peer>, TransportError> {
        if core::mem::take(&mut self.reconnected) {
            return Ok(Some(self.peer));
        }

        while let Ok(message) = self.channel.try_receive() {
            if message == LinkMessage::Connected {
                return Ok(Some(self.peer));
            }
        }
        Ok(None)
    }

    fn poll_packet(&mut self) -> Result<Option<RawPacket>, TransportError> {
        match self.channel.try_receive() {
            Ok(LinkMessage::Packet(packet)) => Ok(Some(packet)),
            Ok(LinkMessage::Disconnected(err)) => Err(err),
            // A second connect without a disconnect in between
            Ok(LinkMessage::Connected) => {
                self.reconnected = true;
                Err(TransportError::ProtocolGlitch)
            }
            Err(TryReceiveError::Empty) => Ok(None),
        }
    }

    fn disconnect(&mut self) {
        if self.reconnected {
            return;
        }

        // Stops at a new connection, its packets stay queued
        while let Ok(message) = self.channel.try_receive() {
            if message == LinkMessage::Connected {
                self.reconnected = true;
                return;
            }
        }
    }
}
