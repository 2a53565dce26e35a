#![cfg_attr(not(test), no_std)]

mod voice_pool;

use defmt::Format;
use midi::ChannelVoiceEvent;

pub use voice_pool::{
    GateVoice, HIGHEST_NOTE, LOWEST_NOTE, Note, NoteResult, POOL_SIZE, Velocity, Voice, VoicePool,
};

/// What [`dispatch`] did with an event, for the diagnostic channel.
#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Pressed(Note),
    Released(Note),
    /// All Notes Off: every voice was released.
    Panic,
    /// A note the instrument has no voice for.
    OutOfRange(Note),
    /// A channel-voice message this instrument does not act on.
    Unhandled,
    Ignored,
}

/// Applies one decoded event to the pool.
///
/// Note on/off and All Notes Off are the only events that touch a voice.
/// All Notes Off acts on every channel.
pub fn dispatch<V: Voice>(event: ChannelVoiceEvent, pool: &mut VoicePool<V>) -> Dispatch {
    match event {
        ChannelVoiceEvent::NoteOn { note, velocity, .. } => {
            let note = Note::from(note);
            match pool.press(note, velocity.into()) {
                NoteResult::Success => Dispatch::Pressed(note),
                NoteResult::OutOfRange => Dispatch::OutOfRange(note),
            }
        }
        ChannelVoiceEvent::NoteOff { note, .. } => {
            let note = Note::from(note);
            match pool.release(note) {
                NoteResult::Success => Dispatch::Released(note),
                NoteResult::OutOfRange => Dispatch::OutOfRange(note),
            }
        }
        event if event.is_all_notes_off() => {
            pool.release_all();
            Dispatch::Panic
        }
        ChannelVoiceEvent::Ignored => Dispatch::Ignored,
        _ => Dispatch::Unhandled,
    }
}
