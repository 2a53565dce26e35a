use defmt::Format;

/// Lowest playable note, A0.
pub const LOWEST_NOTE: u8 = 21;
/// Highest playable note, C8.
pub const HIGHEST_NOTE: u8 = 108;
/// One voice per key of an 88 key keyboard.
pub const POOL_SIZE: usize = (HIGHEST_NOTE - LOWEST_NOTE + 1) as usize;

/// A MIDI note number (0-127)
#[derive(Format, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Note(u8);

impl Note {
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    pub const fn as_u8(self) -> u8 {
        self.0
    }

    /// Index into the pool, or `None` if the instrument has no voice for this note.
    pub const fn slot(self) -> Option<usize> {
        if self.0 >= LOWEST_NOTE && self.0 <= HIGHEST_NOTE {
            Some((self.0 - LOWEST_NOTE) as usize)
        } else {
            None
        }
    }
}

impl From<u8> for Note {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl From<Note> for u8 {
    fn from(note: Note) -> Self {
        note.0
    }
}

impl From<midi::u7> for Note {
    fn from(value: midi::u7) -> Self {
        Self(value.into())
    }
}

/// A MIDI velocity (0-127)
#[derive(Format, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Velocity(u8);

impl Velocity {
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    pub const fn as_u8(self) -> u8 {
        self.0
    }
}

impl From<u8> for Velocity {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl From<Velocity> for u8 {
    fn from(velocity: Velocity) -> Self {
        velocity.0
    }
}

impl From<midi::u7> for Velocity {
    fn from(value: midi::u7) -> Self {
        Self(value.into())
    }
}

/// Handle to one pre-allocated synthesizer voice.
///
/// Implementations are called from the packet loop, so they must not block
/// or allocate.
pub trait Voice {
    /// Starts the note, or retriggers it if it is already sounding.
    fn press(&mut self, velocity: Velocity);
    fn release(&mut self);
    fn is_active(&self) -> bool;
}

/// A voice that only tracks its gate.
#[derive(Format, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GateVoice {
    held: bool,
    velocity: Velocity,
}

impl GateVoice {
    pub const fn new() -> Self {
        Self {
            held: false,
            velocity: Velocity(0),
        }
    }

    pub const fn velocity(&self) -> Velocity {
        self.velocity
    }
}

impl Voice for GateVoice {
    fn press(&mut self, velocity: Velocity) {
        self.held = true;
        self.velocity = velocity;
    }

    fn release(&mut self) {
        *self = Self::new();
    }

    fn is_active(&self) -> bool {
        self.held
    }
}

#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteResult {
    Success,
    OutOfRange,
}

/// Fixed table of voices, one per playable note, indexed by `note - LOWEST_NOTE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoicePool<V: Voice = GateVoice> {
    pub(crate) voices: [V; POOL_SIZE],
}

impl<V: Voice> VoicePool<V> {
    /// Builds every voice up front; the pool never creates one afterwards.
    pub fn from_fn(mut voice_for: impl FnMut(Note) -> V) -> Self {
        Self {
            voices: core::array::from_fn(|index| voice_for(Note(LOWEST_NOTE + index as u8))),
        }
    }

    pub fn press(&mut self, note: Note, velocity: Velocity) -> NoteResult {
        match note.slot() {
            Some(slot) => {
                self.voices[slot].press(velocity);
                NoteResult::Success
            }
            None => NoteResult::OutOfRange,
        }
    }

    /// Releasing a silent voice does nothing.
    pub fn release(&mut self, note: Note) -> NoteResult {
        match note.slot() {
            Some(slot) => {
                let voice = &mut self.voices[slot];
                if voice.is_active() {
                    voice.release();
                }
                NoteResult::Success
            }
            None => NoteResult::OutOfRange,
        }
    }

    /// Releases every voice, sounding or not.
    pub fn release_all(&mut self) {
        for voice in self.voices.iter_mut() {
            voice.release();
        }
    }

    pub fn is_active(&self, note: Note) -> bool {
        self.voice(note).is_some_and(|voice| voice.is_active())
    }

    pub fn active_count(&self) -> usize {
        self.voices.iter().filter(|voice| voice.is_active()).count()
    }

    pub fn voice(&self, note: Note) -> Option<&V> {
        note.slot().map(|slot| &self.voices[slot])
    }

    pub fn voices(&self) -> &[V; POOL_SIZE] {
        &self.voices
    }
}

impl<V: Voice + Default> Default for VoicePool<V> {
    fn default() -> Self {
        Self::from_fn(|_| V::default())
    }
}
