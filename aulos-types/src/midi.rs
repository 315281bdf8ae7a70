//! Raw and typed MIDI events.
//!
//! The driver callback copies bytes into a fixed-size `MidiEvent` and queues
//! it; translation into a typed `MidiEventKind` happens later, on the audio
//! thread, when the queue is drained at a block boundary. Events that do not
//! fit the fixed record (SysEx and other long messages) are never queued.

/// Raw MIDI event as delivered by the driver callback.
///
/// Fixed-size and `Copy` so it can cross the realtime ring buffer by value,
/// without allocation or shared ownership.
#[derive(Debug, Clone, Copy)]
pub struct MidiEvent {
    /// Driver timestamp in microseconds (driver-specific epoch).
    pub timestamp_us: u64,
    data: [u8; 3],
    len: u8,
}

impl MidiEvent {
    /// Copy up to three bytes of a driver message into a queueable event.
    /// Returns `None` for empty or over-long (SysEx etc.) messages.
    pub fn from_bytes(timestamp_us: u64, bytes: &[u8]) -> Option<Self> {
        if bytes.is_empty() || bytes.len() > 3 {
            return None;
        }
        let mut data = [0u8; 3];
        data[..bytes.len()].copy_from_slice(bytes);
        Some(Self {
            timestamp_us,
            data,
            len: bytes.len() as u8,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }

    /// Translate to a typed event. `None` means the bytes were not a channel
    /// voice message we handle; the caller treats that as a no-op.
    pub fn parse(&self) -> Option<MidiEventKind> {
        MidiEventKind::from_bytes(self.bytes())
    }
}

/// Typed channel voice message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEventKind {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8 },
    PolyAftertouch { channel: u8, note: u8, pressure: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    ProgramChange { channel: u8, program: u8 },
    Aftertouch { channel: u8, pressure: u8 },
    /// Pitch bend, centered at 0: -8192 (full down) to +8191 (full up).
    PitchBend { channel: u8, value: i16 },
}

impl MidiEventKind {
    /// Decode a raw channel voice message. Note On with velocity 0 is folded
    /// into Note Off per the MIDI convention.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        let status = *data.first()?;
        let channel = status & 0x0F;
        let two = data.len() >= 2;
        let three = data.len() >= 3;

        match status & 0xF0 {
            0x80 if three => Some(Self::NoteOff {
                channel,
                note: data[1],
            }),
            0x90 if three => {
                if data[2] == 0 {
                    Some(Self::NoteOff {
                        channel,
                        note: data[1],
                    })
                } else {
                    Some(Self::NoteOn {
                        channel,
                        note: data[1],
                        velocity: data[2],
                    })
                }
            }
            0xA0 if three => Some(Self::PolyAftertouch {
                channel,
                note: data[1],
                pressure: data[2],
            }),
            0xB0 if three => Some(Self::ControlChange {
                channel,
                controller: data[1],
                value: data[2],
            }),
            0xC0 if two => Some(Self::ProgramChange {
                channel,
                program: data[1],
            }),
            0xD0 if two => Some(Self::Aftertouch {
                channel,
                pressure: data[1],
            }),
            0xE0 if three => {
                let lsb = data[1] as i16;
                let msb = data[2] as i16;
                Some(Self::PitchBend {
                    channel,
                    value: ((msb << 7) | lsb) - 8192,
                })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_on() {
        let event = MidiEventKind::from_bytes(&[0x91, 60, 100]).unwrap();
        assert_eq!(
            event,
            MidiEventKind::NoteOn {
                channel: 1,
                note: 60,
                velocity: 100
            }
        );
    }

    #[test]
    fn test_note_off() {
        let event = MidiEventKind::from_bytes(&[0x80, 60, 0]).unwrap();
        assert_eq!(
            event,
            MidiEventKind::NoteOff {
                channel: 0,
                note: 60
            }
        );
    }

    #[test]
    fn test_note_on_velocity_zero_is_note_off() {
        let event = MidiEventKind::from_bytes(&[0x90, 72, 0]).unwrap();
        assert!(matches!(event, MidiEventKind::NoteOff { note: 72, .. }));
    }

    #[test]
    fn test_control_change() {
        let event = MidiEventKind::from_bytes(&[0xB0, 1, 64]).unwrap();
        assert_eq!(
            event,
            MidiEventKind::ControlChange {
                channel: 0,
                controller: 1,
                value: 64
            }
        );
    }

    #[test]
    fn test_pitch_bend_range() {
        let center = MidiEventKind::from_bytes(&[0xE0, 0x00, 0x40]).unwrap();
        assert_eq!(center, MidiEventKind::PitchBend { channel: 0, value: 0 });

        let up = MidiEventKind::from_bytes(&[0xE0, 0x7F, 0x7F]).unwrap();
        assert_eq!(up, MidiEventKind::PitchBend { channel: 0, value: 8191 });

        let down = MidiEventKind::from_bytes(&[0xE0, 0x00, 0x00]).unwrap();
        assert_eq!(
            down,
            MidiEventKind::PitchBend {
                channel: 0,
                value: -8192
            }
        );
    }

    #[test]
    fn test_short_and_empty_messages() {
        assert!(MidiEventKind::from_bytes(&[]).is_none());
        assert!(MidiEventKind::from_bytes(&[0x90, 60]).is_none());
        assert!(MidiEventKind::from_bytes(&[0xE0, 0x00]).is_none());
        assert!(MidiEventKind::from_bytes(&[0xC0]).is_none());
    }

    #[test]
    fn test_system_messages_ignored() {
        assert!(MidiEventKind::from_bytes(&[0xF0, 0x01, 0xF7]).is_none());
        assert!(MidiEventKind::from_bytes(&[0x00]).is_none());
    }

    #[test]
    fn test_raw_event_round_trip() {
        let raw = MidiEvent::from_bytes(42, &[0x90, 60, 100]).unwrap();
        assert_eq!(raw.timestamp_us, 42);
        assert_eq!(raw.bytes(), &[0x90, 60, 100]);
        assert!(matches!(raw.parse(), Some(MidiEventKind::NoteOn { .. })));
    }

    #[test]
    fn test_raw_event_rejects_long_messages() {
        assert!(MidiEvent::from_bytes(0, &[0xF0, 1, 2, 3, 0xF7]).is_none());
        assert!(MidiEvent::from_bytes(0, &[]).is_none());
    }
}
