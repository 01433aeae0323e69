// SPDX-FileCopyrightText: The midilink authors
// SPDX-License-Identifier: MPL-2.0

use crate::event::{Channel, DecodedEvent, U14, U7};

/// Consumer of decoded events.
///
/// Invoked synchronously on the thread that delivers the input bytes
/// and should return quickly.
pub trait EventSink {
    fn sink_event(&mut self, event: DecodedEvent);
}

impl<F> EventSink for F
where
    F: FnMut(DecodedEvent),
{
    fn sink_event(&mut self, event: DecodedEvent) {
        self(event);
    }
}

/// Callbacks for each kind of decoded event.
///
/// All methods do nothing by default. Wrap an implementation in
/// [`Receive`] to use it as an [`EventSink`].
#[allow(unused_variables)]
pub trait MidiReceiver {
    fn on_note_off(&mut self, channel: Channel, key: U7, velocity: U7) {}

    fn on_note_on(&mut self, channel: Channel, key: U7, velocity: U7) {}

    fn on_poly_aftertouch(&mut self, channel: Channel, key: U7, pressure: U7) {}

    fn on_control_change(&mut self, channel: Channel, controller: U7, value: U7) {}

    fn on_program_change(&mut self, channel: Channel, program: U7) {}

    fn on_channel_aftertouch(&mut self, channel: Channel, pressure: U7) {}

    fn on_pitch_bend(&mut self, channel: Channel, value: U14) {}

    /// Payload without the 0xF0 and 0xF7 delimiters.
    fn on_system_exclusive(&mut self, payload: &[u8]) {}

    fn on_time_code(&mut self, value: U7) {}

    fn on_song_position(&mut self, pointer: U14) {}

    fn on_song_select(&mut self, index: U7) {}

    fn on_tune_request(&mut self) {}

    fn on_timing_clock(&mut self) {}

    fn on_start(&mut self) {}

    fn on_continue(&mut self) {}

    fn on_stop(&mut self) {}

    fn on_active_sensing(&mut self) {}

    fn on_system_reset(&mut self) {}
}

/// Invoke the matching [`MidiReceiver`] callback for `event`.
pub fn dispatch_event<R>(receiver: &mut R, event: &DecodedEvent)
where
    R: MidiReceiver + ?Sized,
{
    match *event {
        DecodedEvent::NoteOff {
            channel,
            key,
            velocity,
        } => receiver.on_note_off(channel, key, velocity),
        DecodedEvent::NoteOn {
            channel,
            key,
            velocity,
        } => receiver.on_note_on(channel, key, velocity),
        DecodedEvent::PolyAftertouch {
            channel,
            key,
            pressure,
        } => receiver.on_poly_aftertouch(channel, key, pressure),
        DecodedEvent::ControlChange {
            channel,
            controller,
            value,
        } => receiver.on_control_change(channel, controller, value),
        DecodedEvent::ProgramChange { channel, program } => {
            receiver.on_program_change(channel, program);
        }
        DecodedEvent::ChannelAftertouch { channel, pressure } => {
            receiver.on_channel_aftertouch(channel, pressure);
        }
        DecodedEvent::PitchBend { channel, value } => receiver.on_pitch_bend(channel, value),
        DecodedEvent::SystemExclusive(ref payload) => receiver.on_system_exclusive(payload),
        DecodedEvent::TimeCode(value) => receiver.on_time_code(value),
        DecodedEvent::SongPosition(pointer) => receiver.on_song_position(pointer),
        DecodedEvent::SongSelect(index) => receiver.on_song_select(index),
        DecodedEvent::TuneRequest => receiver.on_tune_request(),
        DecodedEvent::TimingClock => receiver.on_timing_clock(),
        DecodedEvent::Start => receiver.on_start(),
        DecodedEvent::Continue => receiver.on_continue(),
        DecodedEvent::Stop => receiver.on_stop(),
        DecodedEvent::ActiveSensing => receiver.on_active_sensing(),
        DecodedEvent::SystemReset => receiver.on_system_reset(),
    }
}

/// Adapter that dispatches events to a [`MidiReceiver`].
#[derive(Debug, Clone, Default)]
pub struct Receive<R>(pub R);

impl<R> Receive<R> {
    #[must_use]
    pub fn into_inner(self) -> R {
        let Self(receiver) = self;
        receiver
    }
}

impl<R> EventSink for Receive<R>
where
    R: MidiReceiver,
{
    fn sink_event(&mut self, event: DecodedEvent) {
        dispatch_event(&mut self.0, &event);
    }
}
