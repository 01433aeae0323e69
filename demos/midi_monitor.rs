// SPDX-FileCopyrightText: The midilink authors
// SPDX-License-Identifier: MPL-2.0

//! Print the MIDI events of a recorded byte stream.
//!
//! Reads from the file given as argument or from stdin. With `--host-mode`
//! the initialization sequence for switching a controller into host mode
//! is written to stdout instead.

use std::{
    fs::File,
    io::{stdin, stdout, Read},
};

use midilink::{
    BlockEncoder, Channel, ConnectionObserver, DecoderConfig, IoSink, MidiConnection,
    MidiReceiver, Receive, U14, U7,
};

#[derive(Debug, Default)]
struct LogReceiver;

impl MidiReceiver for LogReceiver {
    fn on_note_off(&mut self, channel: Channel, key: U7, velocity: U7) {
        println!("note off: {channel}, {key}, {velocity}");
    }

    fn on_note_on(&mut self, channel: Channel, key: U7, velocity: U7) {
        println!("note on: {channel}, {key}, {velocity}");
    }

    fn on_poly_aftertouch(&mut self, channel: Channel, key: U7, pressure: U7) {
        println!("polyphonic aftertouch: {channel}, {key}, {pressure}");
    }

    fn on_control_change(&mut self, channel: Channel, controller: U7, value: U7) {
        println!("control change: {channel}, {controller}, {value}");
    }

    fn on_program_change(&mut self, channel: Channel, program: U7) {
        println!("program change: {channel}, {program}");
    }

    fn on_channel_aftertouch(&mut self, channel: Channel, pressure: U7) {
        println!("aftertouch: {channel}, {pressure}");
    }

    fn on_pitch_bend(&mut self, channel: Channel, value: U14) {
        println!("pitch bend: {channel}, {value}");
    }

    fn on_system_exclusive(&mut self, payload: &[u8]) {
        let hex = payload
            .iter()
            .map(|byte| format!("{byte:02X}"))
            .collect::<Vec<_>>()
            .join(" ");
        println!("sysex: {hex}");
    }

    fn on_song_position(&mut self, pointer: U14) {
        println!("song position: {pointer}");
    }

    fn on_song_select(&mut self, index: U7) {
        println!("song select: {index}");
    }

    fn on_start(&mut self) {
        println!("start");
    }

    fn on_continue(&mut self) {
        println!("continue");
    }

    fn on_stop(&mut self) {
        println!("stop");
    }

    fn on_system_reset(&mut self) {
        println!("system reset");
    }
}

struct LogObserver;

impl ConnectionObserver for LogObserver {
    fn on_device_connected(&mut self, device_name: &str) {
        println!("device connected: {device_name}");
    }

    fn on_connection_lost(&mut self) {
        println!("connection lost");
    }

    fn on_connection_failed(&mut self) {
        println!("connection failed");
    }
}

const HOST_MODE_SEQUENCE: [&[u8]; 3] = [
    &[0xf0, 0x7d, 0x00, 0x5a, 0x00, 0xf7],
    &[0xf0, 0x7d, 0x00, 0x03, 0x00, 0x0a, 0xf7],
    &[0xf0, 0x7d, 0x00, 0x01, 0x41, 0xf7],
];

fn main() {
    pretty_env_logger::init();

    match run() {
        Ok(()) => (),
        Err(err) => eprintln!("Error: {err}"),
    }
}

fn run() -> anyhow::Result<()> {
    let arg = std::env::args().nth(1);
    if arg.as_deref() == Some("--host-mode") {
        return send_host_mode();
    }
    let (device_name, mut reader): (_, Box<dyn Read>) = match arg {
        Some(path) => {
            let file = File::open(&path)?;
            (path, Box::new(file))
        }
        None => ("stdin".to_owned(), Box::new(stdin().lock())),
    };
    let mut connection = MidiConnection::new(DecoderConfig::default(), LogObserver);
    connection.begin_connect();
    connection.connect(device_name, IoSink::new(stdout()));
    let mut receive = Receive(LogReceiver);
    let byte_count = connection.pump_input(&mut reader, &mut receive)?;
    log::info!("Consumed {byte_count} byte(s)");
    Ok(())
}

fn send_host_mode() -> anyhow::Result<()> {
    let encoder = BlockEncoder::new(IoSink::new(stdout()));
    for data in HOST_MODE_SEQUENCE {
        let block = encoder.block();
        block.send_bytes(data)?;
        block.end()?;
    }
    Ok(())
}
