//! Signal generator.
//!
//! Emits Signal or ComplexSignal packets of a fixed block size forever (or
//! until the downstream pipe closes). With `unit=stream` the `freq` option
//! names a control stream instead: a reader thread consumes framed packets
//! on stdin and the oscillator retunes to the latest frequency it has seen
//! between blocks. There is no queue; only the most recent value counts.

use std::process::exit;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use pipesdr::opt::{self, Opt};
use pipesdr::packet::{Content, optimal_block_size};
use pipesdr::units::{self, FreqUnit, valid_stream_id, valid_stream_id_float};
use pipesdr::{Complex, Float, Sample, Sink, Source, stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Waveform {
    Cosine,
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

pipesdr::enum_option!(Waveform {
    "cosine" => Waveform::Cosine,
    "sine" => Waveform::Sine,
    "square" => Waveform::Square,
    "triangle" => Waveform::Triangle,
    "sawtooth" => Waveform::Sawtooth,
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Real,
    Complex,
}

pipesdr::enum_option!(Mode {
    "real" => Mode::Real,
    "complex" => Mode::Complex,
});

// Latest retune command from the control thread: f32 bits in FREQ_MSG,
// acquire/release pairing on FREQ_MSG_SET. Values overwrite; there is no
// loss detection.
static FREQ_MSG: AtomicU32 = AtomicU32::new(0);
static FREQ_MSG_SET: AtomicBool = AtomicBool::new(false);
static SOURCE_END: AtomicBool = AtomicBool::new(false);

fn freq_input(id: u16, sample_rate: u64) {
    let mut source = Source::new(libc::STDIN_FILENO);

    while source.next() {
        let pkt = *source.packet();
        let unit = units::content_freq_unit(pkt.content);
        if pkt.id == id && unit != FreqUnit::Stream && pkt.count::<Float>() > 0 {
            if let Some(&freq) = source.recv_samples::<Float>().first() {
                let cycles = units::convert_freq(unit, freq, sample_rate);
                FREQ_MSG.store(cycles.to_bits(), Ordering::Relaxed);
                FREQ_MSG_SET.store(true, Ordering::Release);
            }
        }
    }

    SOURCE_END.store(true, Ordering::Relaxed);
    FREQ_MSG_SET.store(true, Ordering::Release);
}

fn fract(x: Float) -> Float {
    x - x.floor()
}

fn wave(waveform: Waveform, x: Float) -> Float {
    let t = fract(x);
    match waveform {
        Waveform::Cosine => (std::f32::consts::TAU * (t + 0.25)).sin(),
        Waveform::Sine => (std::f32::consts::TAU * t).sin(),
        Waveform::Square => {
            if t < 0.5 {
                1.0
            } else {
                -1.0
            }
        }
        Waveform::Triangle => {
            if t < 0.25 {
                4.0 * t
            } else if t < 0.75 {
                2.0 - 4.0 * t
            } else {
                4.0 * t - 4.0
            }
        }
        Waveform::Sawtooth => 2.0 * t - 1.0,
    }
}

fn main() {
    stage::init();
    let args = stage::args();

    let mut freq = Opt::<Float>::required("freq", 0.0).placeholder("FREQ");
    let mut unit = Opt::<FreqUnit>::new("unit", FreqUnit::Hertz);
    let mut waveform = Opt::<Waveform>::new("waveform", Waveform::Cosine);
    let mut sample_rate = Opt::<u64>::required("sample_rate", 0).placeholder("HERTZ");
    let mut amplitude = Opt::<Float>::new("amp", 1.0).placeholder("AMPLITUDE");
    let mut phase = Opt::<Float>::new("phi", 0.0).placeholder("PHASE");
    let mut mode = Opt::<Mode>::new("mode", Mode::Complex);
    let mut id = Opt::<u64>::new("stream", 0).placeholder("ID");

    if !opt::parse(
        &mut [&mut freq, &mut unit, &mut waveform],
        &mut [
            &mut sample_rate,
            &mut amplitude,
            &mut phase,
            &mut mode,
            &mut id,
        ],
        &args,
    ) {
        exit(-1);
    }

    if !freq.is_set() || !sample_rate.is_set() {
        eprintln!("error: gen: options 'freq' and 'sample_rate' are required");
        opt::usage(
            "gen",
            &[&freq, &unit, &waveform],
            &[&sample_rate, &amplitude, &phase, &mode, &id],
        );
        exit(-1);
    }

    if *unit.get() == FreqUnit::Stream && !valid_stream_id_float(*freq.get()) {
        eprintln!("error: gen: {} is not a valid stream id", freq.get());
        exit(-1);
    }

    if !valid_stream_id(*id.get()) {
        eprintln!("error: gen: {} is not a valid stream id", id.get());
        exit(-1);
    }

    let real = *mode.get() == Mode::Real;
    let shape = *waveform.get();

    // The analytic (complex) square, triangle and sawtooth need a Hilbert
    // filter; that lives in the DSP stages, not here.
    if !real && !matches!(shape, Waveform::Cosine | Waveform::Sine) {
        eprintln!("error: gen: only cosine and sine waveforms are available in complex mode");
        exit(-1);
    }

    let rate = *sample_rate.get();
    let element_size = if real {
        Float::size()
    } else {
        Complex::size()
    };
    let block_size = optimal_block_size(element_size as u64, rate);
    let duration = block_size as u64 * 1_000_000_000 / rate;
    let stream = *id.get() as u16;
    let a = *amplitude.get();

    let mut cycles_per_sample = units::convert_freq(*unit.get(), *freq.get(), rate);
    let mut phi = fract(*phase.get() / 360.0);
    let mut phi_incr = fract(cycles_per_sample * block_size as Float);

    let mut sink = Sink::new(libc::STDOUT_FILENO);

    let has_control = *unit.get() == FreqUnit::Stream;
    if has_control {
        let control = units::stream_id(*freq.get());
        std::thread::spawn(move || freq_input(control, rate));
    }

    let mut real_block = vec![0.0 as Float; if real { block_size } else { 0 }];
    let mut complex_block = vec![Complex::default(); if real { 0 } else { block_size }];

    loop {
        if has_control && FREQ_MSG_SET.swap(false, Ordering::AcqRel) {
            if SOURCE_END.load(Ordering::Relaxed) {
                break;
            }

            let msg = Float::from_bits(FREQ_MSG.load(Ordering::Relaxed));
            if msg != cycles_per_sample {
                cycles_per_sample = msg;
                phi_incr = fract(cycles_per_sample * block_size as Float);
            }
        }

        loop {
            if real {
                for (n, s) in real_block.iter_mut().enumerate() {
                    *s = a * wave(shape, phi + cycles_per_sample * n as Float);
                }
                sink.send_samples(stream, Content::Signal, duration, &real_block);
            } else {
                let offset = if shape == Waveform::Sine { -0.25 } else { 0.0 };
                for (n, s) in complex_block.iter_mut().enumerate() {
                    let x = std::f32::consts::TAU
                        * (phi + offset + cycles_per_sample * n as Float);
                    *s = a * Complex::new(x.cos(), x.sin());
                }
                sink.send_samples(stream, Content::ComplexSignal, duration, &complex_block);
            }

            phi = fract(phi + phi_incr);

            if has_control && FREQ_MSG_SET.load(Ordering::Acquire) {
                break;
            }
        }
    }
}
