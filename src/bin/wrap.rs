//! Frame a raw byte stream on stdin into packets on stdout.

use std::process::exit;

use pipesdr::opt::{self, Opt};
use pipesdr::packet::{Content, Packet, optimal_block_size};
use pipesdr::units::valid_stream_id;
use pipesdr::{Sink, Source, stage};

fn main() {
    stage::init();
    let args = stage::args();

    let mut content = Opt::<Content>::new("content_type", Content::Binary);
    let mut id = Opt::<u64>::new("stream", 0).placeholder("ID");
    let mut element_size = Opt::<u64>::required("element_size", 0).placeholder("BYTES");
    let mut element_count = Opt::<u64>::new("element_count", 0).placeholder("COUNT");
    let mut duration = Opt::<u64>::new("duration", 0).placeholder("NANOSECONDS");
    let mut sample_rate = Opt::<u64>::new("sample_rate", 0).placeholder("HERTZ");

    if !opt::parse(
        &mut [&mut content, &mut id],
        &mut [
            &mut element_size,
            &mut element_count,
            &mut duration,
            &mut sample_rate,
        ],
        &args,
    ) {
        exit(-1);
    }

    if !element_size.is_set() {
        eprintln!("error: wrap: option 'element_size' is required");
        opt::usage(
            "wrap",
            &[&content, &id],
            &[&element_size, &element_count, &duration, &sample_rate],
        );
        exit(-1);
    }

    let esize = *element_size.get();
    if esize < 1 {
        eprintln!("error: wrap: element_size must be greater than zero");
        exit(-1);
    }

    if !valid_stream_id(*id.get()) {
        eprintln!("error: wrap: {} is not a valid stream id", id.get());
        exit(-1);
    }

    let mut pkt = Packet {
        id: *id.get() as u16,
        content: *content.get(),
        size: 0,
        duration: *duration.get(),
    };

    if element_count.is_set() {
        if *element_count.get() == 0 {
            eprintln!("error: wrap: element_count must be greater than zero");
            exit(-1);
        }

        pkt.size = (esize * element_count.get()) as u32;
    } else if sample_rate.is_set() && duration.is_set() {
        let count = duration.get() * sample_rate.get() / 1_000_000_000;
        if count < 1 {
            eprintln!("error: wrap: packet duration is too small");
            exit(-1);
        }

        pkt.size = (esize * count) as u32;
    } else {
        pkt.size = (esize * optimal_block_size(esize, *sample_rate.get()) as u64) as u32;
    }

    if sample_rate.is_set() {
        pkt.duration = (u64::from(pkt.size) / esize) * 1_000_000_000 / sample_rate.get();

        if duration.is_set() && element_count.is_set() && *duration.get() != pkt.duration {
            eprintln!("error: wrap: duration and element_count do not match");
            exit(-1);
        }
    }

    if !content.is_set() {
        eprintln!("warning: wrap: content type not set, input will be treated as binary data");
    }

    let mut source = Source::raw(libc::STDIN_FILENO);
    let mut sink = Sink::new(libc::STDOUT_FILENO);

    while source.next_raw(pkt) {
        while !source.poll(-1) {}
        source.pass(&mut sink);
    }
}
