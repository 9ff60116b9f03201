//! Strip packet headers, writing raw payload bytes on stdout.

use std::process::exit;

use pipesdr::opt::{self, Opt};
use pipesdr::units::valid_stream_id;
use pipesdr::{Sink, Source, stage};

fn main() {
    stage::init();
    let args = stage::args();

    let mut id = Opt::<u64>::new("stream", 0).placeholder("ID");

    if !opt::parse(&mut [&mut id], &mut [], &args) {
        exit(-1);
    }

    if !valid_stream_id(*id.get()) {
        eprintln!("error: unwrap: {} is not a valid stream id", id.get());
        exit(-1);
    }

    let want = *id.get() as u16;
    let mut source = Source::new(libc::STDIN_FILENO);
    let mut sink = Sink::raw(libc::STDOUT_FILENO);

    while source.next() {
        if !id.is_set() || source.packet().id == want {
            source.pass(&mut sink);
        }
    }
}
