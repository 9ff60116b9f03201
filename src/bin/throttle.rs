//! Forward packets at their nominal rate.
//!
//! Sleeps the packet's duration after forwarding it, against an
//! accumulating deadline so jitter does not add up. With `stream=ID` only
//! matching packets are paced; everything is forwarded either way.

use std::process::exit;
use std::time::{Duration, Instant};

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
        eprintln!("error: throttle: {} is not a valid stream id", id.get());
        exit(-1);
    }

    let want = *id.get() as u16;
    let mut source = Source::new(libc::STDIN_FILENO);
    let mut sink = Sink::new(libc::STDOUT_FILENO);

    let mut deadline = Instant::now();
    while source.next() {
        source.pass(&mut sink);

        let pkt = *source.packet();
        if !(id.is_set() && pkt.id != want) && pkt.duration > 0 {
            deadline += Duration::from_nanos(pkt.duration);
            let now = Instant::now();
            if deadline > now {
                std::thread::sleep(deadline - now);
            }
        }
    }
}
