//! Log packet headers on stderr, optionally forwarding the stream.
//!
//! By default nothing is forwarded: inspect terminates the pipeline.
//! `pass=true` forwards the packets it is not inspecting, `pass_all=true`
//! forwards everything, re-emitting inspected packets after reading them.

use std::process::exit;

use pipesdr::opt::{self, Opt};
use pipesdr::units::valid_stream_id;
use pipesdr::{Sink, Source, stage};

fn main() {
    stage::init();
    let args = stage::args();

    let mut id = Opt::<u64>::new("stream", 0).placeholder("ID");
    let mut pass = Opt::<bool>::new("pass", false);
    let mut pass_all = Opt::<bool>::new("pass_all", false);

    if !opt::parse(&mut [&mut id], &mut [&mut pass, &mut pass_all], &args) {
        exit(-1);
    }

    if !valid_stream_id(*id.get()) {
        eprintln!("error: inspect: {} is not a valid stream id", id.get());
        exit(-1);
    }

    let want = *id.get() as u16;
    let mut source = Source::new(libc::STDIN_FILENO);
    let mut sink = Sink::new(libc::STDOUT_FILENO);

    let mut buf = Vec::new();

    while source.next() {
        let pkt = *source.packet();

        if id.is_set() && pkt.id != want {
            if *pass.get() || *pass_all.get() {
                source.pass(&mut sink);
            }
            continue;
        }

        buf.resize(pkt.size as usize, 0);
        let r = source.recv(&mut buf);
        eprintln!(
            "Packet{{ id: {}, content: {}, size: {}, duration: {} }} {} bytes received",
            pkt.id, pkt.content, pkt.size, pkt.duration, r
        );

        if *pass_all.get() {
            sink.send(pkt, &buf);
        }
    }
}
