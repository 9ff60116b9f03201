//! Pass or drop packets by stream id and content tag.

use std::collections::BTreeSet;
use std::process::exit;

use pipesdr::opt::{self, Opt};
use pipesdr::packet::Content;
use pipesdr::units::valid_stream_id;
use pipesdr::{Sink, Source, stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Pass,
    Drop,
}

pipesdr::enum_option!(Mode {
    "pass" => Mode::Pass,
    "drop" => Mode::Drop,
});

fn main() {
    stage::init();
    let args = stage::args();

    let mut mode = Opt::<Mode>::required("mode", Mode::Pass);
    let mut ids = Opt::<BTreeSet<u64>>::new("stream", BTreeSet::new()).placeholder("ID,...");
    let mut content = Opt::<BTreeSet<Content>>::new("content", BTreeSet::new());

    if !opt::parse(&mut [&mut mode, &mut ids, &mut content], &mut [], &args) {
        exit(-1);
    }

    if !mode.is_set() {
        eprintln!("error: stream_filter: option 'mode' is required");
        opt::usage("stream_filter", &[&mode, &ids, &content], &[]);
        exit(-1);
    }

    for &id in ids.get() {
        if !valid_stream_id(id) {
            eprintln!("error: stream_filter: {id} is not a valid stream id");
            exit(-1);
        }
    }

    let mut source = Source::new(libc::STDIN_FILENO);
    let mut sink = Sink::new(libc::STDOUT_FILENO);

    if *mode.get() == Mode::Pass {
        while source.next() {
            let pkt = *source.packet();

            if ids.is_set() && !ids.get().contains(&u64::from(pkt.id)) {
                continue;
            }

            if content.is_set() && !content.get().contains(&pkt.content) {
                continue;
            }

            source.pass(&mut sink);
        }
    } else {
        while source.next() {
            let pkt = *source.packet();

            // An id match drops the packet, unless a content set narrows
            // the drop and the content does not match.
            if ids.is_set() {
                if ids.get().contains(&u64::from(pkt.id)) {
                    if !content.is_set() {
                        continue;
                    } else if content.get().contains(&pkt.content) {
                        continue;
                    }
                }
            } else if content.is_set() {
                if content.get().contains(&pkt.content) {
                    continue;
                }
            } else {
                continue;
            }

            source.pass(&mut sink);
        }
    }
}
