//! Hand-built kernel payloads for unit tests.
//!
//! Records are assembled field by field in native byte order so the
//! decoders are checked against the kernel layout, not against the
//! encoder's own output.

use crate::netlink::attr::{NLA_F_NESTED, NLA_HDRLEN, nla_align};
use crate::netlink::message::{NLM_F_MULTI, NLMSG_HDRLEN, NlMsgType};
use crate::netlink::types::tc::{hfsc, htb, tca, tca_stats};
use crate::tc::handle;

pub const LINK: i32 = 2;

pub fn handle_1_10() -> u32 {
    handle::make(1, 0x10)
}

pub fn handle_1_0() -> u32 {
    handle::make(1, 0)
}

fn words(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_ne_bytes()).collect()
}

/// One attribute, padded to alignment.
pub fn attr(kind: u16, payload: &[u8]) -> Vec<u8> {
    let len = (NLA_HDRLEN + payload.len()) as u16;
    let mut out = Vec::with_capacity(nla_align(len as usize));
    out.extend_from_slice(&len.to_ne_bytes());
    out.extend_from_slice(&kind.to_ne_bytes());
    out.extend_from_slice(payload);
    out.resize(nla_align(out.len()), 0);
    out
}

/// A nested attribute wrapping already-encoded children.
pub fn nested(kind: u16, children: &[Vec<u8>]) -> Vec<u8> {
    attr(kind | NLA_F_NESTED, &children.concat())
}

pub fn tcmsg(ifindex: i32, handle: u32, parent: u32) -> Vec<u8> {
    let mut out = vec![0u8; 4];
    out.extend_from_slice(&ifindex.to_ne_bytes());
    out.extend_from_slice(&words(&[handle, parent, 0]));
    out
}

/// A complete netlink message as it appears in a dump.
pub fn message(msg_type: u16, body: &[u8]) -> Vec<u8> {
    let len = (NLMSG_HDRLEN + body.len()) as u32;
    let mut out = Vec::with_capacity(len as usize);
    out.extend_from_slice(&len.to_ne_bytes());
    out.extend_from_slice(&msg_type.to_ne_bytes());
    out.extend_from_slice(&NLM_F_MULTI.to_ne_bytes());
    out.extend_from_slice(&words(&[7, 0]));
    out.extend_from_slice(body);
    out
}

/// A class message for `LINK`, handle 1:10, parent 1: with `attrs`.
pub fn class_message(attrs: &[Vec<u8>]) -> Vec<u8> {
    class_message_with_parent(handle_1_0(), attrs)
}

pub fn class_message_with_parent(parent: u32, attrs: &[Vec<u8>]) -> Vec<u8> {
    let mut body = tcmsg(LINK, handle_1_10(), parent);
    body.extend_from_slice(&attrs.concat());
    message(NlMsgType::RTM_NEWTCLASS, &body)
}

/// struct tc_stats without its trailing padding.
pub fn legacy_stats() -> Vec<u8> {
    let mut out = 0x1_0000_0010u64.to_ne_bytes().to_vec();
    out.extend_from_slice(&words(&[200, 3, 4, 5, 6, 7, 8]));
    out
}

fn gnet_basic(bytes: u64, packets: u32) -> Vec<u8> {
    let mut out = bytes.to_ne_bytes().to_vec();
    out.extend_from_slice(&packets.to_ne_bytes());
    out
}

/// TCA_STATS2 payload: basic 1500/10, queue 1..5, rate 100/1.
pub fn stats2() -> Vec<u8> {
    [
        attr(tca_stats::TCA_STATS_BASIC, &gnet_basic(1500, 10)),
        attr(tca_stats::TCA_STATS_RATE_EST, &words(&[100, 1])),
        attr(tca_stats::TCA_STATS_QUEUE, &words(&[1, 2, 3, 4, 5])),
    ]
    .concat()
}

pub fn stats2_with_hw() -> Vec<u8> {
    let mut out = stats2();
    out.extend_from_slice(&attr(tca_stats::TCA_STATS_BASIC_HW, &gnet_basic(64, 1)));
    out
}

pub fn stats2_short_queue() -> Vec<u8> {
    [
        attr(tca_stats::TCA_STATS_BASIC, &gnet_basic(1500, 10)),
        attr(tca_stats::TCA_STATS_QUEUE, &words(&[1, 2, 3])),
    ]
    .concat()
}

fn rate_spec(rate: u32) -> Vec<u8> {
    // cell_log 3, ethernet, overhead 0, cell_align -1, mpu 0
    let mut out = vec![3, 1, 0, 0];
    out.extend_from_slice(&(-1i16).to_ne_bytes());
    out.extend_from_slice(&0u16.to_ne_bytes());
    out.extend_from_slice(&rate.to_ne_bytes());
    out
}

/// struct tc_htb_opt: rate, ceil, buffer, cbuffer, quantum, level, prio.
pub fn htb_parms(rate: u32, ceil: u32, rest: [u32; 5]) -> Vec<u8> {
    let mut out = rate_spec(rate);
    out.extend_from_slice(&rate_spec(ceil));
    out.extend_from_slice(&words(&rest));
    out
}

/// HTB 1:10 at 125000/250000 B/s with buffers 1000/2000, quantum 1514,
/// level 0, prio 1 and modern statistics.
pub fn htb_class() -> Vec<u8> {
    class_message(&[
        attr(tca::TCA_KIND, b"htb\0"),
        nested(
            tca::TCA_OPTIONS,
            &[attr(
                htb::TCA_HTB_PARMS,
                &htb_parms(125_000, 250_000, [1000, 2000, 1514, 0, 1]),
            )],
        ),
        nested(tca::TCA_STATS2, &[stats2()]),
    ])
}

/// HTB whose rate exceeds 32 bits; RATE64 precedes PARMS.
pub fn htb_rate64_class() -> Vec<u8> {
    let rate: u64 = (1 << 32) + 1000;
    class_message(&[
        attr(tca::TCA_KIND, b"htb\0"),
        nested(
            tca::TCA_OPTIONS,
            &[
                attr(htb::TCA_HTB_RATE64, &rate.to_ne_bytes()),
                attr(
                    htb::TCA_HTB_PARMS,
                    &htb_parms(rate as u32, 500_000, [1000, 2000, 0, 0, 0]),
                ),
            ],
        ),
    ])
}

/// HTB whose ceil exceeds 32 bits; CEIL64 follows PARMS.
pub fn htb_ceil64_class() -> Vec<u8> {
    let ceil: u64 = (1 << 33) + 7;
    class_message(&[
        attr(tca::TCA_KIND, b"htb\0"),
        nested(
            tca::TCA_OPTIONS,
            &[
                attr(
                    htb::TCA_HTB_PARMS,
                    &htb_parms(125_000, ceil as u32, [1000, 2000, 0, 0, 0]),
                ),
                attr(htb::TCA_HTB_CEIL64, &ceil.to_ne_bytes()),
            ],
        ),
    ])
}

/// HTB with OPTIONS ahead of KIND.
pub fn htb_kind_last_class() -> Vec<u8> {
    class_message(&[
        nested(
            tca::TCA_OPTIONS,
            &[attr(
                htb::TCA_HTB_PARMS,
                &htb_parms(125_000, 250_000, [1000, 2000, 1514, 0, 1]),
            )],
        ),
        attr(tca::TCA_KIND, b"htb\0"),
    ])
}

/// HFSC with only a real-time curve of 100000 B/s, 10us, 50000 B/s.
pub fn hfsc_class() -> Vec<u8> {
    class_message(&[
        attr(tca::TCA_KIND, b"hfsc\0"),
        nested(
            tca::TCA_OPTIONS,
            &[attr(hfsc::TCA_HFSC_RSC, &words(&[100_000, 10, 50_000]))],
        ),
    ])
}

/// A kind with no typed model and options the decoder must not look at.
pub fn generic_class(kind: &str) -> Vec<u8> {
    let mut name = kind.as_bytes().to_vec();
    name.push(0);
    class_message(&[
        attr(tca::TCA_KIND, &name),
        attr(tca::TCA_OPTIONS, &[0xff, 0xff, 0xff]),
    ])
}

/// Legacy and modern statistics in the given order.
pub fn both_stats_class(legacy_first: bool) -> Vec<u8> {
    let legacy = attr(tca::TCA_STATS, &legacy_stats());
    let modern = nested(tca::TCA_STATS2, &[stats2()]);
    let (a, b) = if legacy_first {
        (legacy, modern)
    } else {
        (modern, legacy)
    };
    class_message(&[attr(tca::TCA_KIND, b"drr\0"), a, b])
}

pub fn legacy_stats_class() -> Vec<u8> {
    class_message(&[
        attr(tca::TCA_KIND, b"drr\0"),
        attr(tca::TCA_STATS, &legacy_stats()),
    ])
}

/// A class whose second attribute claims more bytes than remain.
pub fn malformed_class() -> Vec<u8> {
    let mut bad = Vec::new();
    bad.extend_from_slice(&64u16.to_ne_bytes());
    bad.extend_from_slice(&tca::TCA_OPTIONS.to_ne_bytes());
    bad.extend_from_slice(&[0; 4]);
    class_message(&[attr(tca::TCA_KIND, b"htb\0"), bad])
}

/// A non-class message that can appear in a shared dump buffer.
pub fn qdisc_message() -> Vec<u8> {
    let mut body = tcmsg(LINK, handle_1_0(), handle::ROOT);
    body.extend_from_slice(&attr(tca::TCA_KIND, b"htb\0"));
    message(NlMsgType::RTM_NEWQDISC, &body)
}
