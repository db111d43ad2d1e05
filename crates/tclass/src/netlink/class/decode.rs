//! Dump response decoding.

use zerocopy::FromBytes;

use super::{Class, ClassAttrs, GenericClass, HfscClass, HtbClass, ServiceCurve};
use crate::netlink::attr::get;
use crate::netlink::error::{Error, Result};
use crate::netlink::message::{NLMSG_HDRLEN, NlMsgHdr, NlMsgType};
use crate::netlink::parse::parse_attrs;
use crate::netlink::stats::{ClassStatistics, StatsState};
use crate::netlink::types::tc::{TcHtbOpt, TcMsg, TcServiceCurve, hfsc, htb, tca};

/// Top-level attributes of one class message, gathered before any of them
/// is interpreted.
#[derive(Default)]
struct RawClass<'a> {
    kind: Option<&'a [u8]>,
    options: Option<&'a [u8]>,
    stats: Option<&'a [u8]>,
    stats2: Option<&'a [u8]>,
}

/// Decode one dump message.
///
/// `msg` is a complete netlink message, header included. Messages that do
/// not describe a class yield `Ok(None)`.
pub fn decode_class(msg: &[u8]) -> Result<Option<Class>> {
    let header = NlMsgHdr::from_bytes(msg).map_err(|_| Error::parse("netlink header", msg))?;
    if header.nlmsg_type != NlMsgType::RTM_NEWTCLASS {
        tracing::trace!(msg_type = header.nlmsg_type, "skipping non-class message");
        return Ok(None);
    }

    let end = (header.nlmsg_len as usize).clamp(NLMSG_HDRLEN, msg.len());
    let body = &msg[NLMSG_HDRLEN..end];

    let tcmsg = TcMsg::from_bytes(body)?;
    let mut attrs = ClassAttrs::new(tcmsg.tcm_ifindex, tcmsg.tcm_handle, tcmsg.tcm_parent);

    let mut raw = RawClass::default();
    for (kind, payload) in parse_attrs(&body[TcMsg::SIZE..])? {
        match kind {
            tca::TCA_KIND => raw.kind = Some(payload),
            tca::TCA_OPTIONS => raw.options = Some(payload),
            tca::TCA_STATS => raw.stats = Some(payload),
            tca::TCA_STATS2 => raw.stats2 = Some(payload),
            _ => {}
        }
    }

    let mut state = StatsState::default();
    if let Some(data) = raw.stats {
        state.legacy(ClassStatistics::from_legacy(data)?);
    }
    if let Some(data) = raw.stats2 {
        state.modern(ClassStatistics::from_stats2(data)?);
    }
    attrs.statistics = state.into_statistics();

    let kind = match raw.kind {
        Some(data) => {
            get::string(data).map_err(|_| Error::parse("class kind: invalid UTF-8", data))?
        }
        None => "",
    };
    let options = raw.options.unwrap_or_default();

    let class = match kind {
        "htb" => Class::Htb(decode_htb(attrs, options)?),
        "hfsc" => Class::Hfsc(decode_hfsc(attrs, options)?),
        other => Class::Generic(GenericClass::new(attrs, other)),
    };

    Ok(Some(class))
}

/// Decode every message of a dump and keep the classes under `parent`.
///
/// A `parent` of 0 keeps everything. The first malformed message fails the
/// whole call.
pub fn decode_dump(msgs: &[Vec<u8>], parent: u32) -> Result<Vec<Class>> {
    let mut classes = Vec::new();

    for msg in msgs {
        let Some(class) = decode_class(msg)? else {
            continue;
        };
        if parent != 0 && class.attrs().parent != parent {
            continue;
        }
        classes.push(class);
    }

    Ok(classes)
}

fn decode_htb(attrs: ClassAttrs, options: &[u8]) -> Result<HtbClass> {
    let mut class = HtbClass {
        attrs,
        ..Default::default()
    };
    let mut rate64 = None;
    let mut ceil64 = None;

    for (kind, payload) in parse_attrs(options)? {
        match kind {
            htb::TCA_HTB_PARMS => {
                let (opt, _) = TcHtbOpt::read_from_prefix(payload).map_err(|_| {
                    Error::parse(
                        format!(
                            "HtbClass.Parms: expected {} bytes, got {}",
                            TcHtbOpt::SIZE,
                            payload.len()
                        ),
                        payload,
                    )
                })?;
                class.rate = opt.rate.rate as u64;
                class.ceil = opt.ceil.rate as u64;
                class.buffer = opt.buffer;
                class.cbuffer = opt.cbuffer;
                class.quantum = opt.quantum;
                class.level = opt.level;
                class.prio = opt.prio;
            }
            htb::TCA_HTB_RATE64 => rate64 = Some(rate64_field("HtbClass.Rate64", payload)?),
            htb::TCA_HTB_CEIL64 => ceil64 = Some(rate64_field("HtbClass.Ceil64", payload)?),
            _ => {}
        }
    }

    if let Some(rate) = rate64 {
        class.rate = rate;
    }
    if let Some(ceil) = ceil64 {
        class.ceil = ceil;
    }

    Ok(class)
}

fn rate64_field(group: &str, payload: &[u8]) -> Result<u64> {
    get::u64_ne(payload).map_err(|_| {
        Error::parse(
            format!("{}: expected 8 bytes, got {}", group, payload.len()),
            payload,
        )
    })
}

fn decode_hfsc(attrs: ClassAttrs, options: &[u8]) -> Result<HfscClass> {
    let mut class = HfscClass::new(attrs);

    for (kind, payload) in parse_attrs(options)? {
        let (slot, group) = match kind {
            hfsc::TCA_HFSC_RSC => (&mut class.rsc, "HfscClass.Rsc"),
            hfsc::TCA_HFSC_FSC => (&mut class.fsc, "HfscClass.Fsc"),
            hfsc::TCA_HFSC_USC => (&mut class.usc, "HfscClass.Usc"),
            _ => continue,
        };

        let (curve, _) = TcServiceCurve::read_from_prefix(payload).map_err(|_| {
            Error::parse(
                format!(
                    "{}: expected {} bytes, got {}",
                    group,
                    TcServiceCurve::SIZE,
                    payload.len()
                ),
                payload,
            )
        })?;
        *slot = ServiceCurve::new(
            curve.m1.saturating_mul(8),
            curve.d,
            curve.m2.saturating_mul(8),
        );
    }

    Ok(class)
}
