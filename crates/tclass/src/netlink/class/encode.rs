//! Class request encoding.

use zerocopy::IntoBytes;

use super::{Class, GenericClass, HTB_DEFAULT_MTU, HfscClass, HtbClass};
use crate::netlink::builder::MessageBuilder;
use crate::netlink::error::{Error, Result};
use crate::netlink::message::{
    NLM_F_ACK, NLM_F_CREATE, NLM_F_DUMP, NLM_F_EXCL, NLM_F_REQUEST, NlMsgType,
};
use crate::netlink::types::tc::linklayer::LINKLAYER_ETHERNET;
use crate::netlink::types::tc::{
    TcHtbOpt, TcMsg, TcRateSpec, TcServiceCurve, hfsc, htb, tca,
};
use crate::tc::core::{PschedClock, rtab_bytes};

/// Rates at or above this value need the 64-bit override attributes.
const RATE64_THRESHOLD: u64 = 1 << 32;

/// The write verbs a class request can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassCommand {
    /// Create; fails if the class exists.
    Add,
    /// Modify an existing class in place.
    Change,
    /// Create or modify.
    Replace,
    /// Remove.
    Delete,
}

impl ClassCommand {
    /// rtnetlink message type.
    pub fn msg_type(self) -> u16 {
        match self {
            Self::Delete => NlMsgType::RTM_DELTCLASS,
            _ => NlMsgType::RTM_NEWTCLASS,
        }
    }

    /// Header flags, including `NLM_F_REQUEST | NLM_F_ACK`.
    pub fn flags(self) -> u16 {
        let extra = match self {
            Self::Add => NLM_F_CREATE | NLM_F_EXCL,
            Self::Replace => NLM_F_CREATE,
            Self::Change | Self::Delete => 0,
        };
        NLM_F_REQUEST | NLM_F_ACK | extra
    }

    /// Verb for log lines and error context.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Change => "change",
            Self::Replace => "replace",
            Self::Delete => "del",
        }
    }
}

/// Build the request for `cmd` on `class`.
///
/// Delete requests carry only the `tcmsg` descriptor. Every other verb adds
/// `TCA_KIND` and a `TCA_OPTIONS` container with the kind's parameters.
pub fn encode_class(cmd: ClassCommand, class: &Class, clock: &PschedClock) -> Result<MessageBuilder> {
    let attrs = class.attrs();
    let tcmsg = TcMsg::new()
        .with_ifindex(attrs.link_index)
        .with_handle(attrs.handle)
        .with_parent(attrs.parent);

    let mut builder = MessageBuilder::new(cmd.msg_type(), cmd.flags());
    builder.append(&tcmsg);

    if cmd == ClassCommand::Delete {
        return Ok(builder);
    }

    if let Class::Generic(generic) = class {
        check_generic(generic)?;
    }

    builder.append_attr_str(tca::TCA_KIND, class.kind());

    let options = builder.nest_start(tca::TCA_OPTIONS);
    match class {
        Class::Htb(htb) => write_htb(&mut builder, htb, clock)?,
        Class::Hfsc(hfsc) => write_hfsc(&mut builder, hfsc),
        Class::Generic(_) => {}
    }
    builder.nest_end(options);

    Ok(builder)
}

/// Build a class dump request for one link (0 = all) and parent.
pub fn encode_list_request(ifindex: i32, parent: u32) -> MessageBuilder {
    let tcmsg = TcMsg::new().with_ifindex(ifindex).with_parent(parent);
    let mut builder = MessageBuilder::new(NlMsgType::RTM_GETTCLASS, NLM_F_REQUEST | NLM_F_DUMP);
    builder.append(&tcmsg);
    builder
}

fn check_generic(class: &GenericClass) -> Result<()> {
    match class.kind.as_str() {
        "htb" | "hfsc" => Err(Error::UnsupportedVariant {
            kind: class.kind.clone(),
        }),
        _ => Ok(()),
    }
}

fn write_htb(builder: &mut MessageBuilder, class: &HtbClass, clock: &PschedClock) -> Result<()> {
    // The 32-bit fields carry the low bits; RATE64/CEIL64 carry the rest.
    let mut rate = TcRateSpec::new(class.rate as u32);
    let rtab = clock.calc_rtable(&mut rate, class.rate, None, HTB_DEFAULT_MTU, LINKLAYER_ETHERNET)?;

    let mut ceil = TcRateSpec::new(class.ceil as u32);
    let ctab = clock.calc_rtable(&mut ceil, class.ceil, None, HTB_DEFAULT_MTU, LINKLAYER_ETHERNET)?;

    let opt = TcHtbOpt {
        rate,
        ceil,
        buffer: class.buffer,
        cbuffer: class.cbuffer,
        quantum: class.quantum,
        level: class.level,
        prio: class.prio,
    };

    builder.append_attr(htb::TCA_HTB_PARMS, opt.as_bytes());
    builder.append_attr(htb::TCA_HTB_RTAB, rtab_bytes(&rtab));
    builder.append_attr(htb::TCA_HTB_CTAB, rtab_bytes(&ctab));

    if class.rate >= RATE64_THRESHOLD {
        builder.append_attr_u64(htb::TCA_HTB_RATE64, class.rate);
    }
    if class.ceil >= RATE64_THRESHOLD {
        builder.append_attr_u64(htb::TCA_HTB_CEIL64, class.ceil);
    }

    Ok(())
}

fn write_hfsc(builder: &mut MessageBuilder, class: &HfscClass) {
    for (kind, curve) in [
        (hfsc::TCA_HFSC_RSC, &class.rsc),
        (hfsc::TCA_HFSC_FSC, &class.fsc),
        (hfsc::TCA_HFSC_USC, &class.usc),
    ] {
        let wire = TcServiceCurve {
            m1: curve.m1 / 8,
            d: curve.d,
            m2: curve.m2 / 8,
        };
        builder.append_attr(kind, wire.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::attr::NLA_F_NESTED;
    use crate::netlink::class::{ClassAttrs, HtbClassConfig};
    use crate::netlink::message::{NLMSG_HDRLEN, NlMsgHdr};
    use crate::netlink::parse::parse_attrs;
    use crate::tc::handle;
    use zerocopy::FromBytes;

    fn attrs() -> ClassAttrs {
        ClassAttrs::new(3, handle::make(1, 0x10), handle::make(1, 0))
    }

    fn htb(rate_bits: u64) -> Class {
        let cfg = HtbClassConfig::new().rate(rate_bits).build();
        HtbClass::with_clock(attrs(), &cfg, &PschedClock::default()).into()
    }

    /// Split a finished request into header, tcmsg and top-level attributes.
    fn split(msg: &[u8]) -> (NlMsgHdr, TcMsg, Vec<(u16, Vec<u8>)>) {
        let hdr = *NlMsgHdr::from_bytes(msg).unwrap();
        let body = &msg[NLMSG_HDRLEN..];
        let tcmsg = *TcMsg::from_bytes(body).unwrap();
        let attrs = parse_attrs(&body[TcMsg::SIZE..])
            .unwrap()
            .into_iter()
            .map(|(k, v)| (k, v.to_vec()))
            .collect();
        (hdr, tcmsg, attrs)
    }

    #[test]
    fn test_command_flags() {
        assert_eq!(ClassCommand::Add.flags(), 0x0605);
        assert_eq!(ClassCommand::Replace.flags(), 0x0405);
        assert_eq!(ClassCommand::Change.flags(), 0x0005);
        assert_eq!(ClassCommand::Delete.flags(), 0x0005);
        assert_eq!(ClassCommand::Delete.msg_type(), 41);
        assert_eq!(ClassCommand::Change.msg_type(), 40);
    }

    #[test]
    fn test_delete_is_descriptor_only() {
        let msg = encode_class(ClassCommand::Delete, &htb(8_000_000), &PschedClock::default())
            .unwrap()
            .finish();
        assert_eq!(msg.len(), NLMSG_HDRLEN + TcMsg::SIZE);

        let (hdr, tcmsg, attrs) = split(&msg);
        assert_eq!(hdr.nlmsg_type, NlMsgType::RTM_DELTCLASS);
        assert_eq!(tcmsg.tcm_ifindex, 3);
        assert_eq!(tcmsg.tcm_handle, 0x0001_0010);
        assert_eq!(tcmsg.tcm_parent, 0x0001_0000);
        assert!(attrs.is_empty());
    }

    #[test]
    fn test_htb_payload() {
        let msg = encode_class(ClassCommand::Add, &htb(8_000_000), &PschedClock::default())
            .unwrap()
            .finish();
        let (hdr, tcmsg, attrs) = split(&msg);

        assert_eq!(hdr.nlmsg_flags, ClassCommand::Add.flags());
        assert_eq!(tcmsg.tcm_family, 0);
        assert_eq!(attrs[0], (tca::TCA_KIND, b"htb\0".to_vec()));
        assert_eq!(attrs[1].0, tca::TCA_OPTIONS);

        let options = parse_attrs(&attrs[1].1).unwrap();
        let kinds: Vec<u16> = options.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            kinds,
            vec![htb::TCA_HTB_PARMS, htb::TCA_HTB_RTAB, htb::TCA_HTB_CTAB]
        );

        let (opt, _) = TcHtbOpt::read_from_prefix(options[0].1).unwrap();
        assert_eq!(opt.rate.rate, 1_000_000);
        assert_eq!(opt.ceil.rate, 1_000_000);
        assert_eq!(opt.rate.cell_log, 3);
        assert_eq!(opt.rate.cell_align, -1);
        assert_eq!(opt.rate.linklayer, LINKLAYER_ETHERNET);
        assert_eq!(opt.buffer, 25_000);
        assert_eq!(options[1].1.len(), 1024);
        assert_eq!(options[2].1.len(), 1024);
    }

    #[test]
    fn test_options_container_is_nested() {
        let msg = encode_class(ClassCommand::Add, &htb(8_000_000), &PschedClock::default())
            .unwrap()
            .finish();
        // KIND "htb\0" occupies 8 bytes after the tcmsg.
        let at = NLMSG_HDRLEN + TcMsg::SIZE + 8;
        let nla_type = u16::from_ne_bytes([msg[at + 2], msg[at + 3]]);
        assert_eq!(nla_type, tca::TCA_OPTIONS | NLA_F_NESTED);
    }

    #[test]
    fn test_htb_rate64() {
        let mut class = htb(8_000_000);
        if let Class::Htb(h) = &mut class {
            h.rate = (1 << 32) + 1000;
        }
        let msg = encode_class(ClassCommand::Replace, &class, &PschedClock::default())
            .unwrap()
            .finish();
        let (_, _, attrs) = split(&msg);
        let options = parse_attrs(&attrs[1].1).unwrap();

        let (opt, _) = TcHtbOpt::read_from_prefix(options[0].1).unwrap();
        assert_eq!(opt.rate.rate, 1000);

        let rate64 = options
            .iter()
            .find(|(k, _)| *k == htb::TCA_HTB_RATE64)
            .map(|(_, v)| u64::from_ne_bytes(v[..8].try_into().unwrap()));
        assert_eq!(rate64, Some((1 << 32) + 1000));
        assert!(options.iter().all(|(k, _)| *k != htb::TCA_HTB_CEIL64));
    }

    #[test]
    fn test_htb_ceil64() {
        let mut class = htb(8_000_000);
        if let Class::Htb(h) = &mut class {
            h.ceil = (1 << 33) + 7;
        }
        let msg = encode_class(ClassCommand::Add, &class, &PschedClock::default())
            .unwrap()
            .finish();
        let (_, _, attrs) = split(&msg);
        let options = parse_attrs(&attrs[1].1).unwrap();
        let kinds: Vec<u16> = options.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            kinds,
            vec![
                htb::TCA_HTB_PARMS,
                htb::TCA_HTB_RTAB,
                htb::TCA_HTB_CTAB,
                htb::TCA_HTB_CEIL64
            ]
        );

        let (opt, _) = TcHtbOpt::read_from_prefix(options[0].1).unwrap();
        assert_eq!(opt.rate.rate, 1_000_000);
        assert_eq!(opt.ceil.rate, 7);

        let ceil64 = u64::from_ne_bytes(options[3].1[..8].try_into().unwrap());
        assert_eq!(ceil64, (1 << 33) + 7);
    }

    #[test]
    fn test_htb_zero_rate_fails() {
        let class: Class = HtbClass {
            attrs: attrs(),
            ..Default::default()
        }
        .into();
        let err = encode_class(ClassCommand::Add, &class, &PschedClock::default()).unwrap_err();
        assert!(matches!(err, Error::RateTable(_)));
    }

    #[test]
    fn test_hfsc_payload() {
        let mut hfsc = HfscClass::new(attrs());
        hfsc.set_rsc(800_000, 10, 400_000);
        let msg = encode_class(ClassCommand::Add, &hfsc.into(), &PschedClock::default())
            .unwrap()
            .finish();
        let (_, _, attrs) = split(&msg);
        assert_eq!(attrs[0], (tca::TCA_KIND, b"hfsc\0".to_vec()));

        let options = parse_attrs(&attrs[1].1).unwrap();
        assert_eq!(options.len(), 3);
        let (rsc, _) = TcServiceCurve::read_from_prefix(options[0].1).unwrap();
        assert_eq!(options[0].0, hfsc::TCA_HFSC_RSC);
        assert_eq!((rsc.m1, rsc.d, rsc.m2), (100_000, 10, 50_000));
        let (usc, _) = TcServiceCurve::read_from_prefix(options[2].1).unwrap();
        assert_eq!(options[2].0, hfsc::TCA_HFSC_USC);
        assert_eq!((usc.m1, usc.d, usc.m2), (0, 0, 0));
    }

    #[test]
    fn test_generic_payload() {
        let class: Class = GenericClass::new(attrs(), "drr").into();
        let msg = encode_class(ClassCommand::Change, &class, &PschedClock::default())
            .unwrap()
            .finish();
        let (_, _, attrs) = split(&msg);
        assert_eq!(attrs[0], (tca::TCA_KIND, b"drr\0".to_vec()));
        assert_eq!(attrs[1], (tca::TCA_OPTIONS, Vec::new()));
    }

    #[test]
    fn test_generic_with_modeled_kind_rejected() {
        for kind in ["htb", "hfsc"] {
            let class: Class = GenericClass::new(attrs(), kind).into();
            let err = encode_class(ClassCommand::Add, &class, &PschedClock::default()).unwrap_err();
            assert!(matches!(err, Error::UnsupportedVariant { .. }));
        }
    }

    #[test]
    fn test_list_request() {
        let msg = encode_list_request(4, handle::make(1, 0)).finish();
        let (hdr, tcmsg, attrs) = split(&msg);
        assert_eq!(hdr.nlmsg_type, NlMsgType::RTM_GETTCLASS);
        assert_eq!(hdr.nlmsg_flags, NLM_F_REQUEST | NLM_F_DUMP);
        assert_eq!(tcmsg.tcm_ifindex, 4);
        assert_eq!(tcmsg.tcm_parent, 0x0001_0000);
        assert_eq!(tcmsg.tcm_handle, 0);
        assert!(attrs.is_empty());
    }
}
