//! tclass class command implementation.

use std::io::{self, Write};

use anyhow::{Context, anyhow, bail};
use clap::{Args, Subcommand};
use tclass::netlink::class::{
    Class, ClassAttrs, Classes, GenericClass, HfscClass, HtbClass, HtbClassConfig,
};
use tclass::netlink::stats::ClassStatistics;
use tclass::netlink::{Connection, InterfaceRef};
use tclass::tc::{PschedClock, handle};
use tclass::util::{get_rate, get_size, get_time, get_u32, ifname, rate};

use crate::OutputOptions;

#[derive(Args)]
pub struct ClassCmd {
    #[command(subcommand)]
    action: ClassAction,
}

#[derive(Subcommand)]
enum ClassAction {
    /// Show classes.
    #[command(visible_aliases = ["list", "ls"])]
    Show {
        /// Device name.
        dev: String,

        /// Only classes whose parent is exactly this handle (not deeper descendants).
        #[arg(long)]
        parent: Option<String>,

        /// Only the class with this id.
        #[arg(long)]
        classid: Option<String>,
    },

    /// Add a class.
    Add(ClassSpec),

    /// Change an existing class.
    Change(ClassSpec),

    /// Add a class or change it if it exists.
    Replace(ClassSpec),

    /// Delete a class.
    Del {
        /// Device name.
        dev: String,

        /// Parent handle.
        #[arg(long)]
        parent: String,

        /// Class ID to delete.
        #[arg(long)]
        classid: String,
    },
}

#[derive(Args)]
struct ClassSpec {
    /// Device name.
    dev: String,

    /// Parent handle.
    #[arg(long)]
    parent: String,

    /// Class ID.
    #[arg(long)]
    classid: String,

    /// Class type (htb, hfsc, ...).
    #[arg(name = "TYPE")]
    kind: String,

    /// Type-specific parameters, e.g. `rate 1mbit ceil 2mbit` or
    /// `sc m1 800kbit d 10ms m2 400kbit`.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    params: Vec<String>,
}

impl ClassCmd {
    pub async fn run(self, opts: &OutputOptions) -> anyhow::Result<()> {
        let clock = PschedClock::from_system();

        match self.action {
            ClassAction::Show {
                dev,
                parent,
                classid,
            } => {
                let link = InterfaceRef::Name(dev);
                link.resolve()?;
                let parent = parent.as_deref().map(parse_handle).transpose()?;
                let classid = classid.as_deref().map(parse_handle).transpose()?;

                let conn = Connection::new()?;
                let classes = Classes::new(&conn, clock);
                let mut list = classes.list(Some(&link), parent.unwrap_or(0)).await?;
                if let Some(id) = classid {
                    list.retain(|c| c.attrs().handle == id);
                }
                print_classes(&list, opts)
            }
            ClassAction::Add(spec) => {
                let class = spec.build(&clock)?;
                let conn = Connection::new()?;
                Classes::new(&conn, clock).add(&class).await?;
                Ok(())
            }
            ClassAction::Change(spec) => {
                let class = spec.build(&clock)?;
                let conn = Connection::new()?;
                Classes::new(&conn, clock).change(&class).await?;
                Ok(())
            }
            ClassAction::Replace(spec) => {
                let class = spec.build(&clock)?;
                let conn = Connection::new()?;
                Classes::new(&conn, clock).replace(&class).await?;
                Ok(())
            }
            ClassAction::Del {
                dev,
                parent,
                classid,
            } => {
                let attrs = class_attrs(&dev, &parent, &classid)?;
                // The kind is not sent on delete.
                let class: Class = GenericClass::new(attrs, "").into();
                let conn = Connection::new()?;
                Classes::new(&conn, clock).del(&class).await?;
                Ok(())
            }
        }
    }
}

impl ClassSpec {
    fn build(&self, clock: &PschedClock) -> anyhow::Result<Class> {
        let attrs = class_attrs(&self.dev, &self.parent, &self.classid)?;

        match self.kind.as_str() {
            "htb" => build_htb(attrs, &self.params, clock),
            "hfsc" => build_hfsc(attrs, &self.params),
            kind => {
                if !self.params.is_empty() {
                    bail!("{}: class parameters are not supported", kind);
                }
                Ok(GenericClass::new(attrs, kind).into())
            }
        }
    }
}

fn parse_handle(s: &str) -> anyhow::Result<u32> {
    handle::parse(s).ok_or_else(|| anyhow!("invalid handle: {}", s))
}

fn class_attrs(dev: &str, parent: &str, classid: &str) -> anyhow::Result<ClassAttrs> {
    let ifindex = InterfaceRef::name(dev).resolve()?;
    Ok(ClassAttrs::new(
        ifindex as i32,
        parse_handle(classid)?,
        parse_handle(parent)?,
    ))
}

fn value<'a>(params: &mut impl Iterator<Item = &'a String>, key: &str) -> anyhow::Result<&'a str> {
    params
        .next()
        .map(String::as_str)
        .ok_or_else(|| anyhow!("{} requires a value", key))
}

fn build_htb(attrs: ClassAttrs, params: &[String], clock: &PschedClock) -> anyhow::Result<Class> {
    let mut cfg = HtbClassConfig::new();
    let mut params = params.iter();

    while let Some(key) = params.next() {
        let key = key.as_str();
        let val = value(&mut params, key)?;
        cfg = match key {
            "rate" => cfg.rate(get_rate(val).with_context(|| format!("htb {}", key))?),
            "ceil" => cfg.ceil(get_rate(val).with_context(|| format!("htb {}", key))?),
            "burst" | "buffer" | "maxburst" => cfg.buffer(size_u32(val, key)?),
            "cburst" | "cbuffer" | "cmaxburst" => cfg.cbuffer(size_u32(val, key)?),
            "quantum" => cfg.quantum(size_u32(val, key)?),
            "prio" => cfg.prio(get_u32(val).with_context(|| format!("htb {}", key))?),
            _ => bail!("htb: unknown parameter {:?}", key),
        };
    }

    if cfg.rate == 0 {
        bail!("htb: rate is required");
    }

    Ok(HtbClass::with_clock(attrs, &cfg.build(), clock).into())
}

fn size_u32(val: &str, key: &str) -> anyhow::Result<u32> {
    let size = get_size(val).with_context(|| format!("htb {}", key))?;
    u32::try_from(size).map_err(|_| anyhow!("htb {}: {} is too large", key, val))
}

fn build_hfsc(attrs: ClassAttrs, params: &[String]) -> anyhow::Result<Class> {
    let mut hfsc = HfscClass::new(attrs);
    let mut params = params.iter().peekable();

    while let Some(curve) = params.next() {
        let mut m1 = 0;
        let mut d = 0;
        let mut m2 = None;

        while let Some(key) = params.next_if(|k| matches!(k.as_str(), "m1" | "d" | "m2")) {
            let val = value(&mut params, key)?;
            match key.as_str() {
                "m1" => m1 = curve_rate(val)?,
                "d" => d = curve_delay(val)?,
                _ => m2 = Some(curve_rate(val)?),
            }
        }

        let m2 = m2.ok_or_else(|| anyhow!("hfsc {}: m2 is required", curve))?;
        match curve.as_str() {
            "rt" => hfsc.set_rsc(m1, d, m2),
            "ls" => hfsc.set_ls(m1, d, m2),
            "sc" => hfsc.set_sc(m1, d, m2),
            "ul" => hfsc.set_ul(m1, d, m2),
            other => bail!("hfsc: unknown curve {:?}", other),
        };
    }

    if hfsc.rsc.is_zero() && hfsc.fsc.is_zero() {
        bail!("hfsc: at least one of rt, ls or sc is required");
    }

    Ok(hfsc.into())
}

fn curve_rate(val: &str) -> anyhow::Result<u32> {
    let bits = get_rate(val).context("hfsc slope")?;
    u32::try_from(bits).map_err(|_| anyhow!("hfsc slope {} does not fit in 32 bits", val))
}

fn curve_delay(val: &str) -> anyhow::Result<u32> {
    let micros = get_time(val).context("hfsc delay")?.as_micros();
    u32::try_from(micros).map_err(|_| anyhow!("hfsc delay {} is too long", val))
}

fn print_classes(classes: &[Class], opts: &OutputOptions) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();

    if opts.json {
        let json: Vec<_> = classes.iter().map(|c| class_json(c, opts.stats)).collect();
        if opts.pretty {
            serde_json::to_writer_pretty(&mut stdout, &json)?;
        } else {
            serde_json::to_writer(&mut stdout, &json)?;
        }
        writeln!(stdout)?;
        return Ok(());
    }

    for class in classes {
        writeln!(stdout, "{}", class)?;
        if opts.stats
            && let Some(stats) = class.statistics()
        {
            print_stats(&mut stdout, stats)?;
        }
    }

    Ok(())
}

fn print_stats(w: &mut impl Write, stats: &ClassStatistics) -> io::Result<()> {
    writeln!(
        w,
        " Sent {} bytes {} pkt (dropped {}, overlimits {} requeues {})",
        stats.basic.bytes,
        stats.basic.packets,
        stats.queue.drops,
        stats.queue.overlimits,
        stats.queue.requeues
    )?;
    if stats.rate_est.bps != 0 || stats.rate_est.pps != 0 {
        writeln!(
            w,
            " rate {} {}pps",
            rate::format_bytes(stats.rate_est.bps as u64),
            stats.rate_est.pps
        )?;
    }
    writeln!(
        w,
        " backlog {}b {}p requeues {}",
        stats.queue.backlog, stats.queue.qlen, stats.queue.requeues
    )
}

fn class_json(class: &Class, stats: bool) -> serde_json::Value {
    let attrs = class.attrs();
    let mut obj = serde_json::json!({
        "class": class.kind(),
        "handle": handle::format(attrs.handle),
        "parent": handle::format(attrs.parent),
        "dev": ifname::display_name(attrs.link_index as u32),
    });

    match class {
        Class::Htb(htb) => {
            obj["options"] = serde_json::json!({
                "rate": htb.rate,
                "ceil": htb.ceil,
                "burst": htb.buffer,
                "cburst": htb.cbuffer,
                "quantum": htb.quantum,
                "level": htb.level,
                "prio": htb.prio,
            });
        }
        Class::Hfsc(hfsc) => {
            let curve = |sc: &tclass::netlink::ServiceCurve| {
                serde_json::json!({ "m1": sc.m1, "d": sc.d, "m2": sc.m2 })
            };
            obj["options"] = serde_json::json!({
                "rt": curve(&hfsc.rsc),
                "ls": curve(&hfsc.fsc),
                "ul": curve(&hfsc.usc),
            });
        }
        Class::Generic(_) => {}
    }

    if stats && let Some(s) = class.statistics() {
        let mut stats = serde_json::json!({
            "bytes": s.basic.bytes,
            "packets": s.basic.packets,
            "drops": s.queue.drops,
            "overlimits": s.queue.overlimits,
            "requeues": s.queue.requeues,
            "backlog": s.queue.backlog,
            "qlen": s.queue.qlen,
            "bps": s.rate_est.bps,
            "pps": s.rate_est.pps,
        });
        if let Some(hw) = &s.basic_hw {
            stats["hw_bytes"] = hw.bytes.into();
            stats["hw_packets"] = hw.packets.into();
        }
        obj["stats"] = stats;
    }

    obj
}
