//! Class add/change/replace/del/list against a live kernel.

use tclass::netlink::class::{Class, ClassAttrs, HfscClass, HtbClass, HtbClassConfig};
use tclass::netlink::{Connection, InterfaceRef};
use tclass::tc::handle;
use tclass::Result;

use crate::common::TestNamespace;

/// Namespace with `dummy0` up and a root qdisc `1:` of `qdisc_kind`.
fn setup(name: &str, qdisc_kind: &str) -> Result<(TestNamespace, Connection, InterfaceRef)> {
    let ns = TestNamespace::new(name)?;
    let link = ns.add_dummy("dummy0")?;
    ns.add_root_qdisc("dummy0", qdisc_kind)?;
    let conn = ns.connection()?;
    Ok((ns, conn, link))
}

fn attrs(link: &InterfaceRef, minor: u16) -> Result<ClassAttrs> {
    Ok(ClassAttrs::new(
        link.resolve()? as i32,
        handle::make(1, minor),
        handle::make(1, 0),
    ))
}

fn htb(conn: &Connection, attrs: ClassAttrs, rate: u64, prio: u32) -> Class {
    let cfg = HtbClassConfig::new().rate(rate).prio(prio).build();
    HtbClass::with_clock(attrs, &cfg, conn.classes().clock()).into()
}

async fn find(conn: &Connection, link: &InterfaceRef, minor: u16) -> Result<Option<Class>> {
    let classes = conn.classes().list(Some(link), 0).await?;
    Ok(classes
        .into_iter()
        .find(|c| c.attrs().handle == handle::make(1, minor)))
}

#[tokio::test]
async fn test_htb_add_and_list() -> Result<()> {
    require_root!();

    let (_ns, conn, link) = setup("htbadd", "htb")?;
    let class = htb(&conn, attrs(&link, 0x10)?, 8_000_000, 1);
    conn.classes().add(&class).await?;

    let found = find(&conn, &link, 0x10).await?.expect("class 1:10 should exist");
    let htb = found.as_htb().expect("htb class");
    assert_eq!(htb.rate, 1_000_000);
    assert_eq!(htb.ceil, 1_000_000);
    assert_eq!(htb.prio, 1);
    // HTB reports top-level classes as children of the root.
    assert_eq!(found.attrs().parent, handle::ROOT);
    assert!(found.statistics().is_some());

    Ok(())
}

#[tokio::test]
async fn test_htb_add_twice_fails() -> Result<()> {
    require_root!();

    let (_ns, conn, link) = setup("htbexcl", "htb")?;
    let class = htb(&conn, attrs(&link, 0x10)?, 8_000_000, 0);
    conn.classes().add(&class).await?;

    let err = conn.classes().add(&class).await.unwrap_err();
    assert!(err.is_already_exists(), "unexpected error: {}", err);

    Ok(())
}

#[tokio::test]
async fn test_htb_change_and_replace() -> Result<()> {
    require_root!();

    let (_ns, conn, link) = setup("htbchg", "htb")?;
    conn.classes()
        .add(&htb(&conn, attrs(&link, 0x10)?, 8_000_000, 0))
        .await?;

    conn.classes()
        .change(&htb(&conn, attrs(&link, 0x10)?, 16_000_000, 2))
        .await?;
    let found = find(&conn, &link, 0x10).await?.expect("class 1:10");
    assert_eq!(found.as_htb().map(|h| (h.rate, h.prio)), Some((2_000_000, 2)));

    // Replace creates when missing and updates when present.
    conn.classes()
        .replace(&htb(&conn, attrs(&link, 0x20)?, 4_000_000, 0))
        .await?;
    conn.classes()
        .replace(&htb(&conn, attrs(&link, 0x20)?, 2_000_000, 0))
        .await?;
    let found = find(&conn, &link, 0x20).await?.expect("class 1:20");
    assert_eq!(found.as_htb().map(|h| h.rate), Some(250_000));

    Ok(())
}

#[tokio::test]
async fn test_htb_rate64() -> Result<()> {
    require_root!();

    let (_ns, conn, link) = setup("htb64", "htb")?;
    let rate_bits = ((1u64 << 32) + 1000) * 8;
    conn.classes()
        .add(&htb(&conn, attrs(&link, 0x10)?, rate_bits, 0))
        .await?;

    let found = find(&conn, &link, 0x10).await?.expect("class 1:10");
    assert_eq!(found.as_htb().map(|h| h.rate), Some((1 << 32) + 1000));

    Ok(())
}

#[tokio::test]
async fn test_htb_delete() -> Result<()> {
    require_root!();

    let (_ns, conn, link) = setup("htbdel", "htb")?;
    let class = htb(&conn, attrs(&link, 0x10)?, 8_000_000, 0);
    conn.classes().add(&class).await?;
    conn.classes().del(&class).await?;
    assert!(find(&conn, &link, 0x10).await?.is_none());

    let err = conn.classes().del(&class).await.unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {}", err);

    Ok(())
}

#[tokio::test]
async fn test_hfsc_add_and_list() -> Result<()> {
    require_root!();

    let (_ns, conn, link) = setup("hfsc", "hfsc")?;
    let mut hfsc = HfscClass::new(attrs(&link, 0x1)?);
    hfsc.set_sc(800_000, 10, 400_000);
    conn.classes().add(&hfsc.into()).await?;

    let found = find(&conn, &link, 0x1).await?.expect("class 1:1");
    let hfsc = found.as_hfsc().expect("hfsc class");
    assert!(!hfsc.rsc.is_zero());
    assert!(!hfsc.fsc.is_zero());
    assert!(hfsc.usc.is_zero());

    Ok(())
}

#[tokio::test]
async fn test_list_parent_filter() -> Result<()> {
    require_root!();

    let (_ns, conn, link) = setup("filter", "htb")?;
    conn.classes()
        .add(&htb(&conn, attrs(&link, 0x1)?, 16_000_000, 0))
        .await?;
    let child = ClassAttrs::new(link.resolve()? as i32, handle::make(1, 0x10), handle::make(1, 1));
    conn.classes().add(&htb(&conn, child, 8_000_000, 0)).await?;

    let all = conn.classes().list(Some(&link), 0).await?;
    assert_eq!(all.len(), 2);

    let under_1_1 = conn.classes().list(Some(&link), handle::make(1, 1)).await?;
    assert_eq!(under_1_1.len(), 1);
    assert_eq!(under_1_1[0].attrs().handle, handle::make(1, 0x10));

    Ok(())
}

#[tokio::test]
async fn test_list_empty() -> Result<()> {
    require_root!();

    let (_ns, conn, link) = setup("empty", "htb")?;
    assert!(conn.classes().list(Some(&link), 0).await?.is_empty());

    Ok(())
}
