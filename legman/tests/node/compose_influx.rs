use chrono::{TimeZone, Utc};
use legman::{InfluxMode, Legman, Record, fields};

use crate::helpers::{drain_now, msg, node_with_hwm};

#[test]
fn influx_records_reach_base_with_merged_defaults() {
    let root = Legman::with_defaults(fields! { "app" => "api", "env" => "prod" });
    let http = root.influx(fields! { "component" => "http", "env" => "dev" });
    assert_eq!(
        http.defaults(),
        Some(&fields! { "component" => "http", "env" => "dev" })
    );

    http.write("listening").unwrap();
    let r = root.read().expect("forwarded to base");
    assert_eq!(r.get_str("msg"), Some("listening"));
    assert_eq!(r.get_str("component"), Some("http"));
    assert_eq!(r.get_str("env"), Some("dev"));
    assert_eq!(r.get_str("app"), Some("api"));
    assert_eq!(http.buffered_len(), 0);
}

#[test]
fn influx_node_carries_only_its_own_defaults() {
    let root = Legman::with_defaults(fields! { "app" => "api" });
    let child = root.influx_with_mode(fields! { "sub" => 1 }, InfluxMode::Unbounded);
    assert_eq!(child.defaults(), Some(&fields! { "sub" => 1 }));

    let tap = child.filter(|_| true);
    child.write("direct").unwrap();

    let seen = tap.read().expect("piped from the child");
    assert_eq!(
        seen.fields(),
        &fields! { "loglevel" => "log", "msg" => "direct", "sub" => 1 }
    );
    let at_base = root.read().expect("forwarded to base");
    assert_eq!(at_base.get_str("app"), Some("api"));
    assert_eq!(at_base.get("sub"), Some(&legman::Value::Int(1)));
}

#[test]
fn influx_defaults_do_not_leak_into_base_writes() {
    let root = Legman::with_defaults(fields! { "app" => "api" });
    let _db = root.influx(fields! { "component" => "db" });

    root.write("direct").unwrap();
    let r = root.read().unwrap();
    assert!(!r.contains_key("component"));
}

#[test]
fn timestamp_set_by_influx_survives_the_base() {
    let ts = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
    let root = Legman::new();
    let child = root.influx(fields! { "c" => 1 });

    child.write(Record::new().with("msg", "x").with_timestamp(ts))
        .unwrap();
    assert_eq!(root.read().unwrap().timestamp(), Some(ts));
}

#[test]
fn nested_influx_accumulates_defaults() {
    let root = Legman::with_defaults(fields! { "a" => 1 });
    let mid = root.influx(fields! { "b" => 2 });
    let leaf = mid.influx(fields! { "c" => 3 });

    leaf.write("deep").unwrap();
    let r = root.read().unwrap();
    assert_eq!(
        r.fields(),
        &fields! { "a" => 1, "b" => 2, "c" => 3, "loglevel" => "log", "msg" => "deep" }
    );
}

#[test]
fn several_influx_nodes_merge_into_one_base() {
    let root = Legman::new();
    let a = root.influx(fields! { "src" => "a" });
    let b = root.influx(fields! { "src" => "b" });

    a.write("1").unwrap();
    b.write("2").unwrap();
    a.write("3").unwrap();

    let got: Vec<_> = drain_now(&root)
        .iter()
        .map(|r| format!("{}{}", r.get_str("src").unwrap(), msg(r)))
        .collect();
    assert_eq!(got, ["a1", "b2", "a3"]);
}

#[test]
fn influx_inherits_configuration() {
    let root = node_with_hwm(3);
    let child = root.influx(fields! {});
    assert_eq!(child.config().high_water_mark, 3);
}

#[test]
fn strict_influx_stalls_when_base_is_not_consumed() {
    let root = node_with_hwm(2);
    let child = root.influx(fields! {});

    // base holds 2 readable + 2 backlog, the paused child another 2 + 2
    let mut accepted = 0;
    while child.write(format!("m{accepted}")).unwrap() {
        accepted += 1;
        assert!(accepted < 100, "influx never signaled back-pressure");
    }
    assert_eq!(accepted, 7);
    assert!(child.is_backpressured());
    assert_eq!(root.buffered_len(), 4);
    assert_eq!(child.buffered_len(), 4);
}

#[test]
fn consuming_the_base_resumes_a_paused_influx() {
    let root = node_with_hwm(2);
    let child = root.influx(fields! {});
    for i in 0..8 {
        child.write(format!("m{i}")).unwrap();
    }

    let msgs: Vec<_> = drain_now(&root).iter().map(msg).collect();
    let expected: Vec<_> = (0..8).map(|i| format!("m{i}")).collect();
    assert_eq!(msgs, expected);
    assert_eq!(child.buffered_len(), 0);
    assert!(!child.is_backpressured());
}

#[test]
fn unbounded_influx_never_stalls() {
    let root = node_with_hwm(2);
    let child = root.influx_with_mode(fields! { "sloppy" => true }, InfluxMode::Unbounded);

    for i in 0..50 {
        assert!(child.write(format!("m{i}")).unwrap());
    }
    assert_eq!(child.buffered_len(), 0);
    assert_eq!(root.buffered_len(), 50);
    assert!(root.is_backpressured());

    let first = root.read().unwrap();
    assert_eq!(first.get("sloppy").and_then(legman::Value::as_bool), Some(true));
}
