use legman::{Legman, Record, Value, fields};

use crate::helpers::{Sink, drain_now, msg};

fn is_error(r: &Record) -> bool {
    r.get_str("loglevel") == Some("error")
}

#[test]
fn filter_forwards_only_matching_records() {
    let root = Legman::with_defaults(fields! { "app" => "api" });
    let errors = root.filter(is_error);

    root.write("fine").unwrap();
    root.write(legman::ErrorMessage::new("Error", "bad")).unwrap();
    root.write("also fine").unwrap();

    let out = drain_now(&errors);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].get_str("msg"), Some("bad"));
    assert_eq!(out[0].get_str("app"), Some("api"));
    assert_eq!(errors.defaults(), None);
}

#[test]
fn filter_does_not_renormalize() {
    let root = Legman::new();
    let passthrough = root.filter(|_| true);

    root.write("x").unwrap();
    let from_root_ts = passthrough.read().unwrap().timestamp();
    assert!(from_root_ts.is_some());

    // raw input written straight into a filter node is only coerced
    passthrough.write("direct").unwrap();
    let direct = passthrough.read().unwrap();
    assert_eq!(direct.get_str("loglevel"), Some("log"));
    assert!(direct.timestamp().is_none());
}

#[test]
fn map_replaces_each_record() {
    let root = Legman::new();
    let upper = root.map(|r| {
        let text = r.get_str("msg").unwrap_or_default().to_uppercase();
        Record::new().with("msg", text)
    });

    root.write("quiet").unwrap();
    let r = upper.read().unwrap();
    assert_eq!(r.fields(), &fields! { "msg" => "QUIET" });
}

#[test]
fn derived_nodes_compose_further() {
    let root = Legman::new();
    let chain = root
        .map(|r| r.with("seen", true))
        .filter(|r| r.get_str("msg") != Some("skip"))
        .map(|mut r| {
            r.remove("loglevel");
            r
        });

    for m in ["a", "skip", "b"] {
        root.write(m).unwrap();
    }
    let out = drain_now(&chain);
    assert_eq!(out.iter().map(msg).collect::<Vec<_>>(), ["a", "b"]);
    assert!(out.iter().all(|r| r.get("seen") == Some(&Value::Bool(true))));
    assert!(out.iter().all(|r| !r.contains_key("loglevel")));
}

#[test]
fn one_source_broadcasts_to_every_pipe() {
    let root = Legman::new();
    let left = root.filter(|_| true);
    let right = root.map(|r| r.with("side", "right"));
    let tap = Sink::attach(&root);

    root.write("both").unwrap();
    assert_eq!(drain_now(&left).len(), 1);
    assert_eq!(right.read().unwrap().get_str("side"), Some("right"));
    assert_eq!(tap.msgs(), ["both"]);
}

#[test]
fn influx_into_a_filter_node() {
    let root = Legman::new();
    let warnings = root.filter(|r| r.get_str("level") == Some("warn"));
    let feeder = warnings.influx(fields! { "level" => "warn" });
    assert_eq!(feeder.defaults(), Some(&fields! { "level" => "warn" }));

    feeder.write("disk almost full").unwrap();
    assert_eq!(msg(&warnings.read().unwrap()), "disk almost full");
}

#[test]
fn pipe_is_not_duplicated_and_can_be_removed() {
    let a = Legman::new();
    let b = Legman::new();
    a.pipe(&b);
    a.pipe(&b);
    a.pipe(&a);
    assert_eq!(a.piped_to(), [b.id()]);

    a.write("once").unwrap();
    assert_eq!(drain_now(&b).len(), 1);

    assert_eq!(a.unpipe(Some(&b)), 1);
    assert!(!a.is_flowing());
    a.write("kept").unwrap();
    assert!(b.read().is_none());
    assert_eq!(msg(&a.read().unwrap()), "kept");
}
