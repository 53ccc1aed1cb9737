use legman::{Legman, LegmanError, Phase, fields};

use crate::helpers::{drain_now, msg, node_with_hwm};

#[test]
fn final_message_reaches_the_base_before_close() {
    let root = Legman::new();
    let child = root.influx(fields! { "c" => 1 });

    child.end_with("bye").unwrap();
    assert_eq!(child.phase(), Phase::Ended);
    assert!(child.piped_to().is_empty());
    assert_eq!(root.phase(), Phase::Open);

    let r = root.read().unwrap();
    assert_eq!(msg(&r), "bye");
    assert_eq!(r.get("c"), Some(&legman::Value::Int(1)));
}

#[test]
fn writes_between_final_message_and_close_are_rejected() {
    let node = Legman::new();
    node.enqueue_final("last").unwrap();
    assert_eq!(node.phase(), Phase::Ending);
    assert!(matches!(
        node.write("too late"),
        Err(LegmanError::WriteAfterEnd { .. })
    ));

    node.close_after_drain();
    assert_eq!(node.phase(), Phase::Ended);
    assert_eq!(drain_now(&node).len(), 1);
}

#[test]
fn close_waits_for_the_backlog() {
    let node = node_with_hwm(1);
    node.write("a").unwrap();
    node.end_with("b").unwrap();
    // "b" is still in the backlog behind the unread "a"
    assert_eq!(node.phase(), Phase::Ending);

    assert_eq!(msg(&node.read().unwrap()), "a");
    assert_eq!(node.phase(), Phase::Ended);
    assert_eq!(msg(&node.read().unwrap()), "b");
    assert!(node.read().is_none());
}

#[test]
fn end_with_on_an_ended_node_fails_without_side_effects() {
    let node = Legman::new();
    node.end();
    assert!(node.end_with("again").is_err());
    assert_eq!(node.phase(), Phase::Ended);
}

#[tokio::test]
async fn records_stream_ends_after_final_message() {
    use futures::StreamExt;

    let node = Legman::new();
    node.write("one").unwrap();
    node.end_with("two").unwrap();

    let got: Vec<_> = node
        .records()
        .map(|r| msg(&r.unwrap()))
        .collect()
        .await;
    assert_eq!(got, ["one", "two"]);
}
