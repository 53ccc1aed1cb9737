use futures::StreamExt;
use legman::{Legman, Record};

use crate::helpers::{Rejected, msg};

fn fragile() -> Legman {
    Legman::new().try_map(|r: Record| {
        if r.get_str("msg") == Some("boom") {
            Err(Rejected("boom"))
        } else {
            Ok(r)
        }
    })
}

#[tokio::test]
async fn recv_returns_buffered_records_then_the_failure() {
    let node = fragile();
    node.write("fine").unwrap();
    node.write("boom").unwrap();

    assert_eq!(msg(&node.recv().await.unwrap().unwrap()), "fine");
    let err = node.recv().await.unwrap_err();
    assert!(err.is_transform_failure());
}

#[tokio::test]
async fn records_stream_yields_the_failure_once() {
    let node = fragile();
    node.write("fine").unwrap();
    node.write("boom").unwrap();

    let items: Vec<_> = node.records().collect().await;
    assert_eq!(items.len(), 2);
    assert!(items[0].is_ok());
    assert!(items[1].is_err());
}

#[tokio::test]
async fn failure_wakes_a_waiting_reader() {
    let node = fragile();
    let reader = node.clone();
    let waiting = tokio::spawn(async move { reader.recv().await });

    tokio::task::yield_now().await;
    node.write("boom").unwrap();
    assert!(waiting.await.unwrap().is_err());
}
