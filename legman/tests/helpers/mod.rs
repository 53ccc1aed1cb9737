#![allow(dead_code)]

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use legman::{Legman, Record};

/// Records seen by a data listener, in arrival order.
#[derive(Clone, Default)]
pub struct Sink(Arc<Mutex<Vec<Record>>>);

impl Sink {
    pub fn attach(node: &Legman) -> Self {
        let sink = Self::default();
        let inner = Arc::clone(&sink.0);
        node.on_data(move |r| inner.lock().unwrap().push(r));
        sink
    }

    pub fn records(&self) -> Vec<Record> {
        self.0.lock().unwrap().clone()
    }

    pub fn msgs(&self) -> Vec<String> {
        self.records().iter().map(msg).collect()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

/// Shared counter bumped from callbacks.
#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Read everything currently readable without waiting.
pub fn drain_now(node: &Legman) -> Vec<Record> {
    std::iter::from_fn(|| node.read()).collect()
}

/// The `msg` field as text, or an empty string.
pub fn msg(r: &Record) -> String {
    r.get_str("msg").unwrap_or_default().to_string()
}

pub fn node_with_hwm(hwm: usize) -> Legman {
    Legman::builder().high_water_mark(hwm).build().unwrap()
}

#[derive(Debug)]
pub struct Rejected(pub &'static str);

impl fmt::Display for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rejected {}", self.0)
    }
}

impl std::error::Error for Rejected {}
