mod common;
use common::*;
use std::cell::RefCell;
use std::rc::Rc;
use tinybasic::mach::{Device, MemoryDevice, Runtime, Stream};

/// A store the test can still look into after handing it to the runtime.
#[derive(Clone, Default)]
struct SharedDevice {
    bytes: Rc<RefCell<Vec<u8>>>,
    pos: usize,
}

impl Device for SharedDevice {
    fn begin_read(&mut self) {
        self.pos = 0;
    }

    fn begin_write(&mut self) {
        self.bytes.borrow_mut().clear();
    }

    fn read(&mut self) -> Option<u8> {
        let b = self.bytes.borrow().get(self.pos).copied()?;
        self.pos += 1;
        Some(b)
    }

    fn write(&mut self, ch: u8) {
        self.bytes.borrow_mut().push(ch);
    }
}

#[test]
fn test_esave_format() {
    let mut r = Runtime::default();
    let store = SharedDevice::default();
    r.attach(Stream::Store, Box::new(store.clone()));
    let out = program(&mut r, &["20 a=1", r#"10 print "HI""#, "esave"]);
    assert_eq!(out, "");
    assert_eq!(&*store.bytes.borrow(), b"10 PRINT \"HI\"\n20 A=1\n\0");
}

#[test]
fn test_esave_eload() {
    let mut r = Runtime::default();
    r.attach(Stream::Store, Box::new(MemoryDevice::new()));
    let out = program(&mut r, &["10 ?\"HI\"", "20 a=1", "esave", "new", "list"]);
    assert_eq!(out, "");
    let out = program(&mut r, &["eload", "list"]);
    assert_eq!(out, "10 ?\"HI\"\n20 A=1\n");
}

#[test]
fn test_load_clears_variables() {
    let mut r = Runtime::default();
    r.attach(Stream::File, Box::new(MemoryDevice::from_bytes(b"10 ?A\n")));
    let out = program(&mut r, &["a=5", "load", "run"]);
    assert_eq!(out, "0\n");
}

#[test]
fn test_chain_runs() {
    let mut r = Runtime::default();
    r.attach(
        Stream::File,
        Box::new(MemoryDevice::from_bytes(b"10 ?1\r\n20 ?2\r\n")),
    );
    assert_eq!(program(&mut r, &["chain"]), "1\n2\n");
}

#[test]
fn test_echain_stops_at_nul() {
    let mut r = Runtime::default();
    r.attach(
        Stream::Store,
        Box::new(MemoryDevice::from_bytes(b"10 ?7\n\x0020 ?8\n")),
    );
    assert_eq!(program(&mut r, &["echain"]), "7\n");
    assert_eq!(program(&mut r, &["list"]), "10 ?7\n");
}

#[test]
fn test_loaded_direct_lines_run_quietly() {
    let mut r = Runtime::default();
    r.attach(
        Stream::File,
        Box::new(MemoryDevice::from_bytes(b"a=4\n?a\n10 ?a*2\n")),
    );
    assert_eq!(program(&mut r, &["load"]), "");
    assert_eq!(program(&mut r, &["run"]), "8\n");
}

#[test]
fn test_missing_device() {
    let mut r = Runtime::default();
    assert_eq!(program(&mut r, &["save"]), "DEVICE UNAVAILABLE\n");
    assert_eq!(program(&mut r, &["eload"]), "DEVICE UNAVAILABLE\n");
    r.attach(Stream::File, Box::new(MemoryDevice::new()));
    assert!(r.detach(Stream::File).is_some());
    assert_eq!(program(&mut r, &["load"]), "DEVICE UNAVAILABLE\n");
}

#[test]
fn test_load_error_is_reported() {
    let mut r = Runtime::default();
    r.attach(
        Stream::File,
        Box::new(MemoryDevice::from_bytes(b"10 ?1\n0 ?2\n20 ?3\n")),
    );
    let out = program(&mut r, &["load"]);
    assert_eq!(out, "SYNTAX ERROR; INVALID LINE NUMBER\n");
    assert_eq!(program(&mut r, &["list"]), "10 ?1\n20 ?3\n");
}
