//! Scripted stand-in for the native engine.
//!
//! `run` blocks like the real capture loop and replays scripted records
//! through the registered dispatcher with raw C pointers, until it meets an
//! `Exit` entry or is interrupted. Like the native stop functions,
//! `interrupt` only reaches a loop that is currently inside `run`.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::capture::dispatch::{RawPacketRecord, RecordDispatcher};
use crate::capture::engine::{CaptureEngine, InterfaceList};
use crate::capture::session::CaptureKind;
use crate::error::{CaptureError, Result};

pub(crate) struct ScriptedPacket {
    pub src_mac: &'static str,
    pub dest_mac: &'static str,
    pub eth_type: &'static str,
    pub src_ipv4: &'static str,
    pub dest_ipv4: &'static str,
    pub src_ipv6: &'static str,
    pub dest_ipv6: &'static str,
    pub src_port: c_int,
    pub dest_port: c_int,
    pub payload: Vec<u8>,
}

impl ScriptedPacket {
    pub fn tcp(payload: Vec<u8>) -> Self {
        Self {
            src_mac: "aa:bb:cc:dd:ee:ff",
            dest_mac: "11:22:33:44:55:66",
            eth_type: "IPv4 TCP",
            src_ipv4: "192.168.1.10",
            dest_ipv4: "93.184.216.34",
            src_ipv6: "",
            dest_ipv6: "",
            src_port: 51000,
            dest_port: 443,
            payload,
        }
    }
}

pub(crate) enum Script {
    Beacon {
        ssid: Vec<u8>,
        bssid: &'static str,
        channel: c_int,
        frequency: c_int,
        signal_strength: c_int,
    },
    Packet(ScriptedPacket),
    Exit(c_int),
}

impl Script {
    pub fn beacon(ssid: &str, bssid: &'static str, channel: c_int, frequency: c_int, signal: c_int) -> Self {
        Script::Beacon {
            ssid: ssid.as_bytes().to_vec(),
            bssid,
            channel,
            frequency,
            signal_strength: signal,
        }
    }
}

#[derive(Default)]
struct LaneState {
    /// A `run` call is in progress
    active: bool,
    /// `open` blocks while set
    held: bool,
    /// An `open` call is parked on the hold
    parked: bool,
    /// Interrupts still to be swallowed
    lost_interrupts: usize,
}

struct Lane {
    sender: Mutex<Sender<Script>>,
    receiver: Mutex<Receiver<Script>>,
    dispatcher: Mutex<Option<Arc<RecordDispatcher>>>,
    interfaces: Mutex<Vec<String>>,
    runs: AtomicUsize,
    state: Mutex<LaneState>,
    changed: Condvar,
}

impl Lane {
    fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender: Mutex::new(sender),
            receiver: Mutex::new(receiver),
            dispatcher: Mutex::new(None),
            interfaces: Mutex::new(Vec::new()),
            runs: AtomicUsize::new(0),
            state: Mutex::new(LaneState::default()),
            changed: Condvar::new(),
        }
    }

    fn update(&self, f: impl FnOnce(&mut LaneState)) {
        let mut state = self.state.lock().unwrap();
        f(&mut *state);
        drop(state);
        self.changed.notify_all();
    }

    fn wait_until(&self, timeout: Duration, done: impl Fn(&LaneState) -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock().unwrap();
        while !done(&*state) {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            state = self.changed.wait_timeout(state, deadline - now).unwrap().0;
        }
        true
    }
}

pub(crate) struct ScriptedEngine {
    beacon: Lane,
    packet: Lane,
    all_interfaces: std::result::Result<Vec<String>, c_int>,
    monitor_interfaces: std::result::Result<Vec<String>, c_int>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::with_interfaces(
            Ok(vec!["eth0".to_string(), "wlan0".to_string(), "lo".to_string()]),
            Ok(vec!["wlan0".to_string()]),
        )
    }

    pub fn with_interfaces(
        all: std::result::Result<Vec<String>, c_int>,
        monitor: std::result::Result<Vec<String>, c_int>,
    ) -> Self {
        Self {
            beacon: Lane::new(),
            packet: Lane::new(),
            all_interfaces: all,
            monitor_interfaces: monitor,
        }
    }

    /// Queues an entry for the next (or current) run of `kind`.
    pub fn push(&self, kind: CaptureKind, script: Script) {
        let sender = self.lane(kind).sender.lock().unwrap();
        sender.send(script).unwrap();
    }

    /// Interfaces passed to `run` so far, in call order.
    pub fn interfaces_run(&self, kind: CaptureKind) -> Vec<String> {
        self.lane(kind).interfaces.lock().unwrap().clone()
    }

    pub fn runs(&self, kind: CaptureKind) -> usize {
        self.lane(kind).runs.load(Ordering::SeqCst)
    }

    pub fn is_open(&self, kind: CaptureKind) -> bool {
        self.lane(kind).dispatcher.lock().unwrap().is_some()
    }

    /// Makes the next `open` of `kind` block until [`Self::release`].
    pub fn hold(&self, kind: CaptureKind) {
        self.lane(kind).update(|state| state.held = true);
    }

    pub fn release(&self, kind: CaptureKind) {
        self.lane(kind).update(|state| state.held = false);
    }

    /// Waits until an `open` of `kind` is parked on the hold.
    pub fn wait_parked(&self, kind: CaptureKind, timeout: Duration) -> bool {
        self.lane(kind).wait_until(timeout, |state| state.parked)
    }

    /// Waits until `kind`'s loop is inside `run`.
    pub fn wait_running(&self, kind: CaptureKind, timeout: Duration) -> bool {
        self.lane(kind).wait_until(timeout, |state| state.active)
    }

    /// Swallows the next `count` interrupts of `kind`, as when a stop
    /// reaches the engine before its loop is armed.
    pub fn lose_interrupts(&self, kind: CaptureKind, count: usize) {
        self.lane(kind).update(|state| state.lost_interrupts = count);
    }

    fn lane(&self, kind: CaptureKind) -> &Lane {
        match kind {
            CaptureKind::Beacon => &self.beacon,
            CaptureKind::Packet => &self.packet,
        }
    }

    fn replay(&self, kind: CaptureKind, script: Script) {
        let Some(dispatcher) = self.lane(kind).dispatcher.lock().unwrap().clone() else {
            return;
        };

        match script {
            Script::Beacon {
                ssid,
                bssid,
                channel,
                frequency,
                signal_strength,
            } => {
                let ssid = CString::new(ssid).unwrap();
                let bssid = CString::new(bssid).unwrap();
                unsafe {
                    dispatcher.beacon_record(
                        ssid.as_ptr(),
                        bssid.as_ptr(),
                        channel,
                        frequency,
                        signal_strength,
                    )
                };
            }
            Script::Packet(packet) => {
                let fields: Vec<CString> = [
                    packet.src_mac,
                    packet.dest_mac,
                    packet.eth_type,
                    packet.src_ipv4,
                    packet.dest_ipv4,
                    packet.src_ipv6,
                    packet.dest_ipv6,
                ]
                .iter()
                .map(|f| CString::new(*f).unwrap())
                .collect();
                let payload = if packet.payload.is_empty() {
                    ptr::null()
                } else {
                    packet.payload.as_ptr()
                };

                let record = RawPacketRecord {
                    src_mac: fields[0].as_ptr(),
                    dest_mac: fields[1].as_ptr(),
                    eth_type: fields[2].as_ptr(),
                    src_ipv4: fields[3].as_ptr(),
                    dest_ipv4: fields[4].as_ptr(),
                    src_ipv6: fields[5].as_ptr(),
                    dest_ipv6: fields[6].as_ptr(),
                    src_port: packet.src_port,
                    dest_port: packet.dest_port,
                    payload,
                    payload_length: packet.payload.len() as c_int,
                };
                unsafe { dispatcher.packet_record(record) };
            }
            Script::Exit(_) => {}
        }
    }
}

impl CaptureEngine for ScriptedEngine {
    fn interfaces(&self, monitor_only: bool) -> Result<InterfaceList> {
        let names = if monitor_only {
            &self.monitor_interfaces
        } else {
            &self.all_interfaces
        };
        let names = names
            .as_ref()
            .map_err(|&code| CaptureError::InterfaceEnumeration { code })?;

        if names.is_empty() {
            return Ok(unsafe { InterfaceList::from_raw(ptr::null_mut(), 0, release_names) });
        }

        let raw: Box<[*mut c_char]> = names
            .iter()
            .map(|n| CString::new(n.as_str()).unwrap().into_raw())
            .collect();
        let count = raw.len() as c_int;
        let items = Box::into_raw(raw) as *mut *mut c_char;
        Ok(unsafe { InterfaceList::from_raw(items, count, release_names) })
    }

    fn open(&self, kind: CaptureKind, dispatcher: Arc<RecordDispatcher>) {
        let lane = self.lane(kind);
        {
            let mut state = lane.state.lock().unwrap();
            if state.held {
                state.parked = true;
                lane.changed.notify_all();
                while state.held {
                    state = lane.changed.wait(state).unwrap();
                }
                state.parked = false;
            }
        }
        *lane.dispatcher.lock().unwrap() = Some(dispatcher);
    }

    fn run(&self, kind: CaptureKind, interface: &CStr) -> c_int {
        let lane = self.lane(kind);
        lane.interfaces
            .lock()
            .unwrap()
            .push(interface.to_string_lossy().into_owned());
        lane.runs.fetch_add(1, Ordering::SeqCst);
        lane.update(|state| state.active = true);

        let code = {
            let receiver = lane.receiver.lock().unwrap();
            loop {
                match receiver.recv() {
                    Ok(Script::Exit(code)) => break code,
                    Ok(script) => self.replay(kind, script),
                    Err(_) => break -1,
                }
            }
        };

        lane.update(|state| state.active = false);
        code
    }

    fn interrupt(&self, kind: CaptureKind) {
        let lane = self.lane(kind);
        let mut state = lane.state.lock().unwrap();
        if state.lost_interrupts > 0 {
            state.lost_interrupts -= 1;
            return;
        }
        if state.active {
            lane.sender.lock().unwrap().send(Script::Exit(0)).unwrap();
        }
    }

    fn close(&self, kind: CaptureKind) {
        self.lane(kind).dispatcher.lock().unwrap().take();
    }
}

unsafe extern "C" fn release_names(items: *mut *mut c_char, count: c_int) -> c_int {
    let raw = Box::from_raw(std::slice::from_raw_parts_mut(items, count as usize));
    for item in raw.iter() {
        drop(CString::from_raw(*item));
    }
    0
}
