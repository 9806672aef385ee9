use crate::audio::engine::{
    AmbientSoundEngine, AudioHost, Destination, FilterSpec, GainEvent, NodeId, NoiseBufferSpec,
    OscillatorSpec, automation_value,
};
use crate::foundation::core::TimeMs;
use crate::foundation::error::{TenebraError, TenebraResult};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// One call made against a [`RecordingEngine`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum GraphOp {
    /// Engine opened.
    Open,
    /// Tone generator created.
    Oscillator {
        /// New node.
        node: NodeId,
        /// Parameters.
        spec: OscillatorSpec,
    },
    /// Noise buffer created.
    NoiseBuffer {
        /// New node.
        node: NodeId,
        /// Parameters.
        spec: NoiseBufferSpec,
    },
    /// Filter created.
    Filter {
        /// New node.
        node: NodeId,
        /// Parameters.
        spec: FilterSpec,
    },
    /// Gain node created.
    Gain {
        /// New node.
        node: NodeId,
        /// Base level.
        level: f32,
    },
    /// Route added.
    Connect {
        /// Source node.
        from: NodeId,
        /// Target.
        to: Destination,
    },
    /// Automation events appended.
    Automate {
        /// Gain node.
        node: NodeId,
        /// Events as given.
        events: Vec<GainEvent>,
    },
    /// Automation cancelled from a time on.
    CancelAutomation {
        /// Gain node.
        node: NodeId,
        /// Cancellation point.
        from: TimeMs,
    },
    /// Source started.
    Start {
        /// Source node.
        node: NodeId,
        /// Start time.
        at: TimeMs,
    },
    /// Source stopped.
    Stop {
        /// Source node.
        node: NodeId,
        /// Stop time.
        at: TimeMs,
    },
    /// Node released.
    Release {
        /// Released node.
        node: NodeId,
    },
    /// Engine closed.
    Close,
}

/// A [`GraphOp`] stamped with the engine time it was issued at.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OpRecord {
    /// Latest time passed to `advance` before the call.
    pub issued_at: TimeMs,
    /// Session index (0 for the first engine the host opened).
    pub session: u32,
    /// The call.
    #[serde(flatten)]
    pub op: GraphOp,
}

/// Shared op log. Clones see the same records.
#[derive(Clone, Debug, Default)]
pub struct OpLog {
    records: Rc<RefCell<Vec<OpRecord>>>,
}

impl OpLog {
    /// Copy of all records.
    pub fn records(&self) -> Vec<OpRecord> {
        self.records.borrow().clone()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    /// True if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    /// Records matching `pred`.
    pub fn filter(&self, pred: impl Fn(&OpRecord) -> bool) -> Vec<OpRecord> {
        self.records
            .borrow()
            .iter()
            .filter(|r| pred(r))
            .cloned()
            .collect()
    }

    fn push(&self, rec: OpRecord) {
        self.records.borrow_mut().push(rec);
    }
}

/// Options for [`RecordingHost`].
#[derive(Clone, Copy, Debug, Default)]
pub struct RecordingOpts {
    /// Refuse to open engines.
    pub unavailable: bool,
    /// Every noise buffer creation fails with a synthesis error.
    pub fail_noise_buffers: bool,
    /// Every `cancel_automation` call fails with a synthesis error.
    pub fail_automation_cancel: bool,
}

/// [`AudioHost`] that opens [`RecordingEngine`]s sharing one [`OpLog`].
#[derive(Clone, Debug, Default)]
pub struct RecordingHost {
    opts: RecordingOpts,
    log: OpLog,
    opened: u32,
}

impl RecordingHost {
    /// Host with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Host that reports no audio capability.
    pub fn unavailable() -> Self {
        Self {
            opts: RecordingOpts {
                unavailable: true,
                ..RecordingOpts::default()
            },
            ..Self::default()
        }
    }

    /// Host whose engines fail every noise buffer allocation.
    pub fn failing_noise_buffers() -> Self {
        Self {
            opts: RecordingOpts {
                fail_noise_buffers: true,
                ..RecordingOpts::default()
            },
            ..Self::default()
        }
    }

    /// Host whose engines refuse to cancel gain automation.
    pub fn failing_automation_cancel() -> Self {
        Self {
            opts: RecordingOpts {
                fail_automation_cancel: true,
                ..RecordingOpts::default()
            },
            ..Self::default()
        }
    }

    /// The shared log.
    pub fn log(&self) -> OpLog {
        self.log.clone()
    }

    /// Engines opened so far.
    pub fn opened(&self) -> u32 {
        self.opened
    }
}

impl AudioHost for RecordingHost {
    fn open(&mut self) -> TenebraResult<Box<dyn AmbientSoundEngine>> {
        if self.opts.unavailable {
            return Err(TenebraError::capability("recording host is unavailable"));
        }
        let session = self.opened;
        self.opened += 1;
        let engine = RecordingEngine {
            opts: self.opts,
            log: self.log.clone(),
            session,
            now: TimeMs::ZERO,
            next_id: 0,
            gains: BTreeMap::new(),
            live: BTreeMap::new(),
            closed: false,
        };
        engine.record(GraphOp::Open);
        Ok(Box::new(engine))
    }
}

/// Engine that renders nothing and logs every call.
#[derive(Debug)]
pub struct RecordingEngine {
    opts: RecordingOpts,
    log: OpLog,
    session: u32,
    now: TimeMs,
    next_id: u32,
    gains: BTreeMap<NodeId, (f32, Vec<GainEvent>)>,
    live: BTreeMap<NodeId, bool>,
    closed: bool,
}

impl RecordingEngine {
    fn record(&self, op: GraphOp) {
        self.log.push(OpRecord {
            issued_at: self.now,
            session: self.session,
            op,
        });
    }

    fn ensure_open(&self) -> TenebraResult<()> {
        if self.closed {
            return Err(TenebraError::capability("audio engine closed"));
        }
        Ok(())
    }

    fn ensure_live(&self, node: NodeId) -> TenebraResult<()> {
        if self.live.contains_key(&node) {
            Ok(())
        } else {
            Err(TenebraError::synthesis(format!("unknown audio node {}", node.0)))
        }
    }

    fn alloc(&mut self, is_source: bool) -> TenebraResult<NodeId> {
        self.ensure_open()?;
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.live.insert(id, is_source);
        Ok(id)
    }
}

impl AmbientSoundEngine for RecordingEngine {
    fn oscillator(&mut self, spec: OscillatorSpec) -> TenebraResult<NodeId> {
        let node = self.alloc(true)?;
        self.record(GraphOp::Oscillator { node, spec });
        Ok(node)
    }

    fn noise_buffer(&mut self, spec: NoiseBufferSpec) -> TenebraResult<NodeId> {
        self.ensure_open()?;
        if self.opts.fail_noise_buffers {
            return Err(TenebraError::synthesis("noise buffer allocation failed"));
        }
        let node = self.alloc(true)?;
        self.record(GraphOp::NoiseBuffer { node, spec });
        Ok(node)
    }

    fn filter(&mut self, spec: FilterSpec) -> TenebraResult<NodeId> {
        let node = self.alloc(false)?;
        self.record(GraphOp::Filter { node, spec });
        Ok(node)
    }

    fn gain(&mut self, level: f32) -> TenebraResult<NodeId> {
        let node = self.alloc(false)?;
        self.gains.insert(node, (level, Vec::new()));
        self.record(GraphOp::Gain { node, level });
        Ok(node)
    }

    fn connect(&mut self, from: NodeId, to: Destination) -> TenebraResult<()> {
        self.ensure_open()?;
        self.ensure_live(from)?;
        match to {
            Destination::Output => {}
            Destination::Node(n) => self.ensure_live(n)?,
            Destination::GainParam(n) => {
                if !self.gains.contains_key(&n) {
                    return Err(TenebraError::synthesis("gain param target is not a gain node"));
                }
            }
        }
        self.record(GraphOp::Connect { from, to });
        Ok(())
    }

    fn automate(&mut self, gain: NodeId, events: &[GainEvent]) -> TenebraResult<()> {
        self.ensure_open()?;
        let Some((_, lane)) = self.gains.get_mut(&gain) else {
            return Err(TenebraError::synthesis("automation target is not a gain node"));
        };
        lane.extend_from_slice(events);
        lane.sort_by_key(|e| e.at);
        self.record(GraphOp::Automate {
            node: gain,
            events: events.to_vec(),
        });
        Ok(())
    }

    fn cancel_automation(&mut self, gain: NodeId, from: TimeMs) -> TenebraResult<()> {
        self.ensure_open()?;
        if self.opts.fail_automation_cancel {
            return Err(TenebraError::synthesis("automation cancel failed"));
        }
        let Some((_, lane)) = self.gains.get_mut(&gain) else {
            return Err(TenebraError::synthesis("automation target is not a gain node"));
        };
        lane.retain(|e| e.at < from);
        self.record(GraphOp::CancelAutomation { node: gain, from });
        Ok(())
    }

    fn gain_value(&self, gain: NodeId, at: TimeMs) -> TenebraResult<f32> {
        self.ensure_open()?;
        let (base, lane) = self
            .gains
            .get(&gain)
            .ok_or_else(|| TenebraError::synthesis("gain_value target is not a gain node"))?;
        Ok(automation_value(*base, lane, at.as_f64()))
    }

    fn start(&mut self, source: NodeId, at: TimeMs) -> TenebraResult<()> {
        self.ensure_open()?;
        match self.live.get(&source) {
            Some(true) => {}
            Some(false) => return Err(TenebraError::synthesis("only sources can be started")),
            None => return Err(TenebraError::synthesis("unknown audio node")),
        }
        self.record(GraphOp::Start { node: source, at });
        Ok(())
    }

    fn stop(&mut self, source: NodeId, at: TimeMs) -> TenebraResult<()> {
        self.ensure_open()?;
        self.ensure_live(source)?;
        self.record(GraphOp::Stop { node: source, at });
        Ok(())
    }

    fn release(&mut self, node: NodeId) {
        if self.live.remove(&node).is_some() {
            self.gains.remove(&node);
            self.record(GraphOp::Release { node });
        }
    }

    fn advance(&mut self, now: TimeMs) {
        if now > self.now {
            self.now = now;
        }
    }

    fn live_nodes(&self) -> usize {
        self.live.len()
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.live.clear();
        self.gains.clear();
        self.closed = true;
        self.record(GraphOp::Close);
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
