use crate::audio::engine::{
    AmbientSoundEngine, AudioHost, Destination, FilterKind, FilterSpec, GainEvent, NodeId,
    NoiseBufferSpec, OscillatorSpec, Waveform, automation_value,
};
use crate::audio::mix::{MIX_SAMPLE_RATE, PcmCapture, ms_to_sample};
use crate::foundation::core::TimeMs;
use crate::foundation::error::{TenebraError, TenebraResult};
use crate::foundation::math::hash_unit;
use std::f64::consts::TAU;

/// Options for the CPU synthesis backend.
#[derive(Clone, Debug)]
pub struct SynthOpts {
    /// Output sample rate.
    pub sample_rate: u32,
    /// Where the rendered master bus goes. `None` renders and discards.
    pub capture: Option<PcmCapture>,
}

impl Default for SynthOpts {
    fn default() -> Self {
        Self {
            sample_rate: MIX_SAMPLE_RATE,
            capture: None,
        }
    }
}

/// [`AudioHost`] that opens a [`SynthEngine`] per session.
#[derive(Clone, Debug, Default)]
pub struct SynthHost {
    opts: SynthOpts,
}

impl SynthHost {
    /// Create a host with the given options.
    pub fn new(opts: SynthOpts) -> Self {
        Self { opts }
    }
}

impl AudioHost for SynthHost {
    fn open(&mut self) -> TenebraResult<Box<dyn AmbientSoundEngine>> {
        Ok(Box::new(SynthEngine::new(self.opts.clone())?))
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct SourceWindow {
    start: Option<u64>,
    stop: Option<u64>,
}

impl SourceWindow {
    fn active(self, n: u64) -> bool {
        match self.start {
            None => false,
            Some(s) => n >= s && self.stop.is_none_or(|e| n < e),
        }
    }
}

#[derive(Clone, Debug)]
struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl Biquad {
    fn new(spec: FilterSpec, sample_rate: u32) -> Self {
        let sr = f64::from(sample_rate);
        let f = spec.cutoff_hz.clamp(10.0, sr * 0.45);
        let q = if spec.q > 0.0 {
            spec.q
        } else {
            std::f64::consts::FRAC_1_SQRT_2
        };
        let w0 = TAU * f / sr;
        let (sin, cos) = w0.sin_cos();
        let alpha = sin / (2.0 * q);
        let (b0, b1, b2) = match spec.kind {
            FilterKind::Highpass => ((1.0 + cos) / 2.0, -(1.0 + cos), (1.0 + cos) / 2.0),
            FilterKind::Lowpass => ((1.0 - cos) / 2.0, 1.0 - cos, (1.0 - cos) / 2.0),
        };
        let a0 = 1.0 + alpha;
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: (-2.0 * cos) / a0,
            a2: (1.0 - alpha) / a0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    fn process(&mut self, x: f64) -> f64 {
        let y = self.b0 * x + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }
}

#[derive(Clone, Debug)]
enum NodeKind {
    Oscillator {
        waveform: Waveform,
        hz: f64,
        phase: f64,
        window: SourceWindow,
    },
    Noise {
        samples: Vec<f32>,
        window: SourceWindow,
    },
    Filter(Biquad),
    Gain {
        base: f32,
        events: Vec<GainEvent>,
    },
}

#[derive(Clone, Debug)]
struct SynthNode {
    kind: NodeKind,
    inputs: Vec<NodeId>,
    param_inputs: Vec<NodeId>,
}

/// CPU audio-graph renderer.
///
/// Nodes are evaluated once per sample in dependency order; the summed output is clamped to
/// `[-1, 1]` and appended to the configured [`PcmCapture`].
pub struct SynthEngine {
    sample_rate: u32,
    nodes: Vec<Option<SynthNode>>,
    outputs: Vec<NodeId>,
    order: Vec<usize>,
    order_dirty: bool,
    values: Vec<f32>,
    rendered: u64,
    capture: Option<PcmCapture>,
    block: Vec<f32>,
    closed: bool,
}

impl SynthEngine {
    /// Create an engine.
    pub fn new(opts: SynthOpts) -> TenebraResult<Self> {
        if opts.sample_rate < 1_000 {
            return Err(TenebraError::validation(
                "synth sample rate must be at least 1000 Hz",
            ));
        }
        Ok(Self {
            sample_rate: opts.sample_rate,
            nodes: Vec::new(),
            outputs: Vec::new(),
            order: Vec::new(),
            order_dirty: false,
            values: Vec::new(),
            rendered: 0,
            capture: opts.capture,
            block: Vec::new(),
            closed: false,
        })
    }

    /// Output sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Samples rendered so far.
    pub fn rendered_samples(&self) -> u64 {
        self.rendered
    }

    fn ensure_open(&self) -> TenebraResult<()> {
        if self.closed {
            return Err(TenebraError::capability("audio engine closed"));
        }
        Ok(())
    }

    fn insert(&mut self, kind: NodeKind) -> TenebraResult<NodeId> {
        self.ensure_open()?;
        let id = u32::try_from(self.nodes.len())
            .map_err(|_| TenebraError::synthesis("audio node ids exhausted"))?;
        self.nodes.push(Some(SynthNode {
            kind,
            inputs: Vec::new(),
            param_inputs: Vec::new(),
        }));
        self.values.push(0.0);
        Ok(NodeId(id))
    }

    fn node(&self, id: NodeId) -> TenebraResult<&SynthNode> {
        self.nodes
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .ok_or_else(|| TenebraError::synthesis(format!("unknown audio node {}", id.0)))
    }

    fn node_mut(&mut self, id: NodeId) -> TenebraResult<&mut SynthNode> {
        self.nodes
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .ok_or_else(|| TenebraError::synthesis(format!("unknown audio node {}", id.0)))
    }

    fn sample_at(&self, t: TimeMs) -> u64 {
        ms_to_sample(t, self.sample_rate)
    }

    /// True if `target` feeds (directly or transitively) into `from`.
    fn feeds_into(&self, target: NodeId, from: NodeId) -> bool {
        let mut stack = vec![from];
        let mut seen = vec![false; self.nodes.len()];
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            let idx = id.0 as usize;
            if seen.get(idx).copied().unwrap_or(true) {
                continue;
            }
            seen[idx] = true;
            if let Some(Some(n)) = self.nodes.get(idx) {
                stack.extend(n.inputs.iter().chain(n.param_inputs.iter()).copied());
            }
        }
        false
    }

    fn rebuild_order(&mut self) {
        fn visit(nodes: &[Option<SynthNode>], idx: usize, state: &mut [u8], out: &mut Vec<usize>) {
            if state[idx] != 0 {
                return;
            }
            state[idx] = 1;
            if let Some(n) = &nodes[idx] {
                for dep in n.inputs.iter().chain(n.param_inputs.iter()) {
                    visit(nodes, dep.0 as usize, state, out);
                }
            }
            state[idx] = 2;
            out.push(idx);
        }

        let mut state = vec![0u8; self.nodes.len()];
        let mut order = Vec::with_capacity(self.nodes.len());
        for out in &self.outputs {
            visit(&self.nodes, out.0 as usize, &mut state, &mut order);
        }
        self.order = order;
        self.order_dirty = false;
    }

    fn render_sample(&mut self, n: u64) -> f32 {
        let sr = f64::from(self.sample_rate);
        let t_ms = (n as f64) * 1000.0 / sr;
        for &idx in &self.order {
            let Some(node) = self.nodes[idx].as_mut() else {
                self.values[idx] = 0.0;
                continue;
            };
            let input: f32 = node.inputs.iter().map(|i| self.values[i.0 as usize]).sum();
            let v = match &mut node.kind {
                NodeKind::Oscillator {
                    waveform,
                    hz,
                    phase,
                    window,
                } => {
                    if window.active(n) {
                        let p = *phase;
                        *phase = (p + *hz / sr).fract();
                        (match waveform {
                            Waveform::Sine => (TAU * p).sin(),
                            Waveform::Triangle => 1.0 - 4.0 * (p - 0.5).abs(),
                            Waveform::Square => {
                                if p < 0.5 {
                                    1.0
                                } else {
                                    -1.0
                                }
                            }
                        }) as f32
                    } else {
                        0.0
                    }
                }
                NodeKind::Noise { samples, window } => match window.start {
                    Some(s) if window.active(n) => {
                        samples.get((n - s) as usize).copied().unwrap_or(0.0)
                    }
                    _ => 0.0,
                },
                NodeKind::Filter(bq) => bq.process(f64::from(input)) as f32,
                NodeKind::Gain { base, events } => {
                    let modulation: f32 = node
                        .param_inputs
                        .iter()
                        .map(|i| self.values[i.0 as usize])
                        .sum();
                    input * (automation_value(*base, events, t_ms) + modulation)
                }
            };
            self.values[idx] = v;
        }
        let mixed: f32 = self
            .outputs
            .iter()
            .map(|o| self.values[o.0 as usize])
            .sum();
        mixed.clamp(-1.0, 1.0)
    }
}

impl AmbientSoundEngine for SynthEngine {
    fn oscillator(&mut self, spec: OscillatorSpec) -> TenebraResult<NodeId> {
        let hz = spec.effective_hz();
        if !hz.is_finite() || hz < 0.0 {
            return Err(TenebraError::synthesis("oscillator frequency must be finite"));
        }
        self.insert(NodeKind::Oscillator {
            waveform: spec.waveform,
            hz,
            phase: 0.0,
            window: SourceWindow::default(),
        })
    }

    fn noise_buffer(&mut self, spec: NoiseBufferSpec) -> TenebraResult<NodeId> {
        let len = ms_to_sample(spec.duration, self.sample_rate) as usize;
        if len == 0 {
            return Err(TenebraError::synthesis("noise buffer must be non-empty"));
        }
        let samples = (0..len)
            .map(|i| {
                let white = hash_unit(spec.seed, i as u64, 0) * 2.0 - 1.0;
                let env = if spec.taper {
                    1.0 - (i as f64) / (len as f64)
                } else {
                    1.0
                };
                (white * env) as f32
            })
            .collect();
        self.insert(NodeKind::Noise {
            samples,
            window: SourceWindow::default(),
        })
    }

    fn filter(&mut self, spec: FilterSpec) -> TenebraResult<NodeId> {
        if !spec.cutoff_hz.is_finite() || spec.cutoff_hz <= 0.0 {
            return Err(TenebraError::synthesis("filter cutoff must be > 0"));
        }
        let bq = Biquad::new(spec, self.sample_rate);
        self.insert(NodeKind::Filter(bq))
    }

    fn gain(&mut self, level: f32) -> TenebraResult<NodeId> {
        self.insert(NodeKind::Gain {
            base: level,
            events: Vec::new(),
        })
    }

    fn connect(&mut self, from: NodeId, to: Destination) -> TenebraResult<()> {
        self.ensure_open()?;
        self.node(from)?;
        match to {
            Destination::Output => {
                if !self.outputs.contains(&from) {
                    self.outputs.push(from);
                }
            }
            Destination::Node(dst) | Destination::GainParam(dst) => {
                if dst == from || self.feeds_into(dst, from) {
                    return Err(TenebraError::synthesis("audio graph connection forms a cycle"));
                }
                let is_param = matches!(to, Destination::GainParam(_));
                let node = self.node_mut(dst)?;
                if is_param {
                    if !matches!(node.kind, NodeKind::Gain { .. }) {
                        return Err(TenebraError::synthesis(
                            "only gain nodes accept parameter modulation",
                        ));
                    }
                    node.param_inputs.push(from);
                } else {
                    node.inputs.push(from);
                }
            }
        }
        self.order_dirty = true;
        Ok(())
    }

    fn automate(&mut self, gain: NodeId, new_events: &[GainEvent]) -> TenebraResult<()> {
        self.ensure_open()?;
        let NodeKind::Gain { events, .. } = &mut self.node_mut(gain)?.kind else {
            return Err(TenebraError::synthesis("automation target is not a gain node"));
        };
        events.extend_from_slice(new_events);
        events.sort_by_key(|e| e.at);
        Ok(())
    }

    fn cancel_automation(&mut self, gain: NodeId, from: TimeMs) -> TenebraResult<()> {
        self.ensure_open()?;
        let NodeKind::Gain { events, .. } = &mut self.node_mut(gain)?.kind else {
            return Err(TenebraError::synthesis("automation target is not a gain node"));
        };
        events.retain(|e| e.at < from);
        Ok(())
    }

    fn gain_value(&self, gain: NodeId, at: TimeMs) -> TenebraResult<f32> {
        self.ensure_open()?;
        let NodeKind::Gain { base, events } = &self.node(gain)?.kind else {
            return Err(TenebraError::synthesis("gain_value target is not a gain node"));
        };
        Ok(automation_value(*base, events, at.as_f64()))
    }

    fn start(&mut self, source: NodeId, at: TimeMs) -> TenebraResult<()> {
        self.ensure_open()?;
        let s = self.sample_at(at);
        match &mut self.node_mut(source)?.kind {
            NodeKind::Oscillator { window, .. } | NodeKind::Noise { window, .. } => {
                if window.start.is_some() {
                    return Err(TenebraError::synthesis("audio source started twice"));
                }
                window.start = Some(s);
                Ok(())
            }
            _ => Err(TenebraError::synthesis("only sources can be started")),
        }
    }

    fn stop(&mut self, source: NodeId, at: TimeMs) -> TenebraResult<()> {
        self.ensure_open()?;
        let s = self.sample_at(at);
        match &mut self.node_mut(source)?.kind {
            NodeKind::Oscillator { window, .. } | NodeKind::Noise { window, .. } => {
                window.stop = Some(window.stop.map_or(s, |prev| prev.min(s)));
                Ok(())
            }
            _ => Err(TenebraError::synthesis("only sources can be stopped")),
        }
    }

    fn release(&mut self, node: NodeId) {
        let Some(slot) = self.nodes.get_mut(node.0 as usize) else {
            return;
        };
        if slot.take().is_none() {
            return;
        }
        self.outputs.retain(|o| *o != node);
        for n in self.nodes.iter_mut().flatten() {
            n.inputs.retain(|i| *i != node);
            n.param_inputs.retain(|i| *i != node);
        }
        self.order_dirty = true;
    }

    fn advance(&mut self, now: TimeMs) {
        if self.closed {
            return;
        }
        let target = self.sample_at(now);
        if target <= self.rendered {
            return;
        }
        if self.order_dirty {
            self.rebuild_order();
        }
        let mut block = std::mem::take(&mut self.block);
        block.clear();
        for n in self.rendered..target {
            block.push(self.render_sample(n));
            if block.len() >= 4096 {
                if let Some(c) = &self.capture {
                    c.extend(&block);
                }
                block.clear();
            }
        }
        if let Some(c) = &self.capture {
            c.extend(&block);
        }
        self.block = block;
        self.rendered = target;
    }

    fn live_nodes(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.nodes.iter_mut().for_each(|n| *n = None);
        self.outputs.clear();
        self.order.clear();
        self.closed = true;
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/synth.rs"]
mod tests;
