//! A graphics device that records every command instead of executing it.

#![allow(dead_code)]

use lumen_core::math::Extent2D;
use lumen_core::renderer::{
    CommandBufferId, CommandEncoder, ComputeDispatch, FullscreenDraw, GraphicsDevice,
    MemoryBarrier, PassParams, ReadbackStrategy, ResourceError, ShaderKey,
    StagePipelineDescriptor, TextureDescriptor, TextureId, TimestampReadback,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

/// One recorded GPU command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Dispatch {
        shader: ShaderKey,
        inputs: Vec<TextureId>,
        outputs: Vec<TextureId>,
        workgroups: [u32; 3],
        params: PassParams,
    },
    Draw {
        shader: ShaderKey,
        inputs: Vec<TextureId>,
        target: TextureId,
        params: PassParams,
    },
    Barrier(MemoryBarrier),
    Mipmaps(TextureId),
    Timestamp {
        slot: u32,
        query: u32,
    },
    Resolve {
        slot: u32,
        count: u32,
    },
}

/// Device-level events, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Submit(Vec<Command>),
    ScheduleReadback { slot: u32, frame: u64 },
    ReadTimestamps {
        slot: u32,
        frame: u64,
        strategy: ReadbackStrategy,
    },
}

#[derive(Debug)]
struct Staging {
    frame: u64,
    ticks: Vec<u64>,
    polls_left: u32,
}

#[derive(Debug, Default)]
struct MockState {
    next_texture: usize,
    live: HashMap<TextureId, (String, Extent2D)>,
    created: Vec<(TextureId, String)>,
    destroyed: Vec<TextureId>,
    programs: HashSet<ShaderKey>,
    timestamps_supported: bool,
    queries_created: bool,
    fail_label: Option<String>,
    polls_before_ready: u32,
    tick: u64,
    next_buffer: u64,
    finished: HashMap<u64, Vec<Command>>,
    resolved: [Option<Vec<u64>>; 2],
    staging: [Option<Staging>; 2],
    events: Vec<Event>,
}

/// The recording device. Clones share the same state.
#[derive(Debug, Clone)]
pub struct MockDevice {
    state: Arc<Mutex<MockState>>,
}

impl MockDevice {
    /// A device with timestamp support and every stage program registered.
    pub fn new() -> Self {
        let device = Self::without_programs();
        for key in ShaderKey::ALL {
            device
                .create_stage_pipeline(&StagePipelineDescriptor::new(key, "// test"))
                .unwrap();
        }
        device
    }

    /// A device with timestamp support and no stage program.
    pub fn without_programs() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let state = MockState {
            timestamps_supported: true,
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn set_timestamps_supported(&self, supported: bool) {
        self.lock().timestamps_supported = supported;
    }

    /// Makes texture creation fail for the texture with this label.
    pub fn fail_texture(&self, label: &str) {
        self.lock().fail_label = Some(label.to_string());
    }

    /// Number of `Poll` readbacks answered `NotReady` before a slot becomes readable.
    pub fn set_polls_before_ready(&self, polls: u32) {
        self.lock().polls_before_ready = polls;
    }

    pub fn events(&self) -> Vec<Event> {
        self.lock().events.clone()
    }

    pub fn clear_events(&self) {
        self.lock().events.clear();
    }

    /// Commands of every submission, in order.
    pub fn submissions(&self) -> Vec<Vec<Command>> {
        self.lock()
            .events
            .iter()
            .filter_map(|event| match event {
                Event::Submit(commands) => Some(commands.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn live_textures(&self) -> usize {
        self.lock().live.len()
    }

    pub fn is_live(&self, id: TextureId) -> bool {
        self.lock().live.contains_key(&id)
    }

    pub fn destroyed(&self) -> Vec<TextureId> {
        self.lock().destroyed.clone()
    }

    pub fn created_labels(&self) -> Vec<String> {
        self.lock().created.iter().map(|(_, l)| l.clone()).collect()
    }
}

impl GraphicsDevice for MockDevice {
    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        let mut state = self.lock();
        let label = descriptor.label.as_deref().unwrap_or("").to_string();
        if state.fail_label.as_deref() == Some(label.as_str()) {
            return Err(ResourceError::IncompleteTarget {
                label,
                details: "injected failure".to_string(),
            });
        }
        if descriptor.extent.is_empty() {
            return Err(ResourceError::InvalidExtent {
                requested: descriptor.extent,
                max_dimension: 8192,
            });
        }
        let id = TextureId(state.next_texture);
        state.next_texture += 1;
        state.live.insert(id, (label.clone(), descriptor.extent));
        state.created.push((id, label));
        Ok(id)
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        let mut state = self.lock();
        state.live.remove(&id).ok_or(ResourceError::NotFound)?;
        state.destroyed.push(id);
        Ok(())
    }

    fn texture_extent(&self, id: TextureId) -> Option<Extent2D> {
        self.lock().live.get(&id).map(|(_, extent)| *extent)
    }

    fn max_texture_dimension(&self) -> u32 {
        8192
    }

    fn create_stage_pipeline(
        &self,
        descriptor: &StagePipelineDescriptor,
    ) -> Result<(), ResourceError> {
        self.lock().programs.insert(descriptor.key);
        Ok(())
    }

    fn has_stage_pipeline(&self, key: ShaderKey) -> bool {
        self.lock().programs.contains(&key)
    }

    fn create_timestamp_queries(
        &self,
        _slots: u32,
        _queries_per_slot: u32,
    ) -> Result<bool, ResourceError> {
        let mut state = self.lock();
        state.queries_created = state.timestamps_supported;
        Ok(state.timestamps_supported)
    }

    fn destroy_timestamp_queries(&self) {
        self.lock().queries_created = false;
    }

    fn timestamp_period_ns(&self) -> f32 {
        1.0
    }

    fn create_command_encoder(&self, _label: Option<&str>) -> Box<dyn CommandEncoder> {
        Box::new(MockEncoder {
            state: self.state.clone(),
            commands: Vec::new(),
        })
    }

    fn submit_command_buffer(&self, command_buffer: CommandBufferId) {
        let mut state = self.lock();
        let commands = state.finished.remove(&command_buffer.0).unwrap_or_default();

        // Execute: every timestamp gets the next tick, resolves capture the slot.
        // Resolving a query this submission never wrote is a validation error on
        // real backends, so it fails the test here.
        let mut slot_ticks: [Vec<u64>; 2] = [vec![0; 12], vec![0; 12]];
        let mut written: [Vec<bool>; 2] = [vec![false; 12], vec![false; 12]];
        for command in &commands {
            match command {
                Command::Timestamp { slot, query } => {
                    state.tick += 1_000;
                    slot_ticks[*slot as usize][*query as usize] = state.tick;
                    written[*slot as usize][*query as usize] = true;
                }
                Command::Resolve { slot, count } => {
                    let unwritten: Vec<u32> = (0..*count)
                        .filter(|query| !written[*slot as usize][*query as usize])
                        .collect();
                    assert!(
                        unwritten.is_empty(),
                        "resolve of slot {slot} covers unwritten queries {unwritten:?}"
                    );
                    state.resolved[*slot as usize] = Some(slot_ticks[*slot as usize].clone());
                }
                _ => {}
            }
        }
        state.events.push(Event::Submit(commands));
    }

    fn schedule_timestamp_readback(&self, slot: u32, frame_tag: u64) {
        let mut state = self.lock();
        state.events.push(Event::ScheduleReadback {
            slot,
            frame: frame_tag,
        });
        if let Some(ticks) = state.resolved[slot as usize].take() {
            let polls_left = state.polls_before_ready;
            state.staging[slot as usize] = Some(Staging {
                frame: frame_tag,
                ticks,
                polls_left,
            });
        }
    }

    fn read_timestamps(
        &self,
        slot: u32,
        frame_tag: u64,
        strategy: ReadbackStrategy,
    ) -> TimestampReadback {
        let mut state = self.lock();
        state.events.push(Event::ReadTimestamps {
            slot,
            frame: frame_tag,
            strategy,
        });
        let index = slot as usize;
        let (frame, polls_left) = match &state.staging[index] {
            Some(staging) => (staging.frame, staging.polls_left),
            None => return TimestampReadback::Unavailable,
        };
        if frame != frame_tag {
            state.staging[index] = None;
            return TimestampReadback::Unavailable;
        }
        if strategy == ReadbackStrategy::Poll && polls_left > 0 {
            if let Some(staging) = state.staging[index].as_mut() {
                staging.polls_left -= 1;
            }
            return TimestampReadback::NotReady;
        }
        match state.staging[index].take() {
            Some(staging) => TimestampReadback::Ready(staging.ticks),
            None => TimestampReadback::Unavailable,
        }
    }
}

struct MockEncoder {
    state: Arc<Mutex<MockState>>,
    commands: Vec<Command>,
}

impl CommandEncoder for MockEncoder {
    fn dispatch_compute(&mut self, dispatch: &ComputeDispatch<'_>) {
        self.commands.push(Command::Dispatch {
            shader: dispatch.shader,
            inputs: dispatch.inputs.to_vec(),
            outputs: dispatch.outputs.to_vec(),
            workgroups: dispatch.workgroups,
            params: dispatch.params,
        });
    }

    fn draw_fullscreen(&mut self, draw: &FullscreenDraw<'_>) {
        self.commands.push(Command::Draw {
            shader: draw.shader,
            inputs: draw.inputs.to_vec(),
            target: draw.target,
            params: draw.params,
        });
    }

    fn memory_barrier(&mut self, barrier: MemoryBarrier) {
        self.commands.push(Command::Barrier(barrier));
    }

    fn generate_mipmaps(&mut self, texture: TextureId) {
        self.commands.push(Command::Mipmaps(texture));
    }

    fn write_timestamp(&mut self, slot: u32, query_index: u32) {
        self.commands.push(Command::Timestamp {
            slot,
            query: query_index,
        });
    }

    fn resolve_timestamps(&mut self, slot: u32, query_count: u32) -> bool {
        let mut state = self.state.lock().unwrap();
        // A slot whose readback has not completed cannot be overwritten.
        let busy = state.staging[slot as usize]
            .as_ref()
            .is_some_and(|s| s.polls_left > 0);
        if busy {
            return false;
        }
        state.staging[slot as usize] = None;
        drop(state);
        self.commands.push(Command::Resolve {
            slot,
            count: query_count,
        });
        true
    }

    fn finish(self: Box<Self>) -> CommandBufferId {
        let mut state = self.state.lock().unwrap();
        let id = state.next_buffer;
        state.next_buffer += 1;
        state.finished.insert(id, self.commands);
        CommandBufferId(id)
    }
}

/// Draw commands of `shader` in a submission.
pub fn draws(
    commands: &[Command],
    shader: ShaderKey,
) -> Vec<(Vec<TextureId>, TextureId, PassParams)> {
    commands
        .iter()
        .filter_map(|command| match command {
            Command::Draw {
                shader: s,
                inputs,
                target,
                params,
            } if *s == shader => Some((inputs.clone(), *target, *params)),
            _ => None,
        })
        .collect()
}

/// Dispatch commands of `shader` in a submission.
pub fn dispatches(commands: &[Command], shader: ShaderKey) -> Vec<Command> {
    commands
        .iter()
        .filter(|command| matches!(command, Command::Dispatch { shader: s, .. } if *s == shader))
        .cloned()
        .collect()
}
