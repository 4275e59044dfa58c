//! # Events — Double-Buffered Typed Channels
//!
//! Each event type gets one channel with two buffers and a cursor per reader:
//!
//! ```text
//! frame N    send(A) -> current = [A#7]
//!            reader R reads      -> yields A, cursor[R] = 8
//! frame N+1  update(): previous = [A#7], current = []
//!            reader S reads      -> yields A (S never saw #7)
//!            reader R reads      -> nothing (cursor already past #7)
//! frame N+2  update(): previous = [], current = []   (A is gone)
//! ```
//!
//! Every event gets a sequence id. A read yields the buffered events at or
//! after the reader's cursor and moves the cursor past the newest one, so each
//! reader sees each event exactly once, whether it runs after the sender in
//! the same frame or before it in the next.
//!
//! Inside a system the reader is the running system itself
//! ([`ReaderId::System`]); code outside the schedule asks for a
//! [`ReaderId`] with [`Events::new_reader`].

use std::any::{Any, TypeId};
use std::collections::HashMap;

use super::system::SystemId;
use crate::error::{EcsError, Result};

/// Marker for types usable as events. Blanket-implemented.
pub trait Event: 'static + Send + Sync {}

impl<T: 'static + Send + Sync> Event for T {}

/// Who is reading. Each reader has its own cursor per event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReaderId {
    System(SystemId),
    External(u32),
}

struct EventInstance<T> {
    id: u64,
    event: T,
}

/// Storage for one event type.
pub struct EventChannel<T> {
    previous: Vec<EventInstance<T>>,
    current: Vec<EventInstance<T>>,
    next_id: u64,
    cursors: HashMap<ReaderId, u64>,
}

impl<T: Event> EventChannel<T> {
    fn new() -> Self {
        Self {
            previous: Vec::new(),
            current: Vec::new(),
            next_id: 0,
            cursors: HashMap::new(),
        }
    }

    /// Append to the current buffer; returns the event's sequence id.
    pub fn send(&mut self, event: T) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.current.push(EventInstance { id, event });
        id
    }

    fn buffered(&self) -> impl Iterator<Item = &EventInstance<T>> {
        self.previous.iter().chain(self.current.iter())
    }

    fn read(&mut self, reader: ReaderId) -> impl Iterator<Item = &T> {
        let start = self.cursors.insert(reader, self.next_id).unwrap_or(0);
        self.buffered()
            .filter(move |instance| instance.id >= start)
            .map(|instance| &instance.event)
    }

    fn unread(&self, reader: ReaderId) -> usize {
        let start = self.cursors.get(&reader).copied().unwrap_or(0);
        self.buffered().filter(|instance| instance.id >= start).count()
    }

    /// Events still buffered (both halves).
    pub fn len(&self) -> usize {
        self.previous.len() + self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop everything buffered. Cursors are kept.
    pub fn clear(&mut self) {
        self.previous.clear();
        self.current.clear();
    }
}

trait AnyChannel: Send + Sync {
    fn rotate(&mut self);
    fn buffered_len(&self) -> usize;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Event> AnyChannel for EventChannel<T> {
    fn rotate(&mut self) {
        self.previous = std::mem::take(&mut self.current);
    }

    fn buffered_len(&self) -> usize {
        self.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// All event channels, keyed by event type.
#[derive(Default)]
pub struct Events {
    channels: HashMap<TypeId, Box<dyn AnyChannel>>,
    next_reader: u32,
}

impl Events {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the channel for `T` if it does not exist yet. Returns `true`
    /// when a channel was created; registering twice is harmless.
    pub fn register<T: Event>(&mut self) -> bool {
        if self.channels.contains_key(&TypeId::of::<T>()) {
            log::debug!("event `{}` already registered", std::any::type_name::<T>());
            return false;
        }
        self.channels
            .insert(TypeId::of::<T>(), Box::new(EventChannel::<T>::new()));
        true
    }

    pub fn is_registered<T: Event>(&self) -> bool {
        self.channels.contains_key(&TypeId::of::<T>())
    }

    /// Rotate every channel: last frame's events are dropped, this frame's
    /// become last frame's. Called once at the start of each frame.
    pub fn update(&mut self) {
        for channel in self.channels.values_mut() {
            channel.rotate();
        }
    }

    /// Hand out a reader id for code that runs outside a system.
    pub fn new_reader(&mut self) -> ReaderId {
        let id = ReaderId::External(self.next_reader);
        self.next_reader += 1;
        id
    }

    /// Typed access to a channel, creating it on first use.
    pub fn channel_mut<T: Event>(&mut self) -> Result<&mut EventChannel<T>> {
        self.channels
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(EventChannel::<T>::new()))
            .as_any_mut()
            .downcast_mut::<EventChannel<T>>()
            .ok_or(EcsError::TypeMismatch {
                expected: std::any::type_name::<EventChannel<T>>(),
                found: "another event channel",
            })
    }

    pub fn channel<T: Event>(&self) -> Option<&EventChannel<T>> {
        self.channels
            .get(&TypeId::of::<T>())?
            .as_any()
            .downcast_ref::<EventChannel<T>>()
    }

    pub fn writer<T: Event>(&mut self) -> Result<EventWriter<'_, T>> {
        Ok(EventWriter {
            channel: self.channel_mut::<T>()?,
        })
    }

    pub fn reader<T: Event>(&mut self, reader: ReaderId) -> Result<EventReader<'_, T>> {
        Ok(EventReader {
            channel: self.channel_mut::<T>()?,
            reader,
        })
    }

    pub fn send<T: Event>(&mut self, event: T) -> Result<u64> {
        Ok(self.channel_mut::<T>()?.send(event))
    }

    /// Total events buffered across every channel.
    pub fn buffered(&self) -> usize {
        self.channels.values().map(|c| c.buffered_len()).sum()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

/// Sends events of one type.
pub struct EventWriter<'a, T: Event> {
    channel: &'a mut EventChannel<T>,
}

impl<T: Event> EventWriter<'_, T> {
    pub fn send(&mut self, event: T) -> u64 {
        self.channel.send(event)
    }

    pub fn send_batch(&mut self, events: impl IntoIterator<Item = T>) {
        for event in events {
            self.channel.send(event);
        }
    }
}

/// Reads events of one type on behalf of one reader.
pub struct EventReader<'a, T: Event> {
    channel: &'a mut EventChannel<T>,
    reader: ReaderId,
}

impl<T: Event> EventReader<'_, T> {
    /// Events this reader has not seen yet. Marks them as seen.
    pub fn read(&mut self) -> impl Iterator<Item = &T> {
        self.channel.read(self.reader)
    }

    /// Number of unseen events. Does not mark anything as seen.
    pub fn len(&self) -> usize {
        self.channel.unread(self.reader)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The event surface a [`Context`](crate::context::Context) exposes: readers
/// are keyed by the running system.
pub struct EventAccess<'a> {
    events: &'a mut Events,
    reader: ReaderId,
}

impl<'a> EventAccess<'a> {
    pub(crate) fn new(events: &'a mut Events, system: SystemId) -> Self {
        Self {
            events,
            reader: ReaderId::System(system),
        }
    }

    pub fn writer<T: Event>(&mut self) -> Result<EventWriter<'_, T>> {
        self.events.writer::<T>()
    }

    pub fn reader<T: Event>(&mut self) -> Result<EventReader<'_, T>> {
        self.events.reader::<T>(self.reader)
    }

    /// Shorthand for `writer::<T>()?.send(event)`.
    pub fn send<T: Event>(&mut self, event: T) -> Result<()> {
        self.events.send(event)?;
        Ok(())
    }

    /// Read and clone everything unseen, releasing the borrow on the bus.
    pub fn drain<T: Event + Clone>(&mut self) -> Result<Vec<T>> {
        Ok(self.reader::<T>()?.read().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct ScoreEvent(u32);

    fn drain(events: &mut Events, reader: ReaderId) -> Vec<ScoreEvent> {
        events
            .reader::<ScoreEvent>(reader)
            .unwrap()
            .read()
            .cloned()
            .collect()
    }

    #[test]
    fn later_reader_sees_event_in_same_frame_once() {
        let mut events = Events::new();
        let later = events.new_reader();

        events.update(); // frame 5
        events.writer::<ScoreEvent>().unwrap().send(ScoreEvent(10));
        assert_eq!(drain(&mut events, later), vec![ScoreEvent(10)]);
        assert!(drain(&mut events, later).is_empty());

        events.update(); // frame 6
        assert!(drain(&mut events, later).is_empty());
    }

    #[test]
    fn earlier_reader_sees_event_next_frame_once() {
        let mut events = Events::new();
        let earlier = events.new_reader();

        events.update(); // frame 5
        assert!(drain(&mut events, earlier).is_empty());
        events.send(ScoreEvent(10)).unwrap();

        events.update(); // frame 6
        assert_eq!(drain(&mut events, earlier), vec![ScoreEvent(10)]);

        events.update(); // frame 7
        assert!(drain(&mut events, earlier).is_empty());
    }

    #[test]
    fn events_expire_after_two_rotations() {
        let mut events = Events::new();
        events.send(ScoreEvent(1)).unwrap();
        events.update();
        assert_eq!(events.channel::<ScoreEvent>().map(EventChannel::len), Some(1));
        events.update();
        let fresh = events.new_reader();
        assert!(drain(&mut events, fresh).is_empty());
        assert_eq!(events.buffered(), 0);
    }

    #[test]
    fn readers_are_independent() {
        let mut events = Events::new();
        let a = events.new_reader();
        let b = events.new_reader();
        events.send(ScoreEvent(1)).unwrap();
        events.send(ScoreEvent(2)).unwrap();

        assert_eq!(drain(&mut events, a).len(), 2);
        events.send(ScoreEvent(3)).unwrap();
        assert_eq!(drain(&mut events, a), vec![ScoreEvent(3)]);
        assert_eq!(drain(&mut events, b).len(), 3);
    }

    #[test]
    fn len_does_not_consume() {
        let mut events = Events::new();
        let r = events.new_reader();
        events.send(ScoreEvent(1)).unwrap();
        let reader = events.reader::<ScoreEvent>(r).unwrap();
        assert_eq!(reader.len(), 1);
        assert_eq!(reader.len(), 1);
    }

    #[test]
    fn register_is_idempotent() {
        let mut events = Events::new();
        assert!(events.register::<ScoreEvent>());
        events.send(ScoreEvent(4)).unwrap();
        assert!(!events.register::<ScoreEvent>());
        assert_eq!(events.buffered(), 1);
        assert_eq!(events.channel_count(), 1);
    }

    #[test]
    fn sequence_ids_increase() {
        let mut events = Events::new();
        let mut writer = events.writer::<ScoreEvent>().unwrap();
        assert_eq!(writer.send(ScoreEvent(1)), 0);
        assert_eq!(writer.send(ScoreEvent(2)), 1);
        writer.send_batch([ScoreEvent(3), ScoreEvent(4)]);
        assert_eq!(events.buffered(), 4);
    }
}
