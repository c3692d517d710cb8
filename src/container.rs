use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;

/// Reserved marker dispatched through the reducer exactly once at
/// construction to seed the initial state.
#[derive(Debug)]
pub struct InitAction;

type BoxedReducer<State> = Box<dyn Fn(State, &dyn Any) -> Result<State> + Send + Sync>;

struct Subscriber<State> {
    id: u64,
    callback: Arc<dyn Fn(&State) + Send + Sync>,
}

pub(crate) struct StateContainer<State> {
    reducer: BoxedReducer<State>,
    state: Mutex<State>,
    subscribers: Arc<Mutex<Vec<Subscriber<State>>>>,
    next_subscriber_id: AtomicU64,
    // Serializes the reduce-apply-and-notify sequence across concurrent
    // dispatch callers. Never held across an await point.
    dispatch_gate: Mutex<()>,
}

impl<State> StateContainer<State>
where
    State: Clone + Send + 'static,
{
    pub(crate) fn new<R>(reducer: R) -> Result<Self>
    where
        State: Default,
        R: Fn(State, &dyn Any) -> Result<State> + Send + Sync + 'static,
    {
        let initial = reducer(State::default(), &InitAction)?;
        Ok(Self {
            reducer: Box::new(reducer),
            state: Mutex::new(initial),
            subscribers: Arc::new(Mutex::new(Vec::new())),
            next_subscriber_id: AtomicU64::new(0),
            dispatch_gate: Mutex::new(()),
        })
    }

    pub(crate) fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&State) + Send + Sync + 'static,
    {
        let id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.lock().push(Subscriber {
            id,
            callback: Arc::new(callback),
        });
        let subscribers = Arc::downgrade(&self.subscribers);
        Subscription {
            cancel: Box::new(move || {
                if let Some(subscribers) = subscribers.upgrade() {
                    subscribers.lock().retain(|entry| entry.id != id);
                }
            }),
        }
    }

    /// Applies the reducer and, on success, commits the produced state and
    /// notifies the subscribers registered at the start of this call. On a
    /// reducer error the state stays untouched and nobody is notified.
    pub(crate) fn dispatch(&self, action: &dyn Any) -> Result<()> {
        let _serial = self.dispatch_gate.lock();
        let current = self.state.lock().clone();
        let next = (self.reducer)(current, action)?;
        *self.state.lock() = next.clone();
        let snapshot: Vec<_> = self
            .subscribers
            .lock()
            .iter()
            .map(|entry| entry.callback.clone())
            .collect();
        log::trace!("state committed, notifying {} subscribers", snapshot.len());
        for callback in snapshot {
            callback(&next);
        }
        Ok(())
    }

    pub(crate) fn get_state(&self) -> State {
        self.state.lock().clone()
    }
}

/// Removes the subscriber it was returned for. Invoking it more than once has
/// no effect beyond the first removal.
pub struct Subscription {
    cancel: Box<dyn Fn() + Send + Sync>,
}

impl Subscription {
    pub fn unsubscribe(&self) {
        (self.cancel)()
    }
}

/// Read capability handed to async actions and middleware bodies; always
/// returns the currently committed state.
pub struct GetState<State> {
    container: Arc<StateContainer<State>>,
}

impl<State> GetState<State>
where
    State: Clone + Send + 'static,
{
    pub(crate) fn new(container: Arc<StateContainer<State>>) -> Self {
        Self { container }
    }

    pub fn get(&self) -> State {
        self.container.get_state()
    }
}

impl<State> Clone for GetState<State> {
    fn clone(&self) -> Self {
        Self {
            container: self.container.clone(),
        }
    }
}
