//! Action bus: an ordered middleware chain in front of a broadcast of the
//! actions that made it through.
//!
//! Middleware never re-enter the store. Whatever a middleware wants to emit is
//! returned in its [`MiddlewareOutcome`] and queued behind the action being
//! processed. Asynchronous producers (wallet callbacks, sagas) hold a
//! [`Dispatcher`] instead.
//!
//! Delivered actions go out twice: on a bounded broadcast for observers, which
//! may lag and skip, and on unbounded per-watcher queues for sagas.

use std::collections::VecDeque;

use tokio::sync::{broadcast, mpsc};

use crate::actions::Action;

pub const DEFAULT_BUS_CAPACITY: usize = 256;

#[derive(Debug)]
pub struct MiddlewareOutcome {
    pub emitted: Vec<Action>,
    pub propagate: bool,
}

impl Default for MiddlewareOutcome {
    fn default() -> Self {
        Self::next()
    }
}

impl MiddlewareOutcome {
    /// Let the action continue down the chain.
    pub fn next() -> Self {
        Self {
            emitted: Vec::new(),
            propagate: true,
        }
    }

    /// Swallow the action: later middleware and subscribers never see it.
    pub fn suppress() -> Self {
        Self {
            emitted: Vec::new(),
            propagate: false,
        }
    }

    pub fn emit(mut self, action: Action) -> Self {
        self.emitted.push(action);
        self
    }
}

pub trait Middleware: Send {
    fn name(&self) -> &'static str;

    fn handle(&mut self, action: &Action, dispatcher: &Dispatcher) -> MiddlewareOutcome;
}

/// Cloneable handle for dispatching into a [`Store`] from outside the chain.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    sender: mpsc::UnboundedSender<Action>,
}

impl Dispatcher {
    /// A dispatcher not attached to any store, with the receiving end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Action>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Returns `false` when the store is gone.
    pub fn dispatch(&self, action: Action) -> bool {
        let ty = action.action_type();
        if self.sender.send(action).is_err() {
            tracing::warn!(action = %ty, "store closed, action dropped");
            return false;
        }
        true
    }
}

pub struct Store {
    middlewares: Vec<Box<dyn Middleware>>,
    dispatcher: Dispatcher,
    inbox: mpsc::UnboundedReceiver<Action>,
    delivered: broadcast::Sender<Action>,
    watchers: Vec<mpsc::UnboundedSender<Action>>,
}

impl Store {
    pub fn new(capacity: usize) -> Self {
        let (dispatcher, inbox) = Dispatcher::channel();
        let (delivered, _) = broadcast::channel(capacity);
        Self {
            middlewares: Vec::new(),
            dispatcher,
            inbox,
            delivered,
            watchers: Vec::new(),
        }
    }

    /// Appends a middleware. Middleware see actions in registration order.
    pub fn with_middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middlewares.push(Box::new(middleware));
        self
    }

    pub fn dispatcher(&self) -> Dispatcher {
        self.dispatcher.clone()
    }

    /// Actions that passed every middleware, in processing order.
    pub fn subscribe(&self) -> broadcast::Receiver<Action> {
        self.delivered.subscribe()
    }

    /// Lossless feed of delivered actions. Unlike [`Store::subscribe`] a
    /// slow reader never misses an action; sagas read from here.
    pub fn watch(&mut self) -> mpsc::UnboundedReceiver<Action> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.watchers.push(sender);
        receiver
    }

    /// Runs `action` and everything it causes through the chain, then drains
    /// actions dispatched from outside.
    pub fn dispatch(&mut self, action: Action) -> usize {
        self.process(action) + self.pump()
    }

    /// Processes every action waiting in the inbox without blocking.
    pub fn pump(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(action) = self.inbox.try_recv() {
            processed += self.process(action);
        }
        processed
    }

    /// Waits for the next external action and processes it.
    pub async fn process_next(&mut self) -> usize {
        match self.inbox.recv().await {
            Some(action) => self.process(action),
            None => 0,
        }
    }

    fn process(&mut self, action: Action) -> usize {
        let mut queue = VecDeque::from([action]);
        let mut processed = 0;
        while let Some(action) = queue.pop_front() {
            processed += 1;
            let ty = action.action_type();
            tracing::debug!(action = %ty, "dispatching action");

            let mut propagate = true;
            for middleware in self.middlewares.iter_mut() {
                let outcome = middleware.handle(&action, &self.dispatcher);
                queue.extend(outcome.emitted);
                if !outcome.propagate {
                    tracing::debug!(action = %ty, middleware = middleware.name(), "action suppressed");
                    propagate = false;
                    break;
                }
            }

            if propagate {
                self.watchers
                    .retain(|watcher| watcher.send(action.clone()).is_ok());
                // No subscribers is fine.
                let _ = self.delivered.send(action);
            }
        }
        processed
    }
}
