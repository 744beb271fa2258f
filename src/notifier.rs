//! Idle notifier: gate host events and schedule notices.
//!
//! `handle` runs to completion without suspending. When the gate opens, the
//! cooldown timestamp is recorded before the dispatch task is spawned, so a
//! duplicate event arriving while a dispatch is still pending is suppressed.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;
use tracing::info;
use tracing::trace;

use crate::config::Config;
use crate::desktop::DispatchOutcome;
use crate::desktop::Dispatcher;
use crate::domain::HostEvent;
use crate::domain::Notice;
use crate::picker::RandomSource;
use crate::picker::ThreadRandom;
use crate::picker::pick;
use crate::throttle::CooldownGate;
use crate::throttle::GateDecision;

/// What `handle` did with an event.
#[derive(Debug)]
pub enum HandleOutcome {
    /// Not an idle event.
    Ignored,
    /// Idle event inside the cooldown window.
    Suppressed,
    /// Dispatch scheduled; the handle resolves once both calls finish.
    Scheduled(JoinHandle<DispatchOutcome>),
}

/// Static notifier parameters.
#[derive(Debug, Clone)]
pub struct NotifierSettings {
    pub idle_event_type: String,
    pub cooldown: Duration,
    pub dispatch_delay: Duration,
    pub title: String,
    pub default_message: String,
    pub messages: Vec<String>,
    pub sounds: Vec<PathBuf>,
    pub icon: Option<PathBuf>,
    pub volume: u32,
}

impl NotifierSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            idle_event_type: config.idle_event_type.clone(),
            cooldown: config.cooldown(),
            dispatch_delay: config.dispatch_delay(),
            title: config.title.clone(),
            default_message: config.default_message.clone(),
            messages: config.messages.clone(),
            sounds: config.sounds.clone(),
            icon: config.resolved_icon(),
            volume: config.volume,
        }
    }
}

/// Turns idle events into desktop notices, at most one per cooldown.
pub struct IdleNotifier<R = ThreadRandom> {
    settings: NotifierSettings,
    gate: CooldownGate,
    rng: R,
    dispatcher: Arc<dyn Dispatcher>,
}

impl IdleNotifier<ThreadRandom> {
    /// Create a notifier with an unseeded RNG.
    pub fn new(settings: NotifierSettings, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self::with_random(settings, dispatcher, ThreadRandom)
    }
}

impl<R: RandomSource> IdleNotifier<R> {
    /// Create a notifier with a specific random source.
    pub fn with_random(
        settings: NotifierSettings,
        dispatcher: Arc<dyn Dispatcher>,
        rng: R,
    ) -> Self {
        let gate = CooldownGate::new(settings.cooldown);
        Self {
            settings,
            gate,
            rng,
            dispatcher,
        }
    }

    /// Handle a host event at the current time.
    ///
    /// Must be called from within a tokio runtime.
    pub fn handle(&mut self, event: &HostEvent) -> HandleOutcome {
        self.handle_at(event, Instant::now())
    }

    /// Handle a host event as if received at `now`.
    pub fn handle_at(&mut self, event: &HostEvent, now: Instant) -> HandleOutcome {
        if !event.is_kind(&self.settings.idle_event_type) {
            trace!("Ignoring event: {}", event.kind);
            return HandleOutcome::Ignored;
        }

        match self.gate.try_open(now) {
            GateDecision::Closed => {
                debug!("Suppressed idle notification (cooldown)");
                HandleOutcome::Suppressed
            }
            GateDecision::Open => {
                let notice = self.compose();
                info!("Session idle, notifying: {:?}", notice.body);
                HandleOutcome::Scheduled(schedule(
                    Arc::clone(&self.dispatcher),
                    notice,
                    now + self.settings.dispatch_delay,
                ))
            }
        }
    }

    /// Build a notice, picking message and sound at random.
    pub fn compose(&mut self) -> Notice {
        let body = pick(&self.settings.messages, &mut self.rng)
            .unwrap_or(&self.settings.default_message)
            .clone();
        let sound = pick(&self.settings.sounds, &mut self.rng).cloned();

        Notice {
            title: self.settings.title.clone(),
            body,
            icon: self.settings.icon.clone(),
            sound,
            volume: self.settings.volume,
        }
    }
}

/// Spawn the dispatch, delayed relative to the gate decision.
/// Once spawned it always runs.
fn schedule(
    dispatcher: Arc<dyn Dispatcher>,
    notice: Notice,
    deadline: Instant,
) -> JoinHandle<DispatchOutcome> {
    tokio::spawn(async move {
        if deadline > Instant::now() {
            tokio::time::sleep_until(deadline).await;
        }
        let outcome = dispatcher.dispatch(&notice).await;
        outcome.log_failures();
        outcome
    })
}
