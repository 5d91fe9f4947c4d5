// Host shell for the notch controller
// =================================
//
// The controller is single-threaded and owns no executor. This module runs
// it on a current-thread tokio runtime:
//
// - source and pointer input arrives as `Message`s over an mpsc channel
// - between messages the loop sleeps until the controller's next deadline
//   and then lets it run its due timers
// - configuration changes are pushed from the cosmic-config watcher thread
//   through the same channel
//
// Views and the surface are logging stand-ins; a compositor-backed shell
// would provide its own implementations of `View` and `Surface`.

use crate::constants::{CHANNEL_BUFFER_SIZE, DEFAULT_MONITOR_WIDTH, MONITOR_ENV};
use crate::handlers::messages::Message;
use crate::state::views::{LogSurface, LogView, Slot, summary};
use crate::subscriptions::events;
use anyhow::Context;
use cosmic_config::{Config, CosmicConfigEntry};
use cosmic_notch_config::NotchConfig;
use cosmic_notch_util::{
    Anchor, NotchController, Policy, Registration, SourceId, SystemClock,
};
use std::rc::Rc;
use std::time::Instant;
use tokio::sync::mpsc;

pub fn run() -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    runtime.block_on(serve())
}

struct CosmicNotch {
    controller: NotchController,
}

impl CosmicNotch {
    fn new(config: NotchConfig, anchor: Anchor) -> Self {
        let mut controller = NotchController::new(
            config,
            anchor,
            Rc::new(SystemClock),
            Rc::new(LogSurface::default()),
        );
        for id in SourceId::ALL {
            controller.register(id, registration(id));
        }
        controller.start();
        Self { controller }
    }

    fn update(&mut self, message: Message) {
        match message {
            Message::Source(event) => self.controller.handle_event(event),
            Message::PointerEntered => self.controller.pointer_entered(),
            Message::PointerMoved(position) => self.controller.pointer_moved(position),
            Message::PointerLeft => self.controller.pointer_left(),
            Message::SecondaryActivated => {
                self.controller.secondary_activated();
            }
            Message::Config(config) => {
                if config != *self.controller.config() {
                    tracing::info!("configuration updated");
                    self.controller.set_config(config);
                }
            }
            Message::Shutdown => {}
        }
    }
}

/// Logging views for every slot a source uses; only sticky sources take
/// part in the split layout
fn registration(id: SourceId) -> Registration {
    let compact = Rc::new(LogView::new(id, Slot::Compact));
    let expanded = Rc::new(LogView::new(id, Slot::Expanded));

    let mut registration = Registration::new()
        .compact(compact.clone())
        .expanded(expanded.clone());
    let secondary = (id.policy() == Policy::Sticky).then(|| Rc::new(LogView::new(id, Slot::Secondary)));
    if let Some(view) = secondary.clone() {
        registration = registration.secondary(view);
    }

    registration.on_update(move |event| {
        let text = summary(event);
        compact.set_text(&text);
        expanded.set_text(&text);
        if let Some(view) = secondary.as_ref() {
            view.set_text(&text);
        }
    })
}

fn load_config() -> (Option<Config>, NotchConfig) {
    let helper = Config::new(cosmic_notch_config::ID, NotchConfig::VERSION)
        .map_err(|err| tracing::warn!("config unavailable, using defaults: {:?}", err))
        .ok();

    let config: NotchConfig = helper
        .as_ref()
        .map(|helper| {
            NotchConfig::get_entry(helper).unwrap_or_else(|(errors, config)| {
                for err in errors {
                    if err.is_err() {
                        tracing::error!("{:?}", err);
                    }
                }
                config
            })
        })
        .unwrap_or_default();
    (helper, config)
}

/// Anchor region from `COSMIC_NOTCH_MONITOR=x,y,width`
fn monitor_anchor() -> Anchor {
    let Ok(value) = std::env::var(MONITOR_ENV) else {
        return Anchor::new(0.0, 0.0, DEFAULT_MONITOR_WIDTH);
    };
    parse_anchor(&value).unwrap_or_else(|| {
        tracing::warn!("ignoring malformed {}: {:?}", MONITOR_ENV, value);
        Anchor::new(0.0, 0.0, DEFAULT_MONITOR_WIDTH)
    })
}

fn parse_anchor(value: &str) -> Option<Anchor> {
    let mut parts = value.split(',').map(|part| part.trim().parse::<f32>());
    let (Some(Ok(x)), Some(Ok(y)), Some(Ok(width)), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };
    (width > 0.0).then(|| Anchor::new(x, y, width))
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
        None => std::future::pending().await,
    }
}

async fn serve() -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

    let (helper, config) = load_config();
    // The watcher stops when dropped
    let _watcher = helper.as_ref().and_then(|helper| {
        let tx = tx.clone();
        helper
            .watch(move |helper, keys| {
                let config = NotchConfig::get_entry(helper).unwrap_or_else(|(errors, config)| {
                    for why in errors.into_iter().filter(cosmic_config::Error::is_err) {
                        tracing::error!(?why, "config load error");
                    }
                    config
                });
                tracing::debug!(?keys, "config changed");
                if let Err(err) = tx.try_send(Message::Config(config)) {
                    tracing::warn!("dropping config update: {}", err);
                }
            })
            .map_err(|err| tracing::warn!("cannot watch config: {:?}", err))
            .ok()
    });

    let input = events::spawn(tx.clone());
    let mut app = CosmicNotch::new(config, monitor_anchor());
    tracing::info!("cosmic-notch {} started", env!("CARGO_PKG_VERSION"));

    loop {
        let deadline = app.controller.next_deadline();
        tokio::select! {
            message = rx.recv() => match message {
                Some(Message::Shutdown) | None => break,
                Some(message) => app.update(message),
            },
            _ = wait_until(deadline) => {
                app.controller.advance();
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(err) = result {
                    tracing::error!("failed to listen for ctrl-c: {}", err);
                }
                break;
            }
        }
        // Handlers may arm zero-delay timers
        app.controller.advance();
    }

    tracing::info!("shutting down");
    app.controller.destroy();
    input.abort();
    Ok(())
}
