use crate::engine::Point;
use crate::events::AppEvent;
use async_channel::Sender;
use derive_more::{AsRef, Deref, Display, From, Into};
use hyprland::data::{CursorPosition, Monitor, Monitors};
use hyprland::prelude::*;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Deref, From, Into, AsRef)]
pub struct MonitorName(String);

crate::impl_string_newtype!(MonitorName);

pub fn get_active_monitor() -> Option<MonitorName> {
    Monitors::get()
        .ok()?
        .into_iter()
        .find(|m| m.focused)
        .map(|m| MonitorName(m.name))
}

fn pick_monitor(monitors: Monitors, name: Option<&MonitorName>) -> Option<Monitor> {
    monitors.into_iter().find(|m| match name {
        Some(name) => m.name == **name,
        None => m.focused,
    })
}

/// Cursor position relative to the named monitor, or the focused one.
pub async fn cursor_pos_on_monitor(name: Option<&MonitorName>) -> Option<Point> {
    let cursor = CursorPosition::get_async().await.ok()?;
    let monitor = pick_monitor(Monitors::get_async().await.ok()?, name)?;

    let x = cursor.x as f64 - monitor.x as f64;
    let y = cursor.y as f64 - monitor.y as f64;

    Some(Point::new(x, y))
}

/// Feeds the compositor's cursor position into the app for surfaces that get
/// no motion events (background layer under windows, click-through).
pub async fn run_cursor_poller(
    tx: Sender<AppEvent>,
    monitor: Option<MonitorName>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut last = None;

    loop {
        ticker.tick().await;

        let Some(pos) = cursor_pos_on_monitor(monitor.as_ref()).await else {
            continue;
        };
        if last == Some(pos) {
            continue;
        }
        last = Some(pos);

        if tx.send(AppEvent::CursorMove(pos)).await.is_err() {
            break;
        }
    }
}
