use crate::config::Appearance;
use crate::events::AppEvent;
use crate::sys::wm::MonitorName;
use async_channel::Sender;
use std::thread;
use std::time::Duration;
use tokio::runtime::Runtime;

pub fn start_background_services(
    tx: Sender<AppEvent>,
    appearance: &Appearance,
    monitor: Option<MonitorName>,
) {
    let poll = appearance
        .hyprland_cursor
        .then(|| Duration::from_millis(appearance.poll_interval_ms));

    thread::spawn(move || {
        let rt = match Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                log::error!("Failed to create Tokio runtime: {}", e);
                return;
            }
        };

        rt.block_on(async {
            {
                let tx = tx.clone();
                tokio::spawn(async move {
                    crate::sys::server::run_server(tx).await;
                });
            }

            {
                let tx = tx.clone();
                tokio::spawn(async move {
                    crate::config::run_async_watcher(tx).await;
                });
            }

            if let Some(interval) = poll {
                let tx = tx.clone();
                tokio::spawn(async move {
                    crate::sys::wm::run_cursor_poller(tx, monitor, interval).await;
                });
            }

            std::future::pending::<()>().await;
        });
    });
}
