//! MPRIS remote-control surface on the D-Bus session bus.
//!
//! Remote calls become `ControlCmd`s for the event loop; the event loop pushes
//! the controller's state back through `MprisHandle::sync`. Property changes
//! that clients watch (status, metadata, volume) are announced with
//! `PropertiesChanged`.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_io::{Timer, block_on};
use zbus::{Connection, interface, object_server::InterfaceRef};
use zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};

use crate::playback::{Phase, PlaybackState, Track};
use crate::playlist;

const BUS_NAME: &str = "org.mpris.MediaPlayer2.tilawa";
const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";

#[derive(Clone, Debug, PartialEq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    /// Relative seek in microseconds.
    Seek(i64),
    /// Absolute position in microseconds.
    SetPosition(i64),
    SetVolume(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Status,
    Metadata,
    Volume,
}

#[derive(Debug, Default)]
struct SharedState {
    phase: Phase,
    title: Option<String>,
    artist: Vec<String>,
    url: Option<String>,
    length_micros: Option<i64>,
    track_id: Option<OwnedObjectPath>,
    position_micros: i64,
    volume: f64,
}

pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<Change>,
}

impl MprisHandle {
    /// A handle with no bus service behind it.
    pub fn disabled() -> Self {
        let (notify, _) = mpsc::channel();
        Self {
            state: Arc::new(Mutex::new(SharedState::default())),
            notify,
        }
    }

    /// Mirror `playback` into the exported properties.
    pub fn sync(&self, playback: &PlaybackState, reciter_fallback: &str) {
        let Ok(mut s) = self.state.lock() else {
            return;
        };

        let track = playback.current_track.as_ref();
        let title = track.map(playlist::title_label);
        let artist = track
            .map(|t| vec![playlist::reciter_label(t, reciter_fallback).to_string()])
            .unwrap_or_default();
        let url = track.map(|t| t.audio_url.clone());
        let length_micros = playback.duration.map(micros);
        let track_id = track.and_then(track_id_for);

        let mut changes = Vec::new();
        if s.phase != playback.phase {
            s.phase = playback.phase;
            changes.push(Change::Status);
        }
        if s.title != title
            || s.artist != artist
            || s.url != url
            || s.length_micros != length_micros
            || s.track_id != track_id
        {
            s.title = title;
            s.artist = artist;
            s.url = url;
            s.length_micros = length_micros;
            s.track_id = track_id;
            changes.push(Change::Metadata);
        }
        let volume = f64::from(playback.volume);
        if s.volume != volume {
            s.volume = volume;
            changes.push(Change::Volume);
        }
        s.position_micros = micros(playback.position);
        drop(s);

        for change in changes {
            let _ = self.notify.send(change);
        }
    }
}

fn micros(d: Duration) -> i64 {
    i64::try_from(d.as_micros()).unwrap_or(i64::MAX)
}

/// `mpris:trackid` for `track`, built from its key or chapter.
fn track_id_for(track: &Track) -> Option<OwnedObjectPath> {
    let raw = match (track.key.as_deref(), track.chapter) {
        (Some(key), _) if !key.trim().is_empty() => key.trim().to_string(),
        (_, Some(chapter)) => format!("surah_{chapter}"),
        _ => "current".to_string(),
    };
    let segment: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    OwnedObjectPath::try_from(format!("{OBJECT_PATH}/track/{segment}")).ok()
}

fn status_str(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "Stopped",
        Phase::Loading { autoplay: true } | Phase::Playing => "Playing",
        Phase::Loading { autoplay: false } | Phase::Paused => "Paused",
    }
}

fn owned<'a>(value: impl Into<Value<'a>>) -> Option<OwnedValue> {
    OwnedValue::try_from(value.into()).ok()
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {}

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "tilawa"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".to_string(), "http".to_string(), "https".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {}

    fn previous(&self) {}

    fn play(&self) {
        let _ = self.tx.send(ControlCmd::Play);
    }

    fn pause(&self) {
        let _ = self.tx.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        let _ = self.tx.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        let _ = self.tx.send(ControlCmd::Stop);
    }

    fn seek(&self, offset: i64) {
        let _ = self.tx.send(ControlCmd::Seek(offset));
    }

    /// Ignored unless `track_id` names the loaded track.
    fn set_position(&self, track_id: ObjectPath<'_>, position: i64) {
        let current = self
            .state
            .lock()
            .ok()
            .and_then(|s| s.track_id.clone());
        if current.as_ref().map(|p| p.as_str()) == Some(track_id.as_str()) {
            let _ = self.tx.send(ControlCmd::SetPosition(position));
        }
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        let Ok(s) = self.state.lock() else {
            return "Stopped";
        };
        status_str(s.phase)
    }

    #[zbus(property(emits_changed_signal = "false"))]
    fn position(&self) -> i64 {
        self.state.lock().map(|s| s.position_micros).unwrap_or(0)
    }

    #[zbus(property)]
    fn volume(&self) -> f64 {
        self.state.lock().map(|s| s.volume).unwrap_or(1.0)
    }

    #[zbus(property)]
    fn set_volume(&mut self, volume: f64) {
        let _ = self.tx.send(ControlCmd::SetVolume(volume));
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };

        let entries = [
            (
                "mpris:trackid",
                s.track_id.clone().and_then(|p| owned(p.into_inner())),
            ),
            ("xesam:title", s.title.clone().and_then(owned)),
            (
                "xesam:artist",
                (!s.artist.is_empty())
                    .then(|| s.artist.clone())
                    .and_then(owned),
            ),
            ("xesam:url", s.url.clone().and_then(owned)),
            ("mpris:length", s.length_micros.and_then(owned)),
        ];
        for (key, value) in entries {
            if let Some(value) = value {
                map.insert(key.to_string(), value);
            }
        }
        map
    }
}

/// Register the MPRIS service on a background thread.
///
/// Failing to reach the bus is logged; the player keeps working without it.
pub fn spawn_mpris(tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState {
        volume: 1.0,
        ..SharedState::default()
    }));
    let (notify, notify_rx) = mpsc::channel();

    let state_for_thread = state.clone();
    let spawned = std::thread::Builder::new()
        .name("tilawa-mpris".to_string())
        .spawn(move || {
            block_on(async move {
                if let Err(e) = serve(tx, state_for_thread, notify_rx).await {
                    log::warn!("mpris: {e}");
                }
            });
        });
    if let Err(e) = spawned {
        log::warn!("mpris: failed to spawn service thread: {e}");
    }

    MprisHandle { state, notify }
}

async fn serve(
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
    notify_rx: Receiver<Change>,
) -> zbus::Result<()> {
    let connection = Connection::session().await?;
    connection.request_name(BUS_NAME).await?;

    let object_server = connection.object_server();
    object_server
        .at(OBJECT_PATH, RootIface { tx: tx.clone() })
        .await?;
    object_server
        .at(OBJECT_PATH, PlayerIface { tx, state })
        .await?;
    let player: InterfaceRef<PlayerIface> =
        object_server.interface(OBJECT_PATH).await?;
    log::info!("mpris: registered {BUS_NAME}");

    loop {
        Timer::after(Duration::from_millis(100)).await;
        let mut changes = Vec::new();
        loop {
            match notify_rx.try_recv() {
                Ok(change) if !changes.contains(&change) => changes.push(change),
                Ok(_) => {}
                Err(TryRecvError::Empty) => break,
                // The handle is gone: the player is shutting down.
                Err(TryRecvError::Disconnected) => return Ok(()),
            }
        }
        if changes.is_empty() {
            continue;
        }

        let iface = player.get().await;
        let emitter = player.signal_emitter();
        for change in changes {
            let sent = match change {
                Change::Status => iface.playback_status_changed(emitter).await,
                Change::Metadata => iface.metadata_changed(emitter).await,
                Change::Volume => iface.volume_changed(emitter).await,
            };
            if let Err(e) = sent {
                log::debug!("mpris: failed to announce {change:?}: {e}");
            }
        }
    }
}
