//! `AudioOutput` backed by `rodio`.
//!
//! The output stream is opened once. Each load prepares a paused `Sink` in a
//! shared slot and hands fetching and decoding to a loader thread. The loader
//! only installs its source if the slot still belongs to its generation, so a
//! superseded start never becomes audible.

use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};

use crate::config::FetchSettings;

use super::fetch::Fetcher;
use super::output::{AudioOutput, OutputEvent, OutputEvents};
use super::types::{Generation, PlaybackError};

#[derive(Default)]
pub(super) struct Slot {
    pub(super) generation: Option<Generation>,
    sink: Option<Sink>,
    /// Source appended and the start reported.
    ready: bool,
    autoplay: bool,
    /// Position requested before the source was ready.
    start_at: Duration,
    ended_reported: bool,
}

pub struct RodioOutput {
    stream: OutputStream,
    slot: Arc<Mutex<Slot>>,
    fetcher: Arc<Fetcher>,
    events: OutputEvents,
}

impl RodioOutput {
    /// Open the default output device.
    ///
    /// Device errors reported by the stream fail the loaded track.
    pub fn open(events: OutputEvents, fetch: &FetchSettings) -> Result<Self, PlaybackError> {
        let slot = Arc::new(Mutex::new(Slot::default()));

        let on_error = {
            let slot = slot.clone();
            let events = events.clone();
            move |err: rodio::cpal::StreamError| {
                report_stream_error(&slot, &events, &err.to_string());
            }
        };
        let mut stream = OutputStreamBuilder::from_default_device()
            .map_err(|e| PlaybackError::OutputUnavailable(e.to_string()))?
            .with_error_callback(on_error)
            .open_stream_or_fallback()
            .map_err(|e| PlaybackError::OutputUnavailable(e.to_string()))?;
        // rodio logs to stderr when the stream is dropped, which would draw over the TUI.
        stream.log_on_drop(false);

        Ok(Self {
            stream,
            slot,
            fetcher: Arc::new(Fetcher::new(fetch)),
            events,
        })
    }
}

impl AudioOutput for RodioOutput {
    fn load(&mut self, generation: Generation, url: &str, volume: f32, autoplay: bool) {
        let sink = Sink::connect_new(self.stream.mixer());
        sink.pause();
        sink.set_volume(volume);

        if let Ok(mut slot) = self.slot.lock() {
            if let Some(old) = slot.sink.take() {
                old.stop();
            }
            *slot = Slot {
                generation: Some(generation),
                sink: Some(sink),
                autoplay,
                ..Slot::default()
            };
        }

        let slot = self.slot.clone();
        let fetcher = self.fetcher.clone();
        let events = self.events.clone();
        let url = url.to_string();
        let spawned = thread::Builder::new()
            .name("tilawa-loader".to_string())
            .spawn(move || load_source(generation, &url, &fetcher, &slot, &events));

        if let Err(e) = spawned {
            self.events.emit(OutputEvent::StartFailed {
                generation,
                error: PlaybackError::StartFailure(e.to_string()),
            });
        }
    }

    fn pause(&mut self) {
        if let Ok(mut slot) = self.slot.lock() {
            slot.autoplay = false;
            if let Some(sink) = slot.sink.as_ref() {
                sink.pause();
            }
        }
    }

    fn resume(&mut self, generation: Generation) {
        let Ok(mut slot) = self.slot.lock() else {
            return;
        };

        let event = if slot.generation != Some(generation) || slot.sink.is_none() {
            OutputEvent::ResumeFailed {
                generation,
                error: PlaybackError::ResumeFailure("no source loaded".to_string()),
            }
        } else {
            slot.autoplay = true;
            if slot.ready {
                if let Some(sink) = slot.sink.as_ref() {
                    sink.play();
                }
            }
            OutputEvent::Resumed { generation }
        };
        self.events.emit(event);
    }

    fn seek(&mut self, position: Duration) {
        let Ok(mut slot) = self.slot.lock() else {
            return;
        };
        if !slot.ready {
            slot.start_at = position;
            return;
        }
        if let Some(sink) = slot.sink.as_ref() {
            if let Err(e) = sink.try_seek(position) {
                log::warn!("rodio: seek to {position:?} failed: {e}");
            }
        }
        slot.ended_reported = false;
    }

    fn set_volume(&mut self, volume: f32) {
        if let Ok(slot) = self.slot.lock() {
            if let Some(sink) = slot.sink.as_ref() {
                sink.set_volume(volume);
            }
        }
    }

    fn unload(&mut self) {
        if let Ok(mut slot) = self.slot.lock() {
            if let Some(sink) = slot.sink.take() {
                sink.stop();
            }
            *slot = Slot::default();
        }
    }

    fn poll(&mut self) {
        let Ok(mut slot) = self.slot.lock() else {
            return;
        };
        let (Some(generation), true) = (slot.generation, slot.ready) else {
            return;
        };
        let Some(sink) = slot.sink.as_ref() else {
            return;
        };

        if sink.empty() {
            if !slot.ended_reported {
                slot.ended_reported = true;
                self.events.emit(OutputEvent::Ended { generation });
            }
        } else if !sink.is_paused() {
            self.events.emit(OutputEvent::PositionAdvanced {
                generation,
                position: sink.get_pos(),
            });
        }
    }
}

/// Fetch and decode `url`, then install it if `generation` still owns the slot.
fn load_source(
    generation: Generation,
    url: &str,
    fetcher: &Fetcher,
    slot: &Mutex<Slot>,
    events: &OutputEvents,
) {
    let decoded = fetcher
        .fetch(url)
        .map_err(|e| e.to_string())
        .and_then(|bytes| {
            let len = bytes.len() as u64;
            Decoder::builder()
                .with_data(Cursor::new(bytes))
                .with_byte_len(len)
                .with_seekable(true)
                .build()
                .map_err(|e| format!("cannot decode {url}: {e}"))
        });

    let Ok(mut slot) = slot.lock() else {
        return;
    };
    if slot.generation != Some(generation) {
        log::debug!("rodio: discarding superseded load of {url}");
        return;
    }

    let source = match decoded {
        Ok(source) => source,
        Err(reason) => {
            events.emit(OutputEvent::StartFailed {
                generation,
                error: PlaybackError::StartFailure(reason),
            });
            return;
        }
    };

    let total = source.total_duration();
    let Some(sink) = slot.sink.as_ref() else {
        return;
    };
    sink.append(source);
    if !slot.start_at.is_zero() {
        if let Err(e) = sink.try_seek(slot.start_at) {
            log::warn!("rodio: initial seek failed: {e}");
        }
    }
    if slot.autoplay {
        sink.play();
    }
    slot.ready = true;

    if let Some(duration) = total {
        events.emit(OutputEvent::MetadataReady {
            generation,
            duration,
        });
    }
    events.emit(OutputEvent::Started { generation });
}

/// Fail whatever the slot holds after a device error. Returns false when
/// nothing was loaded.
pub(super) fn report_stream_error(
    slot: &Mutex<Slot>,
    events: &OutputEvents,
    reason: &str,
) -> bool {
    let Ok(mut slot) = slot.lock() else {
        return false;
    };
    log::warn!("rodio: output stream error: {reason}");
    let Some(generation) = slot.generation else {
        return false;
    };
    if let Some(sink) = slot.sink.as_ref() {
        sink.pause();
    }
    slot.autoplay = false;
    events.emit(OutputEvent::ErrorOccurred {
        generation,
        error: PlaybackError::Runtime(reason.to_string()),
    })
}
