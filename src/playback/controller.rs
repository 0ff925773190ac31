//! Threaded playback controller.
//!
//! `PlaybackController` is a cheap, cloneable handle. Behind it a single
//! controller thread owns the `Session` and the `AudioOutput`, and processes
//! commands and output events strictly in arrival order. The output is created on
//! that thread once, at spawn time, and released when the last handle goes away.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::AudioSettings;

use super::observers::{Observers, SnapshotHandle};
use super::output::{AudioOutput, OutputEvent, OutputEvents};
use super::session::{Session, Step};
use super::types::{Generation, PlaybackError, PlaybackEvent, PlaybackState, Track};

type Reply = Sender<Result<(), PlaybackError>>;

pub(crate) enum Command {
    Play { track: Track, reply: Reply },
    Pause,
    Resume { reply: Reply },
    Stop,
    SeekTo(f64),
    SeekBy(f64),
    SetVolume(f32),
    Subscribe(Sender<PlaybackEvent>),
    Shutdown,
}

/// Everything the controller thread receives.
pub(crate) enum Msg {
    Cmd(Command),
    Output(OutputEvent),
}

/// Settlement of an asynchronous start or resume.
#[derive(Debug)]
pub struct PendingStart {
    rx: Receiver<Result<(), PlaybackError>>,
}

impl PendingStart {
    fn settled(result: Result<(), PlaybackError>) -> Self {
        let (tx, rx) = mpsc::channel();
        let _ = tx.send(result);
        Self { rx }
    }

    /// Block until the request settles.
    pub fn wait(self) -> Result<(), PlaybackError> {
        self.rx.recv().unwrap_or(Err(PlaybackError::Disconnected))
    }

    /// Wait at most `timeout`; `None` if the request is still in flight.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<(), PlaybackError>> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(PlaybackError::Disconnected)),
        }
    }

    /// Non-blocking check.
    pub fn try_settled(&self) -> Option<Result<(), PlaybackError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => Some(Err(PlaybackError::Disconnected)),
        }
    }
}

struct Inner {
    tx: Sender<Msg>,
    snapshot: SnapshotHandle,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
    fn shutdown(&self) {
        let _ = self.tx.send(Msg::Cmd(Command::Shutdown));
        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                if h.join().is_err() {
                    log::warn!("playback: controller thread panicked");
                }
            }
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Handle to the session-wide playback controller.
///
/// Construct one per session and pass clones to whoever needs playback.
#[derive(Clone)]
pub struct PlaybackController {
    inner: Arc<Inner>,
}

impl PlaybackController {
    /// Spawn the controller thread and create the output on it.
    ///
    /// Fails when `make_output` fails; nothing is left running in that case.
    pub fn spawn<O, F>(settings: &AudioSettings, make_output: F) -> Result<Self, PlaybackError>
    where
        O: AudioOutput,
        F: FnOnce(OutputEvents) -> Result<O, PlaybackError> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Msg>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<SnapshotHandle, PlaybackError>>();
        let events = OutputEvents::new(tx.clone());
        let tick = Duration::from_millis(settings.tick_ms.max(1));
        let initial_volume = settings.initial_volume;

        let handle = thread::Builder::new()
            .name("tilawa-playback".to_string())
            .spawn(move || {
                let output = match make_output(events) {
                    Ok(o) => o,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let mut worker = Worker::new(output, initial_volume);
                let _ = ready_tx.send(Ok(worker.observers.snapshot_handle()));
                worker.run(rx, tick);
            })
            .map_err(|e| PlaybackError::OutputUnavailable(e.to_string()))?;

        let snapshot = match ready_rx.recv() {
            Ok(Ok(snapshot)) => snapshot,
            Ok(Err(e)) => {
                let _ = handle.join();
                return Err(e);
            }
            Err(_) => {
                let _ = handle.join();
                return Err(PlaybackError::OutputUnavailable(
                    "playback thread exited during startup".to_string(),
                ));
            }
        };

        Ok(Self {
            inner: Arc::new(Inner {
                tx,
                snapshot,
                join: Mutex::new(Some(handle)),
            }),
        })
    }

    /// Supersede whatever is loaded and start `track`.
    ///
    /// An empty `audio_url` is rejected here, before the output is touched.
    pub fn play_track(&self, track: Track) -> Result<PendingStart, PlaybackError> {
        if !track.has_audio_url() {
            return Err(PlaybackError::InvalidInput);
        }
        let (reply, rx) = mpsc::channel();
        self.send(Command::Play { track, reply })?;
        Ok(PendingStart { rx })
    }

    pub fn pause_track(&self) {
        let _ = self.send(Command::Pause);
    }

    /// Resume a paused track. Settles `Ok` immediately when there is nothing to do.
    ///
    /// A call made while another resume is in flight settles with that resume.
    pub fn resume_track(&self) -> PendingStart {
        let (reply, rx) = mpsc::channel();
        match self.send(Command::Resume { reply }) {
            Ok(()) => PendingStart { rx },
            Err(e) => PendingStart::settled(Err(e)),
        }
    }

    pub fn stop_track(&self) {
        let _ = self.send(Command::Stop);
    }

    pub fn seek_to(&self, seconds: f64) {
        let _ = self.send(Command::SeekTo(seconds));
    }

    pub fn seek_by(&self, delta_seconds: f64) {
        let _ = self.send(Command::SeekBy(delta_seconds));
    }

    pub fn change_volume(&self, level: f32) {
        let _ = self.send(Command::SetVolume(level));
    }

    /// Receive every state change and failure from now on, starting with the
    /// current state.
    pub fn subscribe(&self) -> Receiver<PlaybackEvent> {
        let (tx, rx) = mpsc::channel();
        let _ = self.send(Command::Subscribe(tx));
        rx
    }

    /// Latest published state.
    pub fn snapshot(&self) -> PlaybackState {
        self.inner
            .snapshot
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Stop playback, release the output and join the controller thread.
    pub fn shutdown(&self) {
        self.inner.shutdown();
    }

    fn send(&self, cmd: Command) -> Result<(), PlaybackError> {
        self.inner
            .tx
            .send(Msg::Cmd(cmd))
            .map_err(|_| PlaybackError::Disconnected)
    }
}

struct Worker<O: AudioOutput> {
    session: Session,
    output: O,
    observers: Observers,
    pending_start: Option<(Generation, Vec<Reply>)>,
    pending_resume: Option<(Generation, Vec<Reply>)>,
}

impl<O: AudioOutput> Worker<O> {
    fn new(output: O, initial_volume: f32) -> Self {
        let session = Session::new(initial_volume);
        let observers = Observers::new(session.state().clone());
        Self {
            session,
            output,
            observers,
            pending_start: None,
            pending_resume: None,
        }
    }

    fn run(&mut self, rx: Receiver<Msg>, tick: Duration) {
        let mut last_poll = Instant::now();
        loop {
            match rx.recv_timeout(tick) {
                Ok(Msg::Cmd(cmd)) => {
                    if !self.handle_command(cmd) {
                        break;
                    }
                }
                Ok(Msg::Output(event)) => self.handle_output(event),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            if last_poll.elapsed() >= tick {
                last_poll = Instant::now();
                if !self.session.state().is_idle() {
                    self.output.poll();
                }
            }
        }

        self.output.release();
        log::debug!("playback: controller thread exiting");
    }

    /// Returns false when the thread should exit.
    fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Play { track, reply } => {
                let url = track.audio_url.clone();
                match self.session.begin_play(track) {
                    Ok(generation) => {
                        self.supersede_pending();
                        self.output.unload();
                        self.output
                            .load(generation, &url, self.session.state().volume, true);
                        self.pending_start = Some((generation, vec![reply]));
                        log::info!("playback: loading {url}");
                        self.publish();
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                    }
                }
            }
            Command::Pause => {
                if self.session.pause() {
                    self.output.pause();
                    self.publish();
                }
            }
            Command::Resume { reply } => {
                if self.session.resume_pending() {
                    if let Some((_, waiting)) = self.pending_resume.as_mut() {
                        waiting.push(reply);
                        return true;
                    }
                }
                match self.session.begin_resume() {
                    Some(generation) => {
                        self.output.resume(generation);
                        self.pending_resume = Some((generation, vec![reply]));
                    }
                    None => {
                        let _ = reply.send(Ok(()));
                    }
                }
            }
            Command::Stop => {
                self.supersede_pending();
                self.output.unload();
                if self.session.stop() {
                    self.publish();
                }
            }
            Command::SeekTo(seconds) => {
                if let Some(position) = self.session.seek(seconds) {
                    self.output.seek(position);
                    self.publish();
                }
            }
            Command::SeekBy(delta) => {
                if let Some(position) = self.session.seek_by(delta) {
                    self.output.seek(position);
                    self.publish();
                }
            }
            Command::SetVolume(level) => {
                if let Some(volume) = self.session.set_volume(level) {
                    self.output.set_volume(volume);
                    self.publish();
                }
            }
            Command::Subscribe(tx) => {
                self.observers.subscribe(tx, self.session.state());
                log::debug!(
                    "playback: {} subscriber(s)",
                    self.observers.subscriber_count()
                );
            }
            Command::Shutdown => {
                self.supersede_pending();
                self.output.unload();
                if self.session.stop() {
                    self.publish();
                }
                return false;
            }
        }
        true
    }

    fn handle_output(&mut self, event: OutputEvent) {
        let generation = event.generation();
        let Step {
            changed,
            failure,
            start,
            resume,
        } = self.session.apply(event);

        if let Some(result) = start {
            settle(&mut self.pending_start, generation, result);
        }
        if let Some(result) = resume {
            settle(&mut self.pending_resume, generation, result);
        }

        if self.session.state().is_idle() {
            // Natural end or error: detach the source like a stop would.
            if changed {
                self.output.unload();
            }
            self.supersede_pending();
        }

        if changed {
            self.publish();
        }
        if let Some(error) = failure {
            log::warn!("playback: {error}");
            self.observers.publish_failure(error);
        }
    }

    fn supersede_pending(&mut self) {
        for pending in [&mut self.pending_start, &mut self.pending_resume] {
            if let Some((_, replies)) = pending.take() {
                for reply in replies {
                    let _ = reply.send(Err(PlaybackError::Superseded));
                }
            }
        }
    }

    fn publish(&mut self) {
        let state = self.session.state().clone();
        self.observers.publish_state(&state);
    }
}

/// Settle every caller waiting on `generation` with the same outcome.
fn settle(
    pending: &mut Option<(Generation, Vec<Reply>)>,
    generation: Generation,
    result: Result<(), PlaybackError>,
) {
    if pending.as_ref().is_some_and(|(g, _)| *g == generation) {
        if let Some((_, replies)) = pending.take() {
            for reply in replies {
                let _ = reply.send(result.clone());
            }
        }
    }
}
