//! The pure state machine behind the Session Tracker (spec §4.C).
//!
//! Kept free of threads/IO so the literal poll sequences in spec §8 can be
//! driven directly in tests — the thread wrapper in `tracker::mod` is a thin
//! shell around this.

use crate::process::GameStatus;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Poll {
    pub status: GameStatus,
    pub audio_time_ms: i64,
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq)]
enum State {
    Idle,
    Watching { was_playing: bool },
    WatchingPlaying {
        beatmap_path: String,
        rate: f64,
        last_audio_time_ms: i64,
        stall_count: u32,
        paused: bool,
        pause_count: u32,
        last_accuracy: f64,
    },
}

/// What the tracker learned this poll, for the caller (thread wrapper) to act on.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    PlayCaptured { beatmap_path: String, rate: f64 },
    PauseRecorded,
    /// Emitted on exit to `ResultsScreen` with a usable accuracy reading.
    /// `rate` is the exact rate captured at play start, to invoke the MSD
    /// tool with (spec §4.C "PlayCompleted emission").
    PlayCompleted {
        beatmap_path: String,
        rate: f64,
        accuracy: f64,
        pause_count: u32,
    },
    /// Emitted alongside `PlayCompleted`, always, on entering results.
    ResultsEntered,
    /// The play was discarded: quit/failed to song select, or
    /// `accuracy <= 0` on entering results.
    PlayDiscarded,
}

const PAUSE_STALL_THRESHOLD: u32 = 3;

pub struct TrackerFsm {
    state: State,
}

impl TrackerFsm {
    pub fn new() -> Self {
        Self { state: State::Idle }
    }

    pub fn start_session(&mut self) {
        self.state = State::Watching { was_playing: false };
    }

    /// Returns `true` once `stop_session` has moved the tracker back to `Idle`.
    pub fn is_idle(&self) -> bool {
        matches!(self.state, State::Idle)
    }

    pub fn stop_session(&mut self) {
        self.state = State::Idle;
    }

    /// Beatmap path/rate to capture at play start — supplied by the caller
    /// since resolving a path needs the Songs folder (process module), which
    /// this pure FSM doesn't know about.
    pub fn poll(
        &mut self,
        poll: Poll,
        resolve_play_start: impl FnOnce() -> (String, f64),
    ) -> Vec<TrackerEvent> {
        let mut events = Vec::new();

        match &mut self.state {
            State::Idle => {}
            State::Watching { was_playing } => {
                let is_playing = poll.status == GameStatus::Playing;
                if is_playing && !*was_playing {
                    let (beatmap_path, rate) = resolve_play_start();
                    events.push(TrackerEvent::PlayCaptured {
                        beatmap_path: beatmap_path.clone(),
                        rate,
                    });
                    self.state = State::WatchingPlaying {
                        beatmap_path,
                        rate,
                        last_audio_time_ms: poll.audio_time_ms,
                        stall_count: 0,
                        paused: false,
                        pause_count: 0,
                        last_accuracy: poll.accuracy,
                    };
                } else {
                    *was_playing = is_playing;
                }
            }
            State::WatchingPlaying {
                beatmap_path,
                rate,
                last_audio_time_ms,
                stall_count,
                paused,
                pause_count,
                last_accuracy,
            } => {
                let is_playing = poll.status == GameStatus::Playing;
                if is_playing {
                    *last_accuracy = poll.accuracy;

                    if poll.audio_time_ms == *last_audio_time_ms && poll.audio_time_ms > 0 {
                        *stall_count += 1;
                        if *stall_count == PAUSE_STALL_THRESHOLD && !*paused {
                            *paused = true;
                            *pause_count += 1;
                            events.push(TrackerEvent::PauseRecorded);
                        }
                    } else {
                        *stall_count = 0;
                        *paused = false;
                    }
                    *last_audio_time_ms = poll.audio_time_ms;
                } else {
                    // EvaluateExit (spec §4.C).
                    let beatmap_path = beatmap_path.clone();
                    let rate = *rate;
                    let pause_count = *pause_count;
                    let last_accuracy = *last_accuracy;

                    match poll.status {
                        GameStatus::ResultsScreen => {
                            events.push(TrackerEvent::ResultsEntered);
                            let accuracy = if poll.accuracy > 0.0 {
                                poll.accuracy
                            } else {
                                last_accuracy
                            };
                            if accuracy > 0.0 {
                                events.push(TrackerEvent::PlayCompleted {
                                    beatmap_path,
                                    rate,
                                    accuracy,
                                    pause_count,
                                });
                            } else {
                                events.push(TrackerEvent::PlayDiscarded);
                            }
                        }
                        _ => {
                            // SongSelect (quit/fail) or anything else: discard.
                            events.push(TrackerEvent::PlayDiscarded);
                        }
                    }

                    self.state = State::Watching { was_playing: false };
                }
            }
        }

        events
    }
}

impl Default for TrackerFsm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poll(status: GameStatus, audio_time_ms: i64, accuracy: f64) -> Poll {
        Poll {
            status,
            audio_time_ms,
            accuracy,
        }
    }

    /// Scenario 1 (spec §8): one play emitted with accuracy=94.1, pause_count=0.
    #[test]
    fn tracker_records_one_play() {
        let mut fsm = TrackerFsm::new();
        fsm.start_session();

        let sequence = [
            poll(GameStatus::SongSelect, 0, 0.0),
            poll(GameStatus::Other, 0, 0.0),
            poll(GameStatus::Playing, 1500, 0.0),
            poll(GameStatus::Playing, 3000, 93.4),
            poll(GameStatus::Playing, 6000, 94.1),
            poll(GameStatus::ResultsScreen, 6000, 94.1),
        ];

        let mut completed = None;
        for p in sequence {
            for event in fsm.poll(p, || ("map.osu".to_string(), 1.0)) {
                if let TrackerEvent::PlayCompleted { accuracy, pause_count, .. } = event {
                    completed = Some((accuracy, pause_count));
                }
            }
        }

        let (accuracy, pause_count) = completed.expect("play should have completed");
        assert_eq!(accuracy, 94.1);
        assert_eq!(pause_count, 0);
    }

    /// Scenario 2 (spec §8): one play, pause_count=1.
    #[test]
    fn pause_detection_on_third_consecutive_stall() {
        let mut fsm = TrackerFsm::new();
        fsm.start_session();

        let sequence = [
            poll(GameStatus::Playing, 100, 0.0),
            poll(GameStatus::Playing, 200, 0.0),
            poll(GameStatus::Playing, 200, 0.0),
            poll(GameStatus::Playing, 200, 0.0),
            poll(GameStatus::Playing, 200, 0.0),
            poll(GameStatus::Playing, 300, 0.0),
            poll(GameStatus::ResultsScreen, 300, 95.0),
        ];

        let mut pause_events = 0;
        let mut completed_pause_count = None;
        for p in sequence {
            for event in fsm.poll(p, || ("map.osu".to_string(), 1.0)) {
                match event {
                    TrackerEvent::PauseRecorded => pause_events += 1,
                    TrackerEvent::PlayCompleted { pause_count, .. } => {
                        completed_pause_count = Some(pause_count)
                    }
                    _ => {}
                }
            }
        }

        assert_eq!(pause_events, 1);
        assert_eq!(completed_pause_count, Some(1));
    }

    #[test]
    fn pause_counter_resets_after_audio_time_advances_then_stalls_again() {
        let mut fsm = TrackerFsm::new();
        fsm.start_session();
        let _ = fsm.poll(poll(GameStatus::Playing, 100, 0.0), || ("m".into(), 1.0));

        // Stall for 3 polls -> one pause.
        for _ in 0..3 {
            let _ = fsm.poll(poll(GameStatus::Playing, 100, 0.0), || ("m".into(), 1.0));
        }
        // Advance, then stall again for 3 more polls -> a second pause.
        let _ = fsm.poll(poll(GameStatus::Playing, 150, 0.0), || ("m".into(), 1.0));
        let mut second_pause = false;
        for _ in 0..3 {
            for event in fsm.poll(poll(GameStatus::Playing, 150, 0.0), || ("m".into(), 1.0)) {
                if event == TrackerEvent::PauseRecorded {
                    second_pause = true;
                }
            }
        }
        assert!(second_pause);
    }

    #[test]
    fn quitting_to_song_select_discards_the_play() {
        let mut fsm = TrackerFsm::new();
        fsm.start_session();
        let _ = fsm.poll(poll(GameStatus::Playing, 1000, 50.0), || ("m".into(), 1.0));
        let events = fsm.poll(poll(GameStatus::SongSelect, 1000, 50.0), || ("m".into(), 1.0));
        assert!(events.contains(&TrackerEvent::PlayDiscarded));
        assert!(!events.iter().any(|e| matches!(e, TrackerEvent::PlayCompleted { .. })));
    }

    #[test]
    fn zero_accuracy_on_results_screen_is_discarded() {
        let mut fsm = TrackerFsm::new();
        fsm.start_session();
        let _ = fsm.poll(poll(GameStatus::Playing, 1000, 0.0), || ("m".into(), 1.0));
        let events = fsm.poll(poll(GameStatus::ResultsScreen, 1000, 0.0), || ("m".into(), 1.0));
        assert!(events.contains(&TrackerEvent::PlayDiscarded));
        assert!(events.contains(&TrackerEvent::ResultsEntered));
    }
}
