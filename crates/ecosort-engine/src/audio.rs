//! Sound cue output.
//!
//! Maps gameplay cues to files in the sound directory. A cue whose file is
//! missing fails with [`FeedbackError::MissingCue`], which the gameplay side
//! logs and ignores.
//!
//! No sound is produced. This build is headless and links no audio output
//! backend (decoding and playback would need the system ALSA libraries), so
//! [`CueFeedback`] only resolves the file, logs the cue at `debug!` and
//! counts it in [`PlaybackStats`]. An audible sink is another
//! [`FeedbackSink`] implementation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ecosort_gameplay::{FeedbackError, FeedbackSink, SoundCue};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

/// File extensions tried for each cue, in order.
pub const CUE_EXTENSIONS: [&str; 3] = ["ogg", "wav", "mp3"];

/// Playback counters, shared with whoever owns the sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackStats {
    /// Cues played
    pub played: u32,
    /// Cues that failed
    pub failed: u32,
}

/// Feedback sink backed by cue files on disk. Records plays, emits no audio.
#[derive(Debug)]
pub struct CueFeedback {
    /// Resolved file per cue
    files: HashMap<SoundCue, PathBuf>,
    /// Sound effects volume (0.0 - 1.0)
    volume: f32,
    /// Counters
    stats: Arc<Mutex<PlaybackStats>>,
}

impl CueFeedback {
    /// Resolves every cue under `sound_dir`, warning about missing ones.
    #[must_use]
    pub fn new(sound_dir: &Path, volume: f32) -> Self {
        let mut files = HashMap::new();
        for cue in SoundCue::ALL {
            match resolve_cue(sound_dir, cue) {
                Some(path) => {
                    debug!(?cue, path = %path.display(), "Resolved sound cue");
                    files.insert(cue, path);
                },
                None => warn!(?cue, dir = %sound_dir.display(), "No sound file for cue"),
            }
        }
        info!("Sound cues ready: {}/{}", files.len(), SoundCue::ALL.len());

        Self {
            files,
            volume: volume.clamp(0.0, 1.0),
            stats: Arc::new(Mutex::new(PlaybackStats::default())),
        }
    }

    /// Handle to the playback counters.
    #[must_use]
    pub fn stats_handle(&self) -> Arc<Mutex<PlaybackStats>> {
        Arc::clone(&self.stats)
    }

    /// File a cue plays, if one was found.
    #[must_use]
    pub fn file_for(&self, cue: SoundCue) -> Option<&Path> {
        self.files.get(&cue).map(PathBuf::as_path)
    }
}

impl FeedbackSink for CueFeedback {
    fn play(&mut self, cue: SoundCue) -> Result<(), FeedbackError> {
        let Some(path) = self.files.get(&cue) else {
            self.stats.lock().failed += 1;
            return Err(FeedbackError::MissingCue(cue));
        };
        if self.volume <= 0.0 {
            return Ok(());
        }

        debug!(?cue, path = %path.display(), volume = self.volume, "Playing cue");
        self.stats.lock().played += 1;
        Ok(())
    }
}

fn resolve_cue(dir: &Path, cue: SoundCue) -> Option<PathBuf> {
    CUE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{ext}", cue.asset_name())))
        .find(|path| path.is_file())
}
