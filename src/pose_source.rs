//! Where poses come from.
//!
//! Face detection and pose solving live outside this crate; the tracking
//! loop and the calibration wizard only need "the current pose, or nothing".

use crate::pose::Pose;
use log::warn;
use std::io::BufRead;
use std::sync::{Arc, Mutex, PoisonError};

/// Supplier of the current head pose
pub trait PoseSource {
    /// Current pose, or `None` when no face is detected
    fn current_pose(&mut self) -> Option<Pose>;

    /// True once the source can never produce another sample
    fn is_finished(&self) -> bool {
        false
    }
}

impl<F: FnMut() -> Option<Pose>> PoseSource for F {
    fn current_pose(&mut self) -> Option<Pose> {
        self()
    }
}

/// Latest pose published by the producer loop, readable from other threads
#[derive(Debug, Clone, Default)]
pub struct LatestPose {
    inner: Arc<Mutex<Option<Pose>>>,
}

impl LatestPose {
    /// Create an empty cell
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored pose
    pub fn publish(&self, pose: Option<Pose>) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = pose;
    }

    /// Read the stored pose
    #[must_use]
    pub fn get(&self) -> Option<Pose> {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PoseSource for LatestPose {
    fn current_pose(&mut self) -> Option<Pose> {
        self.get()
    }
}

/// Reads one pose per line from a text stream.
///
/// Each line holds `pitch yaw roll` separated by whitespace or commas.
/// A line of `-` or `none` means no face was detected in that frame;
/// blank lines and lines starting with `#` are skipped.
pub struct LinePoseSource<R> {
    reader: R,
    line: String,
    finished: bool,
}

impl<R: BufRead> LinePoseSource<R> {
    /// Wrap a buffered reader
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            finished: false,
        }
    }
}

/// Parse a `pitch yaw roll` line
#[must_use]
pub fn parse_pose_line(line: &str) -> Option<Pose> {
    let values: Vec<f64> = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<std::result::Result<_, _>>()
        .ok()?;

    match values.as_slice() {
        [pitch, yaw, roll] => Some(Pose::new(*pitch, *yaw, *roll)),
        _ => None,
    }
}

impl<R: BufRead> PoseSource for LinePoseSource<R> {
    fn current_pose(&mut self) -> Option<Pose> {
        while !self.finished {
            self.line.clear();
            match self.reader.read_line(&mut self.line) {
                Ok(0) => self.finished = true,
                Ok(_) => {
                    let trimmed = self.line.trim();
                    if trimmed.is_empty() || trimmed.starts_with('#') {
                        continue;
                    }
                    if trimmed == "-" || trimmed.eq_ignore_ascii_case("none") {
                        return None;
                    }
                    let pose = parse_pose_line(trimmed);
                    if pose.is_none() {
                        warn!("Ignoring malformed pose line: {trimmed}");
                    }
                    return pose;
                }
                Err(e) => {
                    warn!("Pose input read failed: {e}");
                    self.finished = true;
                }
            }
        }
        None
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}
