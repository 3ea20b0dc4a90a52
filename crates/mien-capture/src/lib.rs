//! mien-capture - Frame capture and emotion estimation.
//!
//! A session wires a [`FrameSource`], a [`FaceDetector`] and an
//! [`EmotionClassifier`] together on a tick loop and appends what it
//! sees to the journal. The traits are the seams: the built-in
//! synthetic camera, brightness detector and sampling classifier can
//! each be swapped for a real device or model without touching the
//! session loop.

pub mod classify;
pub mod detect;
pub mod frame;
pub mod session;
pub mod source;

pub use classify::{ClassifyError, EmotionClassifier, EmotionEstimate, SyntheticClassifier};
pub use detect::{BrightnessDetector, DetectError, FaceDetector, FaceRegion};
pub use frame::{Frame, FrameError};
pub use session::{run_session, SessionConfig, SessionError, SessionEvent};
pub use source::{FrameSource, SourceError, SyntheticCamera};
