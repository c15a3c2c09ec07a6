pub mod certificate;
pub mod rotation;

pub use certificate::{CLAMP_MARGIN_HOURS, CertKind, Certificate, CertificateSet};
pub use rotation::{RotationEvent, RotationSimulator, TickReport, Ticks};
