//! Pure building blocks shared by the API layer: media field normalization,
//! video embed detection, comment threading and the engagement toggle.

pub mod engagement;
pub mod media;
pub mod thread;
pub mod video;
