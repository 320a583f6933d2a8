pub mod audio;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod game;
pub mod judgment;
pub mod motion;
pub mod note_stream;
pub mod protocol;
pub mod remote_fret;
pub mod session;
pub mod simulator;
pub mod strum_detector;
pub mod types;
