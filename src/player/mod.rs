pub mod audio;
pub mod probe;

pub use audio::AudioPlayer;
