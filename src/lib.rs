pub mod config;
pub mod coordinator;
pub mod error;
pub mod io;
pub mod permutation;
pub mod playback;
pub mod scoring;
pub mod scramble;
pub mod search;
pub mod types;

pub use config::Config;
pub use coordinator::FrameCoordinator;
pub use error::{Result, ScrambleError};
pub use permutation::PermutationTable;
pub use search::{CancelToken, KeySearchEngine, SearchEvent, SearchHandle, SearchResult};
pub use types::{Block, Frame, FramePair, Key, Mode, ScrambleDirection, SearchBounds};
