pub mod analysis;
pub mod config;
pub mod cursor;
pub mod error;
pub mod session;
pub mod state;
pub mod template;
pub mod theme;
pub mod timer;
pub mod typewriter;

// Re-export main types for convenience
pub use analysis::{format_percent, AnalysisResult, Prediction};
pub use config::{Config, Timing};
pub use error::{Error, Result};
pub use session::{Generation, PlaybackSession, ReplyDelay, Scheduled};
pub use state::{DisplayRole, DisplayedMessage, Role, Turn};
pub use template::{ConversationScript, TemplateStore};
pub use theme::{SiteConfig, Theme, ThemeName};
pub use timer::EmissionTimer;
pub use typewriter::{AnalysisFeed, Stage, Typewriter};
