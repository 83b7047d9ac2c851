//! Widgets for the Storyteller TUI

pub mod input;
pub mod picker;
pub mod story_feed;

pub use input::InputWidget;
pub use picker::PickerWidget;
pub use story_feed::StoryFeedWidget;
