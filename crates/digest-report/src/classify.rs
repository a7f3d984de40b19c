//! Story classification — one category per story, derived from the last
//! transition and whether the story was rejected earlier in the day.

use std::fmt;

use digest_core::config::ReportConfig;

use crate::grouper::StoryAggregate;

/// Digest section a story is reported under.
///
/// Declaration order is the order sections appear in the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    ReworkedDone,
    ReworkedInProgress,
    Rejected,
    Finished,
    Started,
    Added,
    Uncategorized,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::ReworkedDone,
        Category::ReworkedInProgress,
        Category::Rejected,
        Category::Finished,
        Category::Started,
        Category::Added,
        Category::Uncategorized,
    ];

    /// Machine label, e.g. "reworked_done".
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReworkedDone => "reworked_done",
            Self::ReworkedInProgress => "reworked_in_progress",
            Self::Rejected => "rejected",
            Self::Finished => "finished",
            Self::Started => "started",
            Self::Added => "added",
            Self::Uncategorized => "uncategorized",
        }
    }

    /// Section header shown in the message.
    pub fn header(&self) -> &'static str {
        match self {
            Self::ReworkedDone => "Reworked Done:",
            Self::ReworkedInProgress => "Reworked In Progress:",
            Self::Rejected => "Rejected:",
            Self::Finished => "Done:",
            Self::Started => "In Progress:",
            Self::Added => "Created:",
            Self::Uncategorized => "Uncategorized:",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == label)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Knobs for [`classify`].
#[derive(Debug, Clone, Copy)]
pub struct ClassifyOptions {
    /// A final "started" transition is reported as finished.
    pub started_counts_as_finished: bool,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            started_counts_as_finished: true,
        }
    }
}

impl From<&ReportConfig> for ClassifyOptions {
    fn from(config: &ReportConfig) -> Self {
        Self {
            started_counts_as_finished: config.started_counts_as_finished,
        }
    }
}

/// Pick the category for one story.
pub fn classify(story: &StoryAggregate, options: &ClassifyOptions) -> Category {
    let Some(last) = story.transitions.last().map(String::as_str) else {
        return match story.state.as_deref() {
            Some(state) => Category::from_label(state).unwrap_or_else(|| {
                tracing::warn!(
                    "Uncategorized story {} ('{}'): unknown state '{}'",
                    story.id,
                    story.name,
                    state
                );
                Category::Uncategorized
            }),
            None => {
                tracing::warn!(
                    "Uncategorized story {} ('{}'): no transitions and no state",
                    story.id,
                    story.name
                );
                Category::Uncategorized
            }
        };
    };

    let was_rejected = story.transitions.iter().any(|t| t == "rejected");

    match last {
        "finished" | "accepted" if was_rejected => Category::ReworkedDone,
        "started" if was_rejected => Category::ReworkedInProgress,
        "rejected" => Category::Rejected,
        "finished" | "accepted" => Category::Finished,
        "started" if options.started_counts_as_finished => Category::Finished,
        "started" => Category::Started,
        "added" => Category::Added,
        _ => Category::Uncategorized,
    }
}
