//! Message rendering — pure string assembly.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::classify::{Category, ClassifyOptions, classify};
use crate::grouper::StoryAggregate;

/// `*name*`, the optional comment line, then the url.
pub fn format_story(story: &StoryAggregate) -> String {
    match &story.comment {
        Some(comment) => format!("*{}*\n{}\n{}", story.name, comment, story.url),
        None => format!("*{}*\n{}", story.name, story.url),
    }
}

/// Header line followed by each story. `None` for an empty category.
pub fn render_section(category: Category, stories: &[&StoryAggregate]) -> Option<String> {
    if stories.is_empty() {
        return None;
    }
    let body = stories
        .iter()
        .map(|s| format_story(s))
        .collect::<Vec<_>>()
        .join("\n");
    Some(format!("{}\n{}", category.header(), body))
}

/// "Mon Oct 19"
pub fn date_line(date: NaiveDate) -> String {
    date.format("%a %b %d").to_string()
}

/// Partition stories by category, keeping their incoming order inside each.
pub fn partition<'a>(
    stories: &'a [StoryAggregate],
    options: &ClassifyOptions,
) -> BTreeMap<Category, Vec<&'a StoryAggregate>> {
    let mut sections: BTreeMap<Category, Vec<&StoryAggregate>> = BTreeMap::new();
    for story in stories {
        sections.entry(classify(story, options)).or_default().push(story);
    }
    sections
}

/// The full daily message: date line, blank line, then the non-empty sections
/// separated by blank lines.
pub fn render_daily(stories: &[StoryAggregate], date: NaiveDate, options: &ClassifyOptions) -> String {
    let sections = partition(stories, options)
        .into_iter()
        .filter_map(|(category, stories)| render_section(category, &stories))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("{}:\n\n{}", date_line(date), sections)
}
