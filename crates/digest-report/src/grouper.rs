//! Story grouper — folds an oldest-first activity list into one aggregate
//! per story, then pulls in stories that only show up in the day's snapshot.

use std::collections::BTreeMap;

use digest_core::types::{Activity, Resource, SnapshotEntry, Story};

/// Everything the digest knows about one story after a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryAggregate {
    pub id: u64,
    pub name: String,
    pub url: String,
    /// Transition labels, oldest first.
    pub transitions: Vec<String>,
    /// Latest comment that carried the report marker, marker removed.
    pub comment: Option<String>,
    /// State observed in the snapshot, for stories with no activity today.
    pub state: Option<String>,
}

impl StoryAggregate {
    fn fill_from(&mut self, resource: &Resource) {
        if self.name.is_empty() {
            self.name = resource.name.clone().unwrap_or_default();
        }
        if self.url.is_empty() {
            self.url = resource.url.clone().unwrap_or_default();
        }
    }
}

/// Owns the id → aggregate map for a single run.
pub struct StoryGrouper {
    stories: BTreeMap<u64, StoryAggregate>,
    marker: String,
}

impl StoryGrouper {
    /// `marker` is the sequence a comment must contain to be reported.
    pub fn new(marker: &str) -> Self {
        Self {
            stories: BTreeMap::new(),
            marker: marker.to_string(),
        }
    }

    /// Get the aggregate for `id`, creating an empty one on first sight.
    pub fn upsert(&mut self, id: u64) -> &mut StoryAggregate {
        self.stories.entry(id).or_insert_with(|| StoryAggregate {
            id,
            ..Default::default()
        })
    }

    /// Fold a list of activities, oldest first.
    pub fn fold<'a, I>(&mut self, activities: I)
    where
        I: IntoIterator<Item = &'a Activity>,
    {
        for activity in activities {
            self.apply(activity);
        }
    }

    /// Fold a single activity.
    pub fn apply(&mut self, activity: &Activity) {
        let Some(resource) = activity.story_resource() else {
            return;
        };

        if activity.kind.is_story_event() {
            let story = self.upsert(resource.id);
            story.fill_from(resource);
            if activity.was_rejected() {
                story.transitions.push("rejected".to_string());
            }
            story.transitions.push(activity.highlight.clone());
        } else if activity.kind.is_comment_event() {
            let Some(comment) = annotated_comment(activity, &self.marker) else {
                return;
            };
            let story = self.upsert(resource.id);
            story.fill_from(resource);
            story.comment = Some(comment);
        }
    }

    /// Pull in snapshot stories whose state is one of `tracked_states`.
    /// Stories without a snapshot entry are left alone.
    pub fn merge_snapshot(
        &mut self,
        stories: &[Story],
        snapshot: &[SnapshotEntry],
        tracked_states: &[String],
    ) {
        for story in stories {
            let Some(entry) = snapshot.iter().find(|s| s.story_id == story.id) else {
                tracing::debug!("Story {} has no snapshot entry, skipping", story.id);
                continue;
            };
            if !tracked_states.iter().any(|s| *s == entry.state) {
                continue;
            }
            let aggregate = self.upsert(story.id);
            aggregate.state = Some(entry.state.clone());
            aggregate.name = story.name.clone();
            aggregate.url = story.url.clone();
        }
    }

    /// Finalize the run, yielding aggregates in ascending id order.
    pub fn finish(self) -> Vec<StoryAggregate> {
        self.stories.into_values().collect()
    }
}

/// Text of the first comment change containing `marker`, with every
/// occurrence of the marker removed and surrounding whitespace trimmed,
/// so `"<=> waiting"` reports as `"waiting"`, not `" waiting"`.
/// A comment that is only the marker reports nothing.
pub fn annotated_comment(activity: &Activity, marker: &str) -> Option<String> {
    if marker.is_empty() {
        return None;
    }
    activity
        .changes
        .iter()
        .filter(|c| c.kind == "comment")
        .filter_map(|c| c.new_values.as_ref()?.text.as_deref())
        .find(|text| text.contains(marker))
        .map(|text| text.replace(marker, "").trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Group an oldest-first activity list in one call.
pub fn group_activities(activities: &[Activity], marker: &str) -> Vec<StoryAggregate> {
    let mut grouper = StoryGrouper::new(marker);
    grouper.fold(activities);
    grouper.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn story_activity(kind: &str, id: u64, highlight: &str, was: Option<&str>) -> Activity {
        let changes = match was {
            Some(state) => json!([{
                "kind": "story",
                "change_type": "update",
                "original_values": {"current_state": state},
                "new_values": {"current_state": highlight}
            }]),
            None => json!([]),
        };
        serde_json::from_value(json!({
            "kind": kind,
            "highlight": highlight,
            "project": {"id": 99},
            "primary_resources": [{
                "kind": "story",
                "id": id,
                "name": format!("Story {id}"),
                "url": format!("https://tracker/story/{id}")
            }],
            "changes": changes
        }))
        .unwrap()
    }

    fn comment_activity(id: u64, text: &str) -> Activity {
        serde_json::from_value(json!({
            "kind": "comment_create_activity",
            "highlight": "added comment:",
            "project": {"id": 99},
            "primary_resources": [{"kind": "story", "id": id, "name": format!("Story {id}"), "url": "u"}],
            "changes": [
                {"kind": "story", "change_type": "update", "new_values": {}},
                {"kind": "comment", "change_type": "create", "new_values": {"text": text}}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_single_create() {
        let stories = group_activities(
            &[story_activity("story_create_activity", 1, "added", None)],
            "<=>",
        );
        assert_eq!(stories.len(), 1);
        assert_eq!(stories[0].id, 1);
        assert_eq!(stories[0].name, "Story 1");
        assert_eq!(stories[0].url, "https://tracker/story/1");
        assert_eq!(stories[0].transitions, vec!["added"]);
        assert_eq!(stories[0].comment, None);
    }

    #[test]
    fn test_rejection_is_synthesized_before_highlight() {
        let stories = group_activities(
            &[
                story_activity("story_update_activity", 2, "started", None),
                story_activity("story_update_activity", 2, "accepted", Some("rejected")),
            ],
            "<=>",
        );
        assert_eq!(stories.len(), 1);
        assert_eq!(stories[0].transitions, vec!["started", "rejected", "accepted"]);
    }

    #[test]
    fn test_marked_comment_is_kept_and_stripped() {
        let stories = group_activities(
            &[
                story_activity("story_update_activity", 3, "started", None),
                comment_activity(3, "<=> waiting on design"),
            ],
            "<=>",
        );
        assert_eq!(stories[0].comment.as_deref(), Some("waiting on design"));
        assert_eq!(stories[0].transitions, vec!["started"]);
    }

    #[test]
    fn test_latest_marked_comment_wins() {
        let stories = group_activities(
            &[
                comment_activity(3, "<=>first"),
                comment_activity(3, "unmarked chatter"),
                comment_activity(3, "second <=> note <=>"),
            ],
            "<=>",
        );
        assert_eq!(stories[0].comment.as_deref(), Some("second  note"));
    }

    #[test]
    fn test_unmarked_comment_contributes_nothing() {
        let stories = group_activities(&[comment_activity(4, "just a comment")], "<=>");
        assert!(stories.is_empty());
    }

    #[test]
    fn test_activity_without_story_is_ignored() {
        let activity: Activity = serde_json::from_value(json!({
            "kind": "story_update_activity",
            "highlight": "edited",
            "project": {"id": 99},
            "primary_resources": [{"kind": "epic", "id": 8}]
        }))
        .unwrap();
        assert!(group_activities(&[activity], "<=>").is_empty());
    }

    #[test]
    fn test_other_kinds_are_ignored() {
        let activity = story_activity("story_delete_activity", 5, "deleted", None);
        assert!(group_activities(&[activity], "<=>").is_empty());
    }

    #[test]
    fn test_regrouping_is_stable() {
        let activities = vec![
            story_activity("story_create_activity", 9, "added", None),
            story_activity("story_update_activity", 3, "started", None),
            story_activity("story_update_activity", 9, "started", None),
            story_activity("story_update_activity", 3, "finished", Some("rejected")),
        ];
        let first = group_activities(&activities, "<=>");
        let second = group_activities(&activities, "<=>");
        assert_eq!(first, second);
        assert_eq!(first.iter().map(|s| s.id).collect::<Vec<_>>(), vec![3, 9]);
        assert_eq!(first[0].transitions, vec!["started", "rejected", "finished"]);
    }

    #[test]
    fn test_upsert_reuses_aggregate() {
        let mut grouper = StoryGrouper::new("<=>");
        grouper.upsert(1).transitions.push("added".into());
        grouper.upsert(1).transitions.push("started".into());
        let out = grouper.finish();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].transitions, vec!["added", "started"]);
    }

    #[test]
    fn test_merge_snapshot_tracked_states_only() {
        let mut grouper = StoryGrouper::new("<=>");
        grouper.fold(&[story_activity("story_update_activity", 1, "started", None)]);

        let stories = vec![
            Story { id: 1, name: "One".into(), url: "u1".into(), current_state: None },
            Story { id: 2, name: "Two".into(), url: "u2".into(), current_state: None },
            Story { id: 3, name: "Three".into(), url: "u3".into(), current_state: None },
            Story { id: 4, name: "Four".into(), url: "u4".into(), current_state: None },
        ];
        let snapshot = vec![
            SnapshotEntry { story_id: 1, state: "started".into() },
            SnapshotEntry { story_id: 2, state: "finished".into() },
            SnapshotEntry { story_id: 3, state: "unstarted".into() },
        ];
        let tracked: Vec<String> = vec!["finished".into(), "started".into(), "rejected".into()];
        grouper.merge_snapshot(&stories, &snapshot, &tracked);

        let out = grouper.finish();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].transitions, vec!["started"]);
        assert_eq!(out[0].state.as_deref(), Some("started"));
        assert_eq!(out[0].name, "One");
        assert_eq!(out[1].id, 2);
        assert!(out[1].transitions.is_empty());
        assert_eq!(out[1].state.as_deref(), Some("finished"));
        assert_eq!(out[1].url, "u2");
    }

    #[test]
    fn test_marker_strip_trims_whitespace() {
        let activity = comment_activity(1, "<=> waiting\n");
        assert_eq!(annotated_comment(&activity, "<=>").as_deref(), Some("waiting"));
        let activity = comment_activity(1, "  <=>  ");
        assert_eq!(annotated_comment(&activity, "<=>"), None);
    }

    #[test]
    fn test_empty_marker_never_matches() {
        let activity = comment_activity(1, "anything");
        assert!(annotated_comment(&activity, "").is_none());
    }
}
