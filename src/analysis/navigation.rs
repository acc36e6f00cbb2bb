use crate::model::SectionNode;

pub const READING_STAGES: &[&str] = &[
    "introduction",
    "literature",
    "method",
    "results",
    "discussion",
    "conclusion",
];

/// Canonical reading order: for each stage, the first top-level chapter
/// whose title mentions it, followed by that chapter's direct children.
/// A chapter matching several stages is listed at each of them.
pub fn build_navigation_path(forest: &[SectionNode]) -> Vec<String> {
    let lowered_titles = forest
        .iter()
        .map(|node| node.title.to_lowercase())
        .collect::<Vec<String>>();
    let mut path = Vec::new();

    for stage in READING_STAGES {
        let Some(index) = forest
            .iter()
            .zip(&lowered_titles)
            .position(|(node, title)| node.kind.is_chapter() && title.contains(stage))
        else {
            continue;
        };

        let chapter = &forest[index];
        path.push(chapter.id.clone());
        path.extend(chapter.children.iter().map(|child| child.id.clone()));
    }

    path
}
