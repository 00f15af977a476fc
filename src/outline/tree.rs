//! Read-only walks over the idea forest.

use super::IdeaNode;

/// The children of a node: `sub_ideas` if present, else `nested_sub_ideas`, else nothing.
pub fn children_of(node: &IdeaNode) -> &[IdeaNode] {
    node.sub_ideas
        .as_deref()
        .or(node.nested_sub_ideas.as_deref())
        .unwrap_or(&[])
}

/// Count every node in the forest, roots included.
pub fn count_nodes(forest: &[IdeaNode]) -> usize {
    forest
        .iter()
        .map(|node| 1 + count_nodes(children_of(node)))
        .sum()
}

/// Visit `node` and all its descendants depth-first in array order.
/// The callback receives the depth relative to `node` (0 for `node` itself).
pub fn visit_depth_first<F>(node: &IdeaNode, f: &mut F)
where
    F: FnMut(&IdeaNode, usize),
{
    fn walk<F: FnMut(&IdeaNode, usize)>(node: &IdeaNode, depth: usize, f: &mut F) {
        f(node, depth);
        for child in children_of(node) {
            walk(child, depth + 1, f);
        }
    }
    walk(node, 0, f);
}

/// True if the node or any descendant has non-blank content.
pub fn has_content(node: &IdeaNode) -> bool {
    node.content.as_deref().is_some_and(|c| !c.trim().is_empty())
        || children_of(node).iter().any(has_content)
}

/// Concatenate title and content of a node and its descendants into an indented outline.
///
/// Traversal follows array order, so the output is stable for a given tree.
pub fn aggregate_content(node: &IdeaNode) -> String {
    let mut out = String::new();
    aggregate_into(node, "", &mut out);
    out
}

fn aggregate_into(node: &IdeaNode, indent: &str, out: &mut String) {
    out.push_str(&format!("{}- {}\n", indent, node.title));

    if let Some(content) = node.content.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        for line in content.lines() {
            out.push_str(&format!("{}  {}\n", indent, line));
        }
    }

    let children = children_of(node);
    if !children.is_empty() {
        out.push_str(&format!("{}  Subtopics:\n", indent));
        let child_indent = format!("{}    ", indent);
        for child in children {
            aggregate_into(child, &child_indent, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forest(main: usize, subs: usize, nested: usize) -> Vec<IdeaNode> {
        (1..=main)
            .map(|i| {
                IdeaNode::new(i.to_string(), 1, format!("Idea {}", i)).with_children(
                    (1..=subs)
                        .map(|j| {
                            IdeaNode::new(format!("{}.{}", i, j), 2, format!("Sub {}.{}", i, j))
                                .with_children(
                                    (1..=nested)
                                        .map(|k| {
                                            IdeaNode::new(
                                                format!("{}.{}.{}", i, j, k),
                                                3,
                                                format!("Nested {}.{}.{}", i, j, k),
                                            )
                                        })
                                        .collect(),
                                )
                        })
                        .collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_count_nodes_full_tree() {
        assert_eq!(count_nodes(&forest(5, 2, 1)), 25);
    }

    #[test]
    fn test_count_nodes_without_children() {
        let flat = vec![
            IdeaNode::new("1", 1, "A"),
            IdeaNode::new("2", 1, "B").with_children(vec![]),
            IdeaNode::new("3", 1, "C"),
        ];
        assert_eq!(count_nodes(&flat), 3);
        assert_eq!(count_nodes(&[]), 0);
    }

    #[test]
    fn test_children_of_prefers_sub_ideas() {
        let node = IdeaNode::new("1", 1, "A").with_children(vec![IdeaNode::new("1.1", 2, "B")]);
        assert_eq!(children_of(&node).len(), 1);

        let leaf = IdeaNode::new("1.1.1", 3, "C");
        assert!(children_of(&leaf).is_empty());
    }

    #[test]
    fn test_aggregate_content_is_indented_and_ordered() {
        let node = IdeaNode::new("1", 1, "Forms")
            .with_content("Ideas are eternal.\nThey are perfect.")
            .with_children(vec![
                IdeaNode::new("1.1", 2, "Hyperuranion").with_content("Beyond the sky."),
                IdeaNode::new("1.2", 2, "Dualism"),
            ]);

        let expected = "- Forms\n  Ideas are eternal.\n  They are perfect.\n  Subtopics:\n    - Hyperuranion\n      Beyond the sky.\n    - Dualism\n";
        assert_eq!(aggregate_content(&node), expected);
        assert_eq!(aggregate_content(&node), aggregate_content(&node.clone()));
    }

    #[test]
    fn test_has_content_looks_at_descendants() {
        let empty = IdeaNode::new("1", 1, "A").with_content("   ");
        assert!(!has_content(&empty));

        let deep = IdeaNode::new("1", 1, "A").with_children(vec![IdeaNode::new("1.1", 2, "B")
            .with_children(vec![IdeaNode::new("1.1.1", 3, "C").with_content("text")])]);
        assert!(has_content(&deep));
    }

    #[test]
    fn test_visit_depth_first_reports_depth() {
        let tree = &forest(1, 2, 1)[0];
        let mut seen = Vec::new();
        visit_depth_first(tree, &mut |node, depth| seen.push((node.id.clone(), depth)));
        assert_eq!(
            seen,
            vec![
                ("1".to_string(), 0),
                ("1.1".to_string(), 1),
                ("1.1.1".to_string(), 2),
                ("1.2".to_string(), 1),
                ("1.2.1".to_string(), 2),
            ]
        );
    }
}
