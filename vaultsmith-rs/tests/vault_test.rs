//! End-to-end library tests against a temporary vault.

mod common;

use chrono::NaiveDate;
use common::{create_test_vault, open, read};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use vaultsmith::graph::{Direction, LinkGraph};
use vaultsmith::mutation::{MatchPolicy, NewNode, NodeSpec, Position};
use vaultsmith::parser::parse_board;
use vaultsmith::query::{TaskFilter, TaskSort, find_notes_by_tag, search_fields, search_tasks};
use vaultsmith::stats::VaultStats;
use vaultsmith::error::ErrorKind;
use vaultsmith::{Mutation, Mutator, Note, Priority, VaultError};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

mod scanning {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lists_notes_and_skips_app_directory() {
        let temp = create_test_vault();
        let notes = open(&temp).list_notes().unwrap();
        assert_eq!(
            notes,
            vec![
                PathBuf::from("Beta.md"),
                PathBuf::from("Board.md"),
                PathBuf::from("Home.md"),
                PathBuf::from("Lonely.md"),
                PathBuf::from("Projects/Alpha.md"),
                PathBuf::from("Projects/Gamma.md"),
            ]
        );
    }

    #[test]
    fn diagrams_are_scanned_separately() {
        let temp = create_test_vault();
        let vault = open(&temp);
        let diagrams: Vec<PathBuf> = vault.diagrams().unwrap().iter().collect();
        assert_eq!(diagrams, vec![PathBuf::from("Map.canvas")]);
    }
}

mod link_graph {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn backlinks_broken_links_and_orphans() {
        let temp = create_test_vault();
        let graph = LinkGraph::build(&open(&temp)).unwrap();

        let sources: Vec<&Path> = graph
            .backlinks(Path::new("Projects/Alpha.md"))
            .iter()
            .map(|e| e.source.as_path())
            .collect();
        assert_eq!(sources, vec![Path::new("Home.md"), Path::new("Projects/Gamma.md")]);

        // the app directory's link to Home is not part of the vault
        assert_eq!(graph.backlinks(Path::new("Home.md")).len(), 1);

        let broken = graph.broken_links();
        assert_eq!(broken.len(), 1);
        assert_eq!(broken[0].target, "Missing Page");
        assert_eq!(broken[0].line, 7);

        let orphans: Vec<&PathBuf> = graph.orphans();
        assert_eq!(orphans, vec![&PathBuf::from("Board.md"), &PathBuf::from("Lonely.md")]);
    }

    #[test]
    fn hubs_and_connectivity() {
        let temp = create_test_vault();
        let graph = LinkGraph::build(&open(&temp)).unwrap();

        let hubs = graph.hubs(None, 1);
        assert_eq!(hubs[0].path, PathBuf::from("Home.md"));
        assert_eq!(hubs[0].degree, 4);

        let report = graph.connectivity();
        assert_eq!(report.notes, 6);
        assert_eq!(report.resolved, 5);
        assert_eq!(report.broken, 1);
        assert_eq!(report.attachments, 1);
        assert_eq!(report.zero_degree, 2);
    }

    #[test]
    fn connections_by_distance() {
        let temp = create_test_vault();
        let graph = LinkGraph::build(&open(&temp)).unwrap();
        let hops = graph.connections(Path::new("Beta.md"), 2, Direction::Both);
        assert_eq!(hops.len(), 2);
        assert_eq!(hops[0].notes, vec![PathBuf::from("Home.md")]);
        assert_eq!(
            hops[1].notes,
            vec![PathBuf::from("Projects/Alpha.md"), PathBuf::from("Projects/Gamma.md")]
        );

        let outgoing = graph.connections(Path::new("Beta.md"), 2, Direction::Outgoing);
        assert!(outgoing.is_empty());
    }
}

mod mutations {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn insert_after_heading_lands_inside_section() {
        let temp = create_test_vault();
        let vault = open(&temp);
        let outcome = Mutator::new(&vault)
            .apply(&Mutation::InsertAfterHeading {
                path: "Projects/Alpha.md".into(),
                heading: "Tasks".into(),
                content: "- [ ] Review".into(),
                policy: MatchPolicy::First,
            })
            .unwrap();
        assert!(outcome.changed);
        assert_eq!(outcome.line, Some(6));
        assert!(read(&temp, "Projects/Alpha.md").contains("✅ 2025-01-02\n- [ ] Review\n\n## Notes"));
    }

    #[test]
    fn failed_edit_leaves_file_untouched() {
        let temp = create_test_vault();
        let vault = open(&temp);
        let err = Mutator::new(&vault)
            .apply(&Mutation::InsertAfterHeading {
                path: "Projects/Alpha.md".into(),
                heading: "Nowhere".into(),
                content: "x".into(),
                policy: MatchPolicy::First,
            })
            .unwrap_err();
        assert!(matches!(err, VaultError::HeadingNotFound { .. }));
        assert_eq!(read(&temp, "Projects/Alpha.md"), common::ALPHA);
    }

    #[test]
    fn tag_round_trip_restores_bytes() {
        let temp = create_test_vault();
        let vault = open(&temp);
        let mutator = Mutator::new(&vault);
        let before = read(&temp, "Lonely.md");

        mutator
            .apply(&Mutation::AddTag {
                path: "Lonely.md".into(),
                tag: "review".into(),
            })
            .unwrap();
        let tagged = vault.load_note(Path::new("Lonely.md")).unwrap();
        assert!(tagged.tag_set().iter().any(|t| t.name == "review"));

        mutator
            .apply(&Mutation::RemoveTag {
                path: "Lonely.md".into(),
                tag: "#Review".into(),
            })
            .unwrap();
        assert_eq!(read(&temp, "Lonely.md"), before);
    }

    #[test]
    fn toggle_task_stamps_done_date() {
        let temp = create_test_vault();
        let vault = open(&temp);
        let outcome = Mutator::new(&vault)
            .apply(&Mutation::ToggleTask {
                path: "Projects/Alpha.md".into(),
                line: 4,
                done_date: Some(date("2025-01-05")),
            })
            .unwrap();
        assert_eq!(outcome.completed, Some(true));
        let line = read(&temp, "Projects/Alpha.md").lines().nth(3).unwrap().to_string();
        assert!(line.starts_with("- [x] Write draft"));
        assert!(line.contains("✅ 2025-01-05"));
    }

    #[test]
    fn move_card_between_columns() {
        let temp = create_test_vault();
        let vault = open(&temp);
        Mutator::new(&vault)
            .apply(&Mutation::MoveCard {
                path: "Board.md".into(),
                from_column: "Todo".into(),
                card: "Draft post".into(),
                to_column: "Done".into(),
                position: Position::Start,
            })
            .unwrap();

        let board = parse_board(&read(&temp, "Board.md"));
        let titles = |name: &str| -> Vec<String> {
            board.column(name).unwrap().cards.iter().map(|c| c.title.clone()).collect()
        };
        assert_eq!(titles("Todo"), vec!["Fix bug"]);
        assert_eq!(titles("Done"), vec!["Draft post", "Ship v1"]);
        assert_eq!(board.card_count(), 3);
    }

    #[test]
    fn canvas_node_added_and_unknown_card_rejected() {
        let temp = create_test_vault();
        let vault = open(&temp);
        let mutator = Mutator::new(&vault);

        let outcome = mutator
            .apply(&Mutation::AddNode {
                path: "Map.canvas".into(),
                node: NewNode::new(NodeSpec::Text { text: "Next".into() }),
            })
            .unwrap();
        let id = outcome.created_id.unwrap();
        let diagram = vault.load_diagram(Path::new("Map.canvas")).unwrap();
        assert_eq!(diagram.nodes.len(), 3);
        assert!(diagram.node(&id).is_some());

        let err = mutator
            .apply(&Mutation::MoveCard {
                path: "Board.md".into(),
                from_column: "Todo".into(),
                card: "Nope".into(),
                to_column: "Done".into(),
                position: Position::End,
            })
            .unwrap_err();
        assert!(matches!(err, VaultError::CardNotFound { .. }));
        assert_eq!(read(&temp, "Board.md"), common::BOARD);
    }

    #[test]
    fn removing_node_cascades_to_edges() {
        let temp = create_test_vault();
        let vault = open(&temp);
        let mutator = Mutator::new(&vault);

        let err = mutator
            .apply(&Mutation::RemoveNode {
                path: "Map.canvas".into(),
                node_id: "a".into(),
                cascade: false,
            })
            .unwrap_err();
        assert!(matches!(err, VaultError::CascadeRequired { edges: 1, .. }));
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(read(&temp, "Map.canvas"), common::MAP);

        let outcome = mutator
            .apply(&Mutation::RemoveNode {
                path: "Map.canvas".into(),
                node_id: "a".into(),
                cascade: true,
            })
            .unwrap();
        assert_eq!(outcome.removed_edges, vec!["e1".to_string()]);
        let diagram = vault.load_diagram(Path::new("Map.canvas")).unwrap();
        assert_eq!(diagram.nodes.len(), 1);
        assert!(diagram.edges.is_empty());
    }

    #[test]
    fn duplicate_card_text_is_ambiguous() {
        let temp = create_test_vault();
        let board = "---\nkanban-plugin: basic\n---\n\n## Todo\n\n- [ ] Same\n- [ ] Same\n\n## Done\n\n";
        fs::write(temp.path().join("Dupes.md"), board).unwrap();
        let vault = open(&temp);

        let err = Mutator::new(&vault)
            .apply(&Mutation::MoveCard {
                path: "Dupes.md".into(),
                from_column: "Todo".into(),
                card: "Same".into(),
                to_column: "Done".into(),
                position: Position::End,
            })
            .unwrap_err();
        assert!(matches!(err, VaultError::Ambiguous { what: "card", count: 2, .. }));
        assert_eq!(err.kind(), ErrorKind::Ambiguous);
        assert_eq!(read(&temp, "Dupes.md"), board);
    }

    #[test]
    fn malformed_header_allows_body_edits() {
        let temp = create_test_vault();
        let header = "---\ntitle: [unclosed\n---\n";
        fs::write(temp.path().join("Broken.md"), format!("{header}# Log\n\nentry\n")).unwrap();
        let vault = open(&temp);
        let mutator = Mutator::new(&vault);

        let err = mutator
            .apply(&Mutation::SetHeaderField {
                path: "Broken.md".into(),
                key: "status".into(),
                value: "done".into(),
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);

        mutator
            .apply(&Mutation::InsertAfterHeading {
                path: "Broken.md".into(),
                heading: "Log".into(),
                content: "- first".into(),
                policy: MatchPolicy::First,
            })
            .unwrap();
        mutator
            .apply(&Mutation::Append {
                path: "Broken.md".into(),
                content: "last".into(),
            })
            .unwrap();
        assert_eq!(
            read(&temp, "Broken.md"),
            format!("{header}# Log\n- first\n\nentry\nlast\n")
        );
    }

    #[test]
    fn note_without_trailing_newline_round_trips() {
        let temp = create_test_vault();
        let raw = "# Raw\n\nSee [[Home]]\nno newline at end";
        fs::write(temp.path().join("Raw.md"), raw).unwrap();
        let vault = open(&temp);

        let note = vault.load_note(Path::new("Raw.md")).unwrap();
        assert_eq!(note.to_string(), raw);
        assert_eq!(Note::parse("x.md", "a\nb").to_string(), "a\nb");

        Mutator::new(&vault)
            .apply(&Mutation::InsertAfterHeading {
                path: "Raw.md".into(),
                heading: "Raw".into(),
                content: "- added".into(),
                policy: MatchPolicy::First,
            })
            .unwrap();
        let edited = read(&temp, "Raw.md");
        assert_eq!(edited, "# Raw\n- added\n\nSee [[Home]]\nno newline at end");
    }
}

mod queries {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn notes_by_nested_tag() {
        let temp = create_test_vault();
        let found = find_notes_by_tag(&open(&temp), "#project").unwrap();
        let paths: Vec<&Path> = found.notes.iter().map(|f| f.path.as_path()).collect();
        assert_eq!(paths, vec![Path::new("Beta.md"), Path::new("Projects/Gamma.md")]);
    }

    #[test]
    fn fields_and_tasks() {
        let temp = create_test_vault();
        let vault = open(&temp);

        let fields = search_fields(&vault, "Status", Some("ACTIVE")).unwrap();
        assert_eq!(fields.matches.len(), 1);
        assert_eq!(fields.matches[0].field.line, 8);
        assert!(fields.skipped.is_empty());

        let urgent = TaskFilter {
            priority: Some(Priority::Highest),
            ..TaskFilter::default()
        };
        let found =
            search_tasks(&vault, &urgent, TaskSort::Due, false, None, date("2025-01-05")).unwrap();
        assert_eq!(found.total, 1);
        assert_eq!(found.tasks[0].location.file, PathBuf::from("Projects/Alpha.md"));
        assert_eq!(found.tasks[0].due, Some(date("2025-01-10")));
    }

    #[test]
    fn vault_statistics() {
        let temp = create_test_vault();
        let stats = VaultStats::collect(&open(&temp)).unwrap();
        assert_eq!(stats.notes, 6);
        assert_eq!(stats.broken_links, 1);
        assert_eq!(stats.orphans, 2);
        assert_eq!(stats.tag_frequencies.get("project"), Some(&1));
        assert_eq!(stats.in_links.max, 2);
    }
}
