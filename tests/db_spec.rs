use cardrank::board::{Board, BoardError};
use cardrank::db::Database;
use cardrank::models::*;
use cardrank::rank::{Alphabet, RankError, RankGenerator};
use speculate2::speculate;
use uuid::Uuid;

fn decimal_board(max_len: usize) -> Board {
    let alphabet = Alphabet::new("0123456789").expect("valid alphabet");
    Board::new(RankGenerator::new(alphabet, max_len).expect("valid generator"))
}

fn create(db: &Database, board: &Board, bucket: &str, title: &str) -> Card {
    db.create_card(
        board,
        bucket,
        CreateCardInput {
            title: title.to_string(),
            placement: None,
        },
    )
    .expect("Failed to create card")
}

fn import(db: &Database, bucket: &str, title: &str, position: Option<&str>) -> Card {
    db.import_card(bucket, ImportCardInput {
        title: title.to_string(),
        position: position.map(str::to_string),
    })
    .expect("Failed to import card")
}

fn titles(db: &Database, bucket: &str) -> Vec<String> {
    db.get_bucket_cards(bucket)
        .expect("Query failed")
        .into_iter()
        .map(|c| c.title)
        .collect()
}

fn move_to(after: Option<&Card>, before: Option<&Card>, bucket: &str) -> MoveCardInput {
    MoveCardInput {
        bucket: bucket.to_string(),
        after: after.map(|c| c.id),
        before: before.map(|c| c.id),
    }
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
        let board = decimal_board(8);
    }

    describe "cards" {
        describe "create_card" {
            it "gives the first card the middle rank" {
                let card = create(&db, &board, "todo", "First");

                assert_eq!(card.bucket, "todo");
                assert_eq!(card.position.as_deref(), Some("5"));
            }

            it "appends to the bottom by default" {
                create(&db, &board, "todo", "A");
                let b = create(&db, &board, "todo", "B");
                let c = create(&db, &board, "todo", "C");

                assert_eq!(b.position.as_deref(), Some("7"));
                assert_eq!(c.position.as_deref(), Some("8"));
                assert_eq!(titles(&db, "todo"), vec!["A", "B", "C"]);
            }

            it "places at the top on request" {
                create(&db, &board, "todo", "A");
                let top = db.create_card(&board, "todo", CreateCardInput {
                    title: "Top".to_string(),
                    placement: Some(Placement::Top),
                }).expect("Failed to create card");

                assert_eq!(top.position.as_deref(), Some("2"));
                assert_eq!(titles(&db, "todo"), vec!["Top", "A"]);
            }

            it "keeps buckets independent" {
                let a = create(&db, &board, "todo", "A");
                let b = create(&db, &board, "done", "B");

                assert_eq!(a.position, b.position);
                assert_eq!(titles(&db, "todo"), vec!["A"]);
                assert_eq!(titles(&db, "done"), vec!["B"]);
            }
        }

        describe "get_bucket_cards" {
            it "lists unranked cards last in insertion order" {
                import(&db, "todo", "Loose 1", None);
                import(&db, "todo", "Ranked", Some("5"));
                import(&db, "todo", "Loose 2", None);

                assert_eq!(titles(&db, "todo"), vec!["Ranked", "Loose 1", "Loose 2"]);
            }

            it "returns an empty list for an unknown bucket" {
                assert!(db.get_bucket_cards("nowhere").expect("Query failed").is_empty());
            }
        }

        describe "delete_card" {
            it "leaves the other positions untouched" {
                let a = create(&db, &board, "todo", "A");
                let b = create(&db, &board, "todo", "B");
                let c = create(&db, &board, "todo", "C");

                assert!(db.delete_card(b.id).expect("Delete failed"));
                assert!(db.get_card(b.id).expect("Query failed").is_none());

                let remaining = db.get_bucket_cards("todo").expect("Query failed");
                assert_eq!(remaining[0].position, a.position);
                assert_eq!(remaining[1].position, c.position);
            }

            it "returns false for a missing card" {
                assert!(!db.delete_card(Uuid::new_v4()).expect("Delete failed"));
            }
        }
    }

    describe "move_card" {
        it "moves a card between two neighbors" {
            let a = create(&db, &board, "todo", "A");
            let b = create(&db, &board, "todo", "B");
            let c = create(&db, &board, "todo", "C");

            let moved = db.move_card(&board, c.id, move_to(Some(&a), Some(&b), "todo"))
                .expect("Move failed");

            assert_eq!(moved.position.as_deref(), Some("6"));
            assert_eq!(titles(&db, "todo"), vec!["A", "C", "B"]);
        }

        it "moves a card to the head of its bucket" {
            let a = create(&db, &board, "todo", "A");
            create(&db, &board, "todo", "B");
            let c = create(&db, &board, "todo", "C");

            db.move_card(&board, c.id, move_to(None, Some(&a), "todo"))
                .expect("Move failed");

            assert_eq!(titles(&db, "todo"), vec!["C", "A", "B"]);
        }

        it "moves a card into an empty bucket" {
            let a = create(&db, &board, "todo", "A");
            create(&db, &board, "todo", "B");

            let moved = db.move_card(&board, a.id, move_to(None, None, "done"))
                .expect("Move failed");

            assert_eq!(moved.bucket, "done");
            assert_eq!(moved.position.as_deref(), Some("5"));
            assert_eq!(titles(&db, "todo"), vec!["B"]);
            assert_eq!(titles(&db, "done"), vec!["A"]);
        }

        it "moves a card to the tail of another bucket" {
            let a = create(&db, &board, "todo", "A");
            let x = create(&db, &board, "done", "X");

            let moved = db.move_card(&board, a.id, move_to(Some(&x), None, "done"))
                .expect("Move failed");

            assert_eq!(moved.position.as_deref(), Some("7"));
            assert_eq!(titles(&db, "done"), vec!["X", "A"]);
        }

        it "rejects neighbors that are no longer adjacent" {
            let a = create(&db, &board, "todo", "A");
            create(&db, &board, "todo", "B");
            let c = create(&db, &board, "todo", "C");
            let d = create(&db, &board, "done", "D");

            let err = db.move_card(&board, d.id, move_to(Some(&a), Some(&c), "todo"))
                .unwrap_err();

            assert!(matches!(err, BoardError::StaleNeighbors { count: 1, .. }));
            let unchanged = db.get_card(d.id).expect("Query failed").expect("Card missing");
            assert_eq!(unchanged.bucket, "done");
            assert_eq!(unchanged.position, d.position);
        }

        it "rejects a neighbor from another bucket" {
            let a = create(&db, &board, "todo", "A");
            let x = create(&db, &board, "done", "X");

            let err = db.move_card(&board, a.id, move_to(Some(&x), None, "todo"))
                .unwrap_err();

            assert!(matches!(err, BoardError::NeighborInOtherBucket { .. }));
        }

        it "reports an unknown card" {
            let err = db.move_card(&board, Uuid::new_v4(), move_to(None, None, "todo"))
                .unwrap_err();

            assert!(err.is_not_found());
        }

        it "surfaces a neighbor with an invalid stored rank" {
            let bad = import(&db, "todo", "Bad", Some("4x"));
            let card = create(&db, &board, "done", "Card");

            let err = db.move_card(&board, card.id, move_to(Some(&bad), None, "todo"))
                .unwrap_err();

            assert!(matches!(err, BoardError::Rank(RankError::InvalidChars { .. })));
        }

        it "rebalances the bucket when the gap is exhausted" {
            let board = decimal_board(2);
            let a = import(&db, "todo", "A", Some("11"));
            let b = import(&db, "todo", "B", Some("12"));
            let moved = import(&db, "other", "Moved", Some("5"));

            let card = db.move_card(&board, moved.id, move_to(Some(&a), Some(&b), "todo"))
                .expect("Move failed");

            assert_eq!(card.position.as_deref(), Some("5"));
            assert_eq!(titles(&db, "todo"), vec!["A", "Moved", "B"]);
            let a = db.get_card(a.id).expect("Query failed").expect("Card missing");
            assert_eq!(a.position.as_deref(), Some("3"));
        }

        it "keeps order through many inserts at the same spot" {
            let head = create(&db, &board, "todo", "Head");
            let mut tail = create(&db, &board, "todo", "Tail");

            for i in 0..20 {
                tail = db.move_card(&board, create(&db, &board, "inbox", &i.to_string()).id,
                    move_to(Some(&head), Some(&tail), "todo"))
                    .expect("Move failed");
            }

            let expected: Vec<String> = std::iter::once("Head".to_string())
                .chain((0..20).rev().map(|i| i.to_string()))
                .chain(std::iter::once("Tail".to_string()))
                .collect();
            assert_eq!(titles(&db, "todo"), expected);
        }
    }

    describe "rebalance_bucket" {
        it "re-spaces positions evenly in display order" {
            import(&db, "todo", "A", Some("1"));
            import(&db, "todo", "B", Some("11"));
            import(&db, "todo", "C", Some("111"));

            let cards = db.rebalance_bucket(&board, "todo").expect("Rebalance failed");

            let positions: Vec<_> = cards.iter().map(|c| c.position.clone().unwrap_or_default()).collect();
            assert_eq!(positions, vec!["3", "5", "8"]);
            assert_eq!(titles(&db, "todo"), vec!["A", "B", "C"]);
        }

        it "gives unranked cards a position after the ranked ones" {
            import(&db, "todo", "Loose", None);
            import(&db, "todo", "Ranked", Some("9"));

            let cards = db.rebalance_bucket(&board, "todo").expect("Rebalance failed");

            assert!(cards.iter().all(|c| c.position.is_some()));
            assert_eq!(titles(&db, "todo"), vec!["Ranked", "Loose"]);
        }
    }

    describe "positions" {
        before {
            let a = import(&db, "todo", "A", Some("2"));
            let b = import(&db, "todo", "B", Some("2"));
            let c = import(&db, "todo", "C", None);
            let d = import(&db, "todo", "D", Some("5"));
            import(&db, "done", "E", Some("4x"));
        }

        it "analyzes missing, invalid and duplicate positions" {
            let analysis = db.analyze_positions(board.generator()).expect("Analysis failed");

            assert_eq!(analysis.total, 5);
            assert_eq!(analysis.missing_positions, 1);
            assert_eq!(analysis.invalid_positions, 1);
            assert_eq!(analysis.duplicates, 1);
            assert_eq!(analysis.buckets.get("todo"), Some(&4));
        }

        it "plans without writing on a dry run" {
            let plan = db.repair_positions(&board, RepairStrategy::FixAll, &RepairFilter::default(), true)
                .expect("Repair failed");

            assert_eq!(plan.len(), 3);
            let b = db.get_card(b.id).expect("Query failed").expect("Card missing");
            assert_eq!(b.position.as_deref(), Some("2"));
        }

        it "fixes duplicates and missing positions" {
            let plan = db.repair_positions(&board, RepairStrategy::FixAll, &RepairFilter {
                buckets: vec!["todo".to_string()],
                ids: vec![],
            }, false).expect("Repair failed");

            assert_eq!(plan.len(), 2);
            let todo = &plan.changes["todo"];
            assert_eq!(todo[0], PositionChange { card_id: b.id, old: Some("2".to_string()), new: "3".to_string() });
            assert_eq!(todo[1], PositionChange { card_id: c.id, old: None, new: "7".to_string() });

            assert_eq!(titles(&db, "todo"), vec!["A", "B", "D", "C"]);
            let after = db.analyze_positions(board.generator()).expect("Analysis failed");
            assert_eq!(after.duplicates, 0);
            assert_eq!(after.missing_positions, 0);
            assert_eq!(after.invalid_positions, 1);
        }

        it "limits fixes to the given cards" {
            let plan = db.repair_positions(&board, RepairStrategy::FixMissing, &RepairFilter {
                buckets: vec![],
                ids: vec![c.id],
            }, false).expect("Repair failed");

            assert_eq!(plan.len(), 1);
            let a = db.get_card(a.id).expect("Query failed").expect("Card missing");
            assert_eq!(a.position.as_deref(), Some("2"));
        }

        it "regenerates whole buckets" {
            let plan = db.repair_positions(&board, RepairStrategy::Regenerate, &RepairFilter {
                buckets: vec!["todo".to_string()],
                ids: vec![],
            }, false).expect("Repair failed");

            assert!(!plan.is_empty());
            let positions: Vec<_> = db.get_bucket_cards("todo").expect("Query failed")
                .into_iter()
                .map(|c| c.position.unwrap_or_default())
                .collect();
            assert_eq!(positions, vec!["2", "4", "6", "8"]);
            assert_eq!(titles(&db, "todo"), vec!["A", "B", "D", "C"]);
            let d = db.get_card(d.id).expect("Query failed").expect("Card missing");
            assert_eq!(d.position.as_deref(), Some("6"));
        }
    }

    describe "storage" {
        it "persists positions across reopen" {
            let dir = tempfile::tempdir().expect("Failed to create temp dir");
            let path = dir.path().join("nested").join("cards.db");

            {
                let db = Database::open(path.clone()).expect("Failed to open database");
                db.migrate().expect("Failed to run migrations");
                create(&db, &board, "todo", "A");
                create(&db, &board, "todo", "B");
            }

            let db = Database::open(path).expect("Failed to reopen database");
            db.migrate().expect("Failed to run migrations");
            assert_eq!(titles(&db, "todo"), vec!["A", "B"]);
        }
    }
}
