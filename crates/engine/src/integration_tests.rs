//! End-to-end tests over the in-memory store adapter: full App wiring,
//! real repositories, real coalescer, no mocks.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use accord_domain::{
    AgreementStatus, GameStatus, Party, UserId,
};

use crate::app::App;
use crate::config::EngineConfig;
use crate::infrastructure::identity::FixedIdentity;
use crate::infrastructure::ports::{PathStore, RepoError};
use crate::infrastructure::store::{collections, MemoryPathStore, Path};
use crate::use_cases::Resolved;

fn test_config() -> EngineConfig {
    EngineConfig {
        debounce_window: Duration::from_millis(50),
        shard_threshold: 5,
        ..EngineConfig::default()
    }
}

fn test_app() -> (App, Arc<MemoryPathStore>) {
    App::in_memory(FixedIdentity::anonymous(), test_config())
}

#[tokio::test]
async fn vocabulary_create_is_idempotent() {
    let (app, _) = test_app();
    let first = app.repos.vocab.create_value("Mutual Aid").await.expect("create");
    let second = app.repos.vocab.create_value("Mutual Aid").await.expect("recreate");

    assert_eq!(first.id, second.id);
    assert_eq!(first.id.as_str(), "value_mutual-aid");
    let all = app.repos.vocab.get_all_values().await.expect("list");
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn vocabulary_renames_keep_the_slug_and_deletes_hide_from_listings() {
    let (app, _) = test_app();
    let value = app.repos.vocab.create_value("Mutual Aid").await.expect("value");
    let cap = app.repos.vocab.create_capability("Weaving").await.expect("capability");

    app.repos
        .vocab
        .update_value(&value.id, "Mutual Support")
        .await
        .expect("rename");
    let renamed = app.repos.vocab.get_value(&value.id).await.expect("reread");
    assert_eq!(renamed.name, "Mutual Support");
    assert_eq!(renamed.id.as_str(), "value_mutual-aid");

    app.repos.vocab.soft_delete_capability(&cap.id).await.expect("delete");
    let deleted = app.repos.vocab.get_capability(&cap.id).await.expect("still resolvable");
    assert!(deleted.deleted);
    assert!(app
        .repos
        .vocab
        .get_all_capabilities()
        .await
        .expect("list")
        .is_empty());
}

#[tokio::test]
async fn card_value_links_are_symmetric() {
    let (app, _) = test_app();
    let card = app
        .repos
        .cards
        .create("Weaver", "keeps the looms running", "craft")
        .await
        .expect("card");
    let value = app.repos.vocab.create_value("Honesty").await.expect("value");

    app.repos.cards.add_value(&card.id, &value.id).await.expect("link");
    let from_card = app.repos.cards.value_ids(&card.id).await.expect("card side");
    let from_value = app.repos.vocab.value_card_ids(&value.id).await.expect("value side");
    assert_eq!(from_card, vec![value.id.clone()]);
    assert_eq!(from_value, vec![card.id.clone()]);

    app.repos.cards.remove_value(&card.id, &value.id).await.expect("unlink");
    assert!(app.repos.cards.value_ids(&card.id).await.expect("card side").is_empty());
    assert!(app
        .repos
        .vocab
        .value_card_ids(&value.id)
        .await
        .expect("value side")
        .is_empty());
}

#[tokio::test]
async fn game_status_follows_the_lifecycle() {
    let (app, _) = test_app();
    let game = app.repos.games.create("Commons", None).await.expect("create");
    assert_eq!(game.status, GameStatus::Created);

    for next in [
        GameStatus::Setup,
        GameStatus::Active,
        GameStatus::Paused,
        GameStatus::Active,
        GameStatus::Completed,
    ] {
        app.repos
            .games
            .update_status(&game.id, next, false)
            .await
            .expect("legal transition");
    }

    let err = app
        .repos
        .games
        .update_status(&game.id, GameStatus::Active, false)
        .await
        .expect_err("completed games do not reopen");
    assert!(matches!(err, RepoError::IllegalTransition { .. }));

    // Admin override reopens it anyway; re-asserting is a no-op.
    let reopened = app
        .repos
        .games
        .update_status(&game.id, GameStatus::Active, true)
        .await
        .expect("forced");
    assert_eq!(reopened.status, GameStatus::Active);
    app.repos
        .games
        .update_status(&game.id, GameStatus::Active, false)
        .await
        .expect("same-status no-op");
}

#[tokio::test]
async fn game_create_stamps_the_current_principal() {
    let principal = UserId::new();
    let (app, _) = App::in_memory(FixedIdentity::of(principal.clone()), test_config());
    let game = app.repos.games.create("Stamped", None).await.expect("create");
    assert_eq!(game.creator_ref, Some(principal.clone()));

    let reread = app.repos.games.get_by_id(&game.id).await.expect("reread");
    assert_eq!(reread.creator_ref, Some(principal));
}

#[tokio::test]
async fn game_update_can_unset_the_deck() {
    use crate::infrastructure::persistence::GameUpdate;

    let (app, _) = test_app();
    let deck = app.repos.decks.create("Starter").await.expect("deck");
    let game = app
        .repos
        .games
        .create("Village", Some(deck.id.clone()))
        .await
        .expect("game");

    app.repos
        .games
        .update(
            &game.id,
            GameUpdate {
                deck_ref: Some(None),
                ..Default::default()
            },
        )
        .await
        .expect("unset");
    let reread = app.repos.games.get_by_id(&game.id).await.expect("reread");
    assert_eq!(reread.deck_ref, None);

    // And back again.
    app.repos
        .games
        .update(
            &game.id,
            GameUpdate {
                deck_ref: Some(Some(deck.id.clone())),
                ..Default::default()
            },
        )
        .await
        .expect("reset");
    let reread = app.repos.games.get_by_id(&game.id).await.expect("reread");
    assert_eq!(reread.deck_ref, Some(deck.id));
}

#[tokio::test]
async fn player_actor_assignment_round_trips() {
    let (app, _) = test_app();
    let game = app.repos.games.create("Village", None).await.expect("game");
    let user = app.repos.users.create("Sam", None).await.expect("user");
    let actor = app.repos.actors.create("Miller", false).await.expect("actor");

    app.repos.games.add_player(&game.id, &user.id).await.expect("join");
    app.repos
        .games
        .assign_actor(&game.id, &user.id, Some(&actor.id))
        .await
        .expect("assign");

    assert_eq!(app.repos.games.players(&game.id).await.expect("players"), vec![user.id.clone()]);
    assert_eq!(
        app.repos.games.actor_ids(&game.id).await.expect("actors"),
        vec![actor.id.clone()]
    );
    let map = app.repos.games.player_actor_map(&game.id).await.expect("map");
    assert_eq!(map.get(&user.id), Some(&Some(actor.id.clone())));

    app.repos.games.remove_player(&game.id, &user.id).await.expect("leave");
    assert!(app.repos.games.players(&game.id).await.expect("players").is_empty());
    let map = app.repos.games.player_actor_map(&game.id).await.expect("map");
    assert_eq!(map.get(&user.id), None);
}

#[tokio::test]
async fn agreement_parties_round_trip_and_status_is_monotonic() {
    let (app, _) = test_app();
    let game = app.repos.games.create("Treaty", None).await.expect("game");
    let a1 = app.repos.actors.create("Smith", false).await.expect("a1");
    let a2 = app.repos.actors.create("Farmer", false).await.expect("a2");
    let c1 = app.repos.cards.create("Forge", "", "craft").await.expect("c1");
    let c2 = app.repos.cards.create("Field", "", "land").await.expect("c2");
    app.repos.games.add_actor(&game.id, &a1.id).await.expect("register a1");
    app.repos.games.add_actor(&game.id, &a2.id).await.expect("register a2");

    let mut parties = BTreeMap::new();
    parties.insert(
        a1.id.clone(),
        Party {
            card_ref: c1.id.clone(),
            obligation: "shoe the horses".into(),
            benefit: "grain each harvest".into(),
        },
    );
    parties.insert(
        a2.id.clone(),
        Party {
            card_ref: c2.id.clone(),
            obligation: "deliver grain".into(),
            benefit: "tools kept sharp".into(),
        },
    );
    let agreement = app
        .repos
        .agreements
        .create(&game.id, parties)
        .await
        .expect("create");

    let loaded = app.repos.agreements.get_by_id(&agreement.id).await.expect("load");
    assert_eq!(loaded.parties.len(), 2);
    assert_eq!(loaded.parties.get(&a1.id).map(|p| p.card_ref.clone()), Some(c1.id.clone()));
    assert_eq!(
        loaded.parties.get(&a2.id).map(|p| p.obligation.clone()),
        Some("deliver grain".to_string())
    );

    // Membership edges landed on all three owners.
    assert_eq!(
        app.repos.agreements.list_for_game(&game.id).await.expect("game side"),
        vec![agreement.id.clone()]
    );
    assert_eq!(
        app.repos.actors.agreement_ids(&a1.id).await.expect("actor side"),
        vec![agreement.id.clone()]
    );
    assert_eq!(
        app.repos.cards.agreement_ids(&c1.id).await.expect("card side"),
        vec![agreement.id.clone()]
    );

    app.repos
        .agreements
        .update_status(&agreement.id, AgreementStatus::Accepted)
        .await
        .expect("accept");
    let err = app
        .repos
        .agreements
        .update_status(&agreement.id, AgreementStatus::Rejected)
        .await
        .expect_err("accepted contracts cannot be rejected");
    assert!(matches!(err, RepoError::IllegalTransition { .. }));
    app.repos
        .agreements
        .update_status(&agreement.id, AgreementStatus::Completed)
        .await
        .expect("complete");
}

#[tokio::test]
async fn agreement_rejects_empty_parties() {
    let (app, _) = test_app();
    let game = app.repos.games.create("Void", None).await.expect("game");
    let err = app
        .repos
        .agreements
        .create(&game.id, BTreeMap::new())
        .await
        .expect_err("no parties");
    assert!(matches!(err, RepoError::Validation(_)));
}

#[tokio::test]
async fn agreement_requires_party_actors_in_the_game() {
    let (app, _) = test_app();
    let game = app.repos.games.create("Treaty", None).await.expect("game");
    // Actor exists, but was never registered in this game.
    let outsider = app.repos.actors.create("Drifter", false).await.expect("actor");
    let card = app.repos.cards.create("Forge", "", "craft").await.expect("card");

    let mut parties = BTreeMap::new();
    parties.insert(
        outsider.id.clone(),
        Party {
            card_ref: card.id.clone(),
            obligation: "shoe the horses".into(),
            benefit: "".into(),
        },
    );
    let err = app
        .repos
        .agreements
        .create(&game.id, parties.clone())
        .await
        .expect_err("outsiders cannot contract");
    assert!(matches!(err, RepoError::Validation(_)));
    // Nothing landed: no half-written membership edges either.
    assert!(app
        .repos
        .agreements
        .list_for_game(&game.id)
        .await
        .expect("game side")
        .is_empty());
    assert!(app
        .repos
        .actors
        .agreement_ids(&outsider.id)
        .await
        .expect("actor side")
        .is_empty());

    // Registering the actor makes the same create legal.
    app.repos.games.add_actor(&game.id, &outsider.id).await.expect("register");
    app.repos
        .agreements
        .create(&game.id, parties)
        .await
        .expect("now a party");
}

#[tokio::test]
async fn deck_membership_reads_across_page_shards() {
    let (app, store) = test_app();
    let deck = app.repos.decks.create("Starter").await.expect("deck");

    let mut card_ids = Vec::new();
    for i in 0..12 {
        let card = app
            .repos
            .cards
            .create(&format!("Card {i}"), "", "misc")
            .await
            .expect("card");
        app.repos.decks.add_card(&deck.id, &card.id).await.expect("add");
        card_ids.push(card.id);
    }

    // Threshold is 5, so the 12 entries span three page shards.
    let page_2 = Path::entity(collections::DECKS, &deck.id)
        .child("cards_ref")
        .child("page_2");
    assert!(store.get(&page_2).await.expect("get").is_some());

    let mut listed = app.repos.decks.card_ids(&deck.id).await.expect("list");
    listed.sort();
    card_ids.sort();
    assert_eq!(listed, card_ids);

    // Removal finds the entry wherever its shard put it.
    let victim = card_ids[7].clone();
    app.repos.decks.remove_card(&deck.id, &victim).await.expect("remove");
    let listed = app.repos.decks.card_ids(&deck.id).await.expect("list");
    assert_eq!(listed.len(), 11);
    assert!(!listed.contains(&victim));
    assert!(app.repos.cards.deck_ids(&victim).await.expect("card side").is_empty());
}

#[tokio::test]
async fn deck_rename_leaves_the_append_cursor_alone() {
    use crate::infrastructure::persistence::DeckUpdate;

    let (app, _) = test_app();
    let deck = app.repos.decks.create("Starter").await.expect("deck");
    let card = app.repos.cards.create("Forge", "", "craft").await.expect("card");
    app.repos.decks.add_card(&deck.id, &card.id).await.expect("add");

    app.repos
        .decks
        .update(&deck.id, DeckUpdate { name: Some("Village set".into()) })
        .await
        .expect("rename");
    let reread = app.repos.decks.get_by_id(&deck.id).await.expect("reread");
    assert_eq!(reread.name, "Village set");
    assert_eq!(reread.cards_count, 1);
}

#[tokio::test]
async fn game_context_assembles_the_full_view() {
    let (app, _) = test_app();
    let deck = app.repos.decks.create("Village deck").await.expect("deck");
    let mut cards = Vec::new();
    for name in ["Forge", "Field", "Mill"] {
        let card = app.repos.cards.create(name, "", "place").await.expect("card");
        app.repos.decks.add_card(&deck.id, &card.id).await.expect("add");
        cards.push(card);
    }

    let game = app
        .repos
        .games
        .create("Village", Some(deck.id.clone()))
        .await
        .expect("game");
    let user = app.repos.users.create("Sam", None).await.expect("user");
    let actor = app.repos.actors.create("Miller", false).await.expect("actor");
    app.repos.games.add_player(&game.id, &user.id).await.expect("join");
    app.repos
        .games
        .assign_actor(&game.id, &user.id, Some(&actor.id))
        .await
        .expect("assign actor");
    app.repos
        .actors
        .assign_card(&actor.id, &game.id, Some(&cards[2].id))
        .await
        .expect("assign card");

    let mut parties = BTreeMap::new();
    parties.insert(
        actor.id.clone(),
        Party {
            card_ref: cards[2].id.clone(),
            obligation: "grind the grain".into(),
            benefit: "a share of flour".into(),
        },
    );
    app.repos.agreements.create(&game.id, parties).await.expect("agreement");

    let ctx = app.loader.load(&game.id).await.expect("context");
    assert!(!ctx.partial);
    assert_eq!(ctx.game.id, game.id);

    assert_eq!(ctx.actors.len(), 1);
    let entry = ctx.actors[0].found().expect("actor resolved");
    assert_eq!(entry.actor.id, actor.id);
    let card = entry.card.as_ref().expect("card assigned");
    assert_eq!(card.found().expect("card resolved").id, cards[2].id);

    assert_eq!(ctx.agreements.len(), 1);
    let agreement = ctx.agreements[0].found().expect("agreement resolved");
    assert_eq!(agreement.cards.len(), 1);

    let counts = ctx.deck.expect("deck counts");
    assert_eq!(counts.total, 3);
    assert_eq!(counts.used, 1);
    assert_eq!(counts.available, 2);
}

#[tokio::test]
async fn game_context_marks_dangling_references_and_keeps_the_rest() {
    let (app, _) = test_app();
    let game = app.repos.games.create("Frayed", None).await.expect("game");
    let user = app.repos.users.create("Sam", None).await.expect("user");
    let actor = app.repos.actors.create("Miller", false).await.expect("actor");
    app.repos
        .games
        .assign_actor(&game.id, &user.id, Some(&actor.id))
        .await
        .expect("assign");

    // An actor id another peer registered but whose entity never
    // replicated here.
    app.repos
        .edges
        .add_edge(
            &Path::entity(collections::GAMES, &game.id),
            "actors_ref",
            "actor_00000000000000000000000000000000",
        )
        .await
        .expect("dangling edge");

    let ctx = app.loader.load(&game.id).await.expect("context");
    assert!(ctx.partial);
    assert_eq!(ctx.actors.len(), 2);
    assert_eq!(ctx.actors.iter().filter(|a| a.is_unresolved()).count(), 1);
    assert!(ctx
        .actors
        .iter()
        .filter_map(Resolved::found)
        .any(|e| e.actor.id == actor.id));
}

#[tokio::test]
async fn loading_a_missing_game_is_an_error() {
    let (app, _) = test_app();
    let err = app
        .loader
        .load(&accord_domain::GameId::new())
        .await
        .expect_err("nothing to assemble");
    assert!(err.is_not_found());
}

#[tokio::test(start_paused = true)]
async fn position_burst_coalesces_to_a_single_put() {
    let (app, store) = test_app();
    let game = app.repos.games.create("Drag", None).await.expect("game");

    let before = store.put_count();
    for i in 0..5 {
        app.coalescer
            .set_position(&game.id, "card_a", f64::from(i), f64::from(i) * 2.0);
    }
    assert_eq!(app.coalescer.pending_len(), 1);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(store.put_count() - before, 1);
    assert_eq!(app.coalescer.pending_len(), 0);

    let position = app
        .repos
        .positions
        .get(&game.id, "card_a")
        .await
        .expect("get")
        .expect("present");
    assert_eq!(position.x, 4.0);
    assert_eq!(position.y, 8.0);
}

#[tokio::test(start_paused = true)]
async fn distinct_nodes_debounce_independently() {
    let (app, store) = test_app();
    let game = app.repos.games.create("Drag", None).await.expect("game");

    let before = store.put_count();
    app.coalescer.set_position(&game.id, "card_a", 1.0, 1.0);
    app.coalescer.set_position(&game.id, "card_b", 2.0, 2.0);
    assert_eq!(app.coalescer.pending_len(), 2);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(store.put_count() - before, 2);
    let listed = app.repos.positions.list_for_game(&game.id).await.expect("list");
    assert_eq!(listed.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn flush_all_writes_pending_positions_without_waiting() {
    let (app, store) = test_app();
    let game = app.repos.games.create("Drag", None).await.expect("game");

    app.coalescer.set_position(&game.id, "card_a", 3.0, 4.0);
    app.coalescer.flush_all().await;
    assert_eq!(app.coalescer.pending_len(), 0);
    let position = app
        .repos
        .positions
        .get(&game.id, "card_a")
        .await
        .expect("get")
        .expect("flushed");
    assert_eq!(position.x, 3.0);

    // The armed timer finds nothing left to write.
    let after_flush = store.put_count();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(store.put_count(), after_flush);
}

#[tokio::test]
async fn position_watch_sees_writes_until_cancelled() {
    use std::sync::atomic::{AtomicUsize, Ordering};

    let (app, _) = test_app();
    let game = app.repos.games.create("Live", None).await.expect("game");

    let hits = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&hits);
    let subscription = app
        .repos
        .positions
        .watch(
            &game.id,
            "card_a",
            Arc::new(move |_| {
                seen.fetch_add(1, Ordering::Relaxed);
            }),
        )
        .await
        .expect("watch");

    app.repos.positions.set(&game.id, "card_a", 1.0, 2.0).await.expect("set");
    assert_eq!(hits.load(Ordering::Relaxed), 1);

    subscription.cancel().await;
    app.repos.positions.set(&game.id, "card_a", 3.0, 4.0).await.expect("set");
    assert_eq!(hits.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn reconciler_restores_the_missing_edge_half() {
    let (app, _) = test_app();
    let card = app.repos.cards.create("Weaver", "", "craft").await.expect("card");
    let value = app.repos.vocab.create_value("Honesty").await.expect("value");

    // Simulate a crash between the two halves of add_value: only the
    // card side landed.
    app.repos
        .edges
        .add_edge(
            &Path::entity(collections::CARDS, &card.id),
            "values_ref",
            value.id.as_str(),
        )
        .await
        .expect("half edge");
    assert!(app
        .repos
        .vocab
        .value_card_ids(&value.id)
        .await
        .expect("value side")
        .is_empty());

    let report = app.reconciler.reconcile_vocabulary().await.expect("reconcile");
    assert_eq!(report.cards_scanned, 1);
    assert_eq!(report.repaired.len(), 1);
    assert_eq!(report.repaired[0].field, "cards_ref");
    assert_eq!(report.repaired[0].target, card.id.as_str());

    assert_eq!(
        app.repos.vocab.value_card_ids(&value.id).await.expect("value side"),
        vec![card.id.clone()]
    );

    // Second pass finds nothing to do.
    let report = app.reconciler.reconcile_vocabulary().await.expect("reconcile again");
    assert!(report.repaired.is_empty());
}

#[tokio::test]
async fn updates_invalidate_the_read_through_cache() {
    let (app, _) = test_app();
    let user = app
        .repos
        .users
        .create("Sam", Some("sam@example.org"))
        .await
        .expect("create");

    // Prime the cache, then change the record underneath it.
    app.repos.users.get_by_id(&user.id).await.expect("prime");
    app.repos
        .users
        .update(
            &user.id,
            crate::infrastructure::persistence::UserUpdate {
                email: Some("sam@commons.coop".into()),
                ..Default::default()
            },
        )
        .await
        .expect("update");

    let reread = app.repos.users.get_by_id(&user.id).await.expect("reread");
    assert_eq!(reread.email.as_deref(), Some("sam@commons.coop"));
}

#[tokio::test]
async fn soft_deleted_users_resolve_by_id_but_not_in_listings() {
    let (app, _) = test_app();
    let user = app
        .repos
        .users
        .create("Sam", Some("sam@example.org"))
        .await
        .expect("create");

    app.repos.users.soft_delete(&user.id).await.expect("delete");

    let reread = app.repos.users.get_by_id(&user.id).await.expect("still resolvable");
    assert!(reread.deleted);
    assert_eq!(reread.email, None);
    assert!(app.repos.users.get_all().await.expect("list").is_empty());
}

#[tokio::test]
async fn direct_rooms_take_exactly_two_members() {
    let (app, _) = test_app();
    let game = app.repos.games.create("Chatty", None).await.expect("game");
    let users: Vec<UserId> = (0..3).map(|_| UserId::new()).collect();

    let err = app
        .repos
        .chats
        .create_room(&game.id, accord_domain::ChatKind::Direct, &users)
        .await
        .expect_err("three is a crowd");
    assert!(matches!(err, RepoError::Validation(_)));

    let room = app
        .repos
        .chats
        .create_room(&game.id, accord_domain::ChatKind::Direct, &users[..2])
        .await
        .expect("pair is fine");
    let mut members = app.repos.chats.members(&room.id).await.expect("members");
    members.sort();
    let mut expected = users[..2].to_vec();
    expected.sort();
    assert_eq!(members, expected);
}

#[tokio::test]
async fn rooms_can_be_renamed_and_soft_deleted() {
    use crate::infrastructure::persistence::ChatRoomUpdate;

    let (app, _) = test_app();
    let game = app.repos.games.create("Chatty", None).await.expect("game");
    let member = UserId::new();
    let room = app
        .repos
        .chats
        .create_room(&game.id, accord_domain::ChatKind::Group, &[member])
        .await
        .expect("room");
    assert_eq!(room.name, None);

    app.repos
        .chats
        .update_room(&room.id, ChatRoomUpdate { name: Some("Town square".into()) })
        .await
        .expect("rename");
    let reread = app.repos.chats.get_room(&room.id).await.expect("reread");
    assert_eq!(reread.name.as_deref(), Some("Town square"));
    assert_eq!(app.repos.chats.get_all_rooms().await.expect("list").len(), 1);

    app.repos.chats.soft_delete_room(&room.id).await.expect("delete");
    let deleted = app.repos.chats.get_room(&room.id).await.expect("still resolvable");
    assert!(deleted.deleted);
    assert!(app.repos.chats.get_all_rooms().await.expect("list").is_empty());
}

#[tokio::test]
async fn messages_list_in_send_order_with_read_receipts() {
    let (app, _) = test_app();
    let game = app.repos.games.create("Chatty", None).await.expect("game");
    let sender = app.repos.users.create("Sam", None).await.expect("user");
    let reader = app.repos.users.create("Kim", None).await.expect("user");
    let room = app
        .repos
        .chats
        .create_room(&game.id, accord_domain::ChatKind::Group, &[sender.id.clone()])
        .await
        .expect("room");

    for body in ["first", "second", "third"] {
        app.repos
            .chats
            .post_message(&room.id, &sender.id, body)
            .await
            .expect("post");
    }

    let messages = app.repos.chats.list_messages(&room.id).await.expect("list");
    let bodies: Vec<&str> = messages.iter().map(|m| m.body.as_str()).collect();
    assert_eq!(bodies, vec!["first", "second", "third"]);

    app.repos
        .chats
        .mark_read(&messages[0].id, &reader.id)
        .await
        .expect("receipt");
    assert_eq!(
        app.repos.chats.read_by(&messages[0].id).await.expect("read by"),
        vec![reader.id.clone()]
    );

    let err = app
        .repos
        .chats
        .post_message(&room.id, &sender.id, "   ")
        .await
        .expect_err("blank body");
    assert!(matches!(err, RepoError::Validation(_)));
}
