mod support;

use support::*;

use tokio::sync::mpsc;

use yotsu_types::events::{LiveEvent, MemberEvent, MessageEdit, ReactionEvent};
use yotsu_types::models::{ChannelRole, ChannelType, ReactionAggregate};

fn reaction(message_id: i64, emoji: &str, user_id: i64) -> ReactionEvent {
    ReactionEvent {
        message_id,
        emoji: emoji.into(),
        user_id,
    }
}

#[tokio::test]
async fn presence_snapshot_then_updates() {
    let client = logged_in(FakeBackend::new()).await;

    client
        .handle_event(LiveEvent::PresenceSnapshot {
            online_users: vec![1, 2, 3],
        })
        .await
        .unwrap();
    client
        .handle_event(LiveEvent::PresenceChanged {
            user_id: 2,
            online: false,
        })
        .await
        .unwrap();

    // offline for someone not present
    client.update_presence(42, false);

    client.read(|store| {
        assert_eq!(store.online_users(), vec![1, 3]);
        assert_eq!(store.online_count(), 2);
    });
}

#[tokio::test]
async fn message_created_is_idempotent() {
    let client = logged_in(FakeBackend::new().with_messages(vec![message(1, 3, 1)])).await;
    client.fetch_messages(3, None, 50).await.unwrap();

    let pushed = message(2, 3, 2);
    assert!(client.handle_message_created(pushed.clone()));
    assert!(!client.handle_message_created(pushed));

    client.read(|store| {
        let timeline = store.messages(3).unwrap();
        assert_eq!(timeline.iter().filter(|m| m.message_id == 2).count(), 1);
        assert_eq!(timeline.len(), 2);
    });
}

#[tokio::test]
async fn events_for_unloaded_entities_are_ignored() {
    let client = logged_in(FakeBackend::new()).await;

    assert!(!client.handle_message_created(message(5, 99, 1)));
    assert!(!client.handle_message_deleted(5, Some(99)));
    assert!(!client.handle_message_updated(&MessageEdit {
        message_id: 5,
        channel_id: Some(99),
        content: "x".into(),
        edited_at: None,
    }));

    let left = LiveEvent::MemberLeft(MemberEvent {
        channel_id: 99,
        user_id: 8,
        display_name: "Di".into(),
        role: None,
    });
    client.handle_event(left).await.unwrap();
    client
        .handle_event(LiveEvent::ChannelUpdated {
            channel_id: 99,
            name: Some("ghost".into()),
            kind: ChannelType::Public,
        })
        .await
        .unwrap();

    assert!(!client.handle_reaction_added(&reaction(5, "👍", 8)));
    assert!(!client.handle_reaction_removed(&reaction(5, "👍", 8)));
    client
        .handle_event(LiveEvent::OwnershipTransferred {
            channel_id: 99,
            new_owner_id: 8,
            previous_owner_id: 7,
        })
        .await
        .unwrap();

    client.read(|store| {
        assert!(store.messages(99).is_none());
        assert!(store.members(99).is_none());
        assert!(store.reactions(5).is_empty());
        assert!(store.message(5).is_none());
        assert_eq!(store.channel_count(), 0);
    });
    assert!(client.backend().calls().is_empty());
}

#[tokio::test]
async fn reaction_on_unfetched_aggregates_waits_for_fetch() {
    let mut flagged = message(1, 3, 1);
    flagged.has_reactions = true;
    let backend = FakeBackend::new().with_messages(vec![flagged]);
    backend.reactions.lock().unwrap().insert(
        1,
        vec![ReactionAggregate {
            emoji: "👍".into(),
            count: 3,
            users: vec![6, 7, 8],
        }],
    );
    let client = logged_in(backend).await;
    client.fetch_messages(3, None, 50).await.unwrap();

    assert!(!client.handle_reaction_added(&reaction(1, "👍", 9)));
    client.read(|store| {
        assert!(store.reactions(1).is_empty());
        assert!(store.message(1).unwrap().has_reactions);
    });

    client.fetch_reactions_for_message(1).await.unwrap();
    assert!(client.handle_reaction_added(&reaction(1, "👍", 9)));
    client.read(|store| assert_eq!(store.reactions(1)[0].count, 4));
}

#[tokio::test]
async fn live_message_gets_author_name_from_members() {
    let backend = FakeBackend::new().with_messages(vec![message(1, 3, 1)]);
    backend.members.lock().unwrap().insert(3, vec![member(6, "Bo")]);
    let client = logged_in(backend).await;
    client.fetch_messages(3, None, 50).await.unwrap();
    client.fetch_channel_members(3).await.unwrap();

    let frame = r#"{"type":"message.created","data":{"message_id":2,"channel_id":3,"user_id":6,"content":"hi","parent_id":null,"created_at":"2024-01-01 12:05:00"}}"#;
    client
        .handle_event(LiveEvent::decode(frame).unwrap())
        .await
        .unwrap();

    client.read(|store| assert_eq!(store.message(2).unwrap().display_name, "Bo"));
}

#[tokio::test]
async fn channel_init_stores_channel_and_members() {
    let client = logged_in(FakeBackend::new()).await;

    let frame = r#"{"type":"channel.init","data":{"channel_id":12,"name":"team","type":"private","members":[{"user_id":5,"display_name":"Ann","role":"owner"},{"user_id":6,"display_name":"Bo","role":"member"}]}}"#;
    client
        .handle_event(LiveEvent::decode(frame).unwrap())
        .await
        .unwrap();

    client.read(|store| {
        let team = store.channel(12).unwrap();
        assert_eq!(team.kind, ChannelType::Private);
        assert_eq!(team.name.as_deref(), Some("team"));
        let members = store.members(12).unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].role, Some(ChannelRole::Owner));
    });
    assert!(client.backend().calls().is_empty());
}

#[tokio::test]
async fn ownership_transfer_event_swaps_roles() {
    let backend =
        FakeBackend::new().with_channels(vec![channel(4, Some("team"), ChannelType::Private)]);
    let mut bo = member(6, "Bo");
    bo.role = Some(ChannelRole::Owner);
    let mut ann = member(ANN, "Ann");
    ann.role = Some(ChannelRole::Member);
    backend.members.lock().unwrap().insert(4, vec![bo, ann]);
    let client = logged_in(backend).await;
    client.fetch_channel_members(4).await.unwrap();

    let frame = r#"{"type":"role.ownership_transferred","data":{"channel_id":4,"new_owner_id":5,"previous_owner_id":6}}"#;
    client
        .handle_event(LiveEvent::decode(frame).unwrap())
        .await
        .unwrap();

    client.read(|store| {
        assert_eq!(store.member(4, ANN).unwrap().role, Some(ChannelRole::Owner));
        assert_eq!(store.member(4, 6).unwrap().role, Some(ChannelRole::Admin));
    });
}

#[tokio::test]
async fn update_and_delete_from_other_clients() {
    let client = logged_in(FakeBackend::new().with_messages(vec![
        message(1, 3, 1),
        message(2, 3, 2),
        message(3, 3, 3),
    ]))
    .await;
    client.fetch_messages(3, None, 50).await.unwrap();

    client
        .handle_event(LiveEvent::MessageUpdated(MessageEdit {
            message_id: 2,
            channel_id: Some(3),
            content: "edited elsewhere".into(),
            edited_at: Some(at(30)),
        }))
        .await
        .unwrap();
    client
        .handle_event(LiveEvent::MessageDeleted {
            message_id: 1,
            channel_id: 3,
        })
        .await
        .unwrap();
    client
        .handle_event(LiveEvent::MessageSoftDeleted {
            message_id: 3,
            channel_id: 3,
        })
        .await
        .unwrap();

    client.read(|store| {
        let timeline = store.messages(3).unwrap();
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline[0].content, "edited elsewhere");
        assert_eq!(timeline[0].edited_at, Some(at(30)));
        assert_eq!(timeline[1].content, "This message was deleted");
    });
}

#[tokio::test]
async fn smile_reaction_joins_existing_aggregate() {
    let mut parent = message(101, 3, 1);
    parent.has_reactions = true;
    let backend = FakeBackend::new().with_messages(vec![parent]);
    backend
        .reactions
        .lock()
        .unwrap()
        .insert(101, vec![ReactionAggregate::first(":smile:", 5)]);
    let client = logged_in(backend).await;
    client.fetch_messages(3, None, 50).await.unwrap();
    client.fetch_reactions_for_message(101).await.unwrap();

    client
        .handle_event(LiveEvent::ReactionAdded(reaction(101, ":smile:", 6)))
        .await
        .unwrap();

    client.read(|store| {
        assert_eq!(
            store.reactions(101),
            &[ReactionAggregate {
                emoji: ":smile:".into(),
                count: 2,
                users: vec![5, 6],
            }]
        );
    });
}

#[tokio::test]
async fn reaction_sequence_keeps_counts_consistent() {
    let client = logged_in(FakeBackend::new().with_messages(vec![message(1, 3, 1)])).await;
    client.fetch_messages(3, None, 50).await.unwrap();

    let steps = [
        (true, "👍", 1),
        (true, "👍", 2),
        (true, "🎉", 1),
        (false, "👍", 1),
        (true, "👍", 2),
        (false, "🎉", 3),
        (false, "🎉", 1),
        (false, "👍", 2),
        (true, "🔥", 4),
    ];
    for (add, emoji, user) in steps {
        let event = reaction(1, emoji, user);
        if add {
            client.handle_reaction_added(&event);
        } else {
            client.handle_reaction_removed(&event);
        }
        client.read(|store| {
            for agg in store.reactions(1) {
                assert_eq!(agg.count, agg.users.len());
                assert!(agg.count > 0);
            }
        });
    }

    client.read(|store| {
        let emoji: Vec<&str> = store.reactions(1).iter().map(|a| a.emoji.as_str()).collect();
        assert_eq!(emoji, vec!["🔥"]);
    });
}

#[tokio::test]
async fn membership_events_patch_loaded_lists() {
    let backend =
        FakeBackend::new().with_channels(vec![channel(4, Some("team"), ChannelType::Private)]);
    backend.members.lock().unwrap().insert(4, vec![member(ANN, "Ann")]);
    let client = logged_in(backend).await;
    client.refresh_channels().await.unwrap();
    client.fetch_channel_members(4).await.unwrap();
    client.backend().clear_calls();

    client
        .handle_event(LiveEvent::MemberJoined(MemberEvent {
            channel_id: 4,
            user_id: 9,
            display_name: "Ed".into(),
            role: Some(ChannelRole::Member),
        }))
        .await
        .unwrap();
    client
        .handle_event(LiveEvent::RoleUpdated {
            channel_id: 4,
            user_id: 9,
            role: ChannelRole::Admin,
        })
        .await
        .unwrap();

    client.read(|store| {
        let members = store.members(4).unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[1].role, Some(ChannelRole::Admin));
    });
    // someone else joined; no refresh
    assert!(client.backend().calls().is_empty());

    client
        .handle_event(LiveEvent::MemberLeft(MemberEvent {
            channel_id: 4,
            user_id: 9,
            display_name: "Ed".into(),
            role: None,
        }))
        .await
        .unwrap();
    client.read(|store| assert_eq!(store.members(4).unwrap().len(), 1));
    assert!(client.backend().calls().is_empty());
}

#[tokio::test]
async fn channel_update_renames() {
    let backend =
        FakeBackend::new().with_channels(vec![channel(1, Some("general"), ChannelType::Public)]);
    let client = logged_in(backend).await;
    client.refresh_channels().await.unwrap();

    client
        .handle_event(LiveEvent::ChannelUpdated {
            channel_id: 1,
            name: Some("lobby".into()),
            kind: ChannelType::Public,
        })
        .await
        .unwrap();

    client.read(|store| assert_eq!(store.channel(1).unwrap().name.as_deref(), Some("lobby")));
}

#[tokio::test]
async fn decoded_frames_drive_the_store() {
    let client = logged_in(FakeBackend::new().with_messages(vec![message(1, 3, 1)])).await;
    client.fetch_messages(3, None, 50).await.unwrap();

    let frames = [
        r#"{"type":"presence","data":{"online_users":[5,6]}}"#,
        r#"{"type":"message.created","data":{"message_id":2,"channel_id":3,"user_id":6,"content":"hi","created_at":"2024-01-01 12:05:00","display_name":"Bo","parent_id":null}}"#,
        r#"{"type":"reaction.added","data":{"message_id":2,"emoji":"👍","user_id":5}}"#,
    ];
    for frame in frames {
        client
            .handle_event(LiveEvent::decode(frame).unwrap())
            .await
            .unwrap();
    }

    client.read(|store| {
        assert!(store.is_online(6));
        assert_eq!(store.messages(3).unwrap().len(), 2);
        assert_eq!(store.reactions(2)[0].users, vec![5]);
        assert!(store.message(2).unwrap().has_reactions);
    });
}

#[tokio::test]
async fn stream_end_clears_presence() {
    let client = logged_in(FakeBackend::new()).await;
    let (tx, rx) = mpsc::unbounded_channel();

    tx.send(LiveEvent::PresenceSnapshot {
        online_users: vec![1, 2],
    })
    .unwrap();
    tx.send(LiveEvent::PresenceChanged {
        user_id: 3,
        online: true,
    })
    .unwrap();
    drop(tx);

    client.run_event_loop(rx).await;

    client.read(|store| {
        assert_eq!(store.online_count(), 0);
        assert!(store.session().is_authenticated());
    });
}
