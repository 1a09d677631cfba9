#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Member search integration tests.
//!
//! Filter composition properties and the two unpaged loading strategies.

use std::collections::BTreeSet;

use pagewise_kernel::error::QueryStage;
use pagewise_kernel::models::MemberOrders;
use pagewise_kernel::query::{ChildStrategy, SearchCondition, SearchOptions};
use pagewise_kernel::store::StoreCall;
use pagewise_test_utils::{Dataset, mixed_members, test_member, test_order};

fn flat_join() -> SearchOptions {
    SearchOptions {
        unpaged_strategy: ChildStrategy::FlatJoin,
        ..SearchOptions::default()
    }
}

fn ids(members: &[MemberOrders]) -> Vec<i64> {
    members.iter().map(|m| m.member.member_id).collect()
}

async fn search_ids(dataset: &Dataset, condition: &SearchCondition) -> BTreeSet<i64> {
    let store = dataset.store();
    let service = Dataset::service(&store, SearchOptions::default());
    ids(&service.search(condition).await.unwrap())
        .into_iter()
        .collect()
}

// -------------------------------------------------------------------------
// Filter composition
// -------------------------------------------------------------------------

#[tokio::test]
async fn no_filter_returns_every_member() {
    let dataset = mixed_members(17);
    let store = dataset.store();
    let service = Dataset::service(&store, SearchOptions::default());

    let members = service.search(&SearchCondition::default()).await.unwrap();

    let expected: Vec<i64> = (1..=17).collect();
    assert_eq!(ids(&members), expected);
}

#[tokio::test]
async fn blank_strings_behave_like_absent_filters() {
    let dataset = mixed_members(12);
    let unconstrained = search_ids(&dataset, &SearchCondition::default()).await;

    let blank = SearchCondition {
        username: Some(String::new()),
        team_name: Some("   ".to_string()),
        age_goe: None,
        age_loe: None,
    };
    assert_eq!(search_ids(&dataset, &blank).await, unconstrained);
    assert_eq!(unconstrained.len(), 12);
}

#[tokio::test]
async fn combined_filters_intersect_single_filters() {
    let dataset = mixed_members(24);

    let usernames = [None, Some("member4"), Some("member7")];
    let teams = [None, Some("teamA"), Some("teamB")];
    let age_goes = [None, Some(4)];
    let age_loes = [None, Some(15)];

    for username in usernames {
        for team in teams {
            for age_goe in age_goes {
                for age_loe in age_loes {
                    let combined = SearchCondition {
                        username: username.map(str::to_string),
                        team_name: team.map(str::to_string),
                        age_goe,
                        age_loe,
                    };

                    let mut expected = search_ids(&dataset, &SearchCondition::default()).await;
                    if let Some(username) = username {
                        let single = SearchCondition::default().with_username(username);
                        expected = &expected & &search_ids(&dataset, &single).await;
                    }
                    if let Some(team) = team {
                        let single = SearchCondition::default().with_team_name(team);
                        expected = &expected & &search_ids(&dataset, &single).await;
                    }
                    if let Some(age) = age_goe {
                        let single = SearchCondition::default().with_age_goe(age);
                        expected = &expected & &search_ids(&dataset, &single).await;
                    }
                    if let Some(age) = age_loe {
                        let single = SearchCondition::default().with_age_loe(age);
                        expected = &expected & &search_ids(&dataset, &single).await;
                    }

                    assert_eq!(
                        search_ids(&dataset, &combined).await,
                        expected,
                        "combined filter {combined:?}"
                    );
                }
            }
        }
    }
}

#[tokio::test]
async fn team_filter_skips_members_without_team() {
    let dataset = Dataset::new()
        .member(test_member(1, "solo"))
        .member(test_member(2, "joined").in_team(1, "teamA"));

    let found = search_ids(&dataset, &SearchCondition::default().with_team_name("teamA")).await;
    assert_eq!(found, BTreeSet::from([2]));
}

#[tokio::test]
async fn age_bounds_are_inclusive() {
    let dataset = mixed_members(10);
    let condition = SearchCondition::default().with_age_goe(3).with_age_loe(5);

    assert_eq!(search_ids(&dataset, &condition).await, BTreeSet::from([3, 4, 5]));
}

// -------------------------------------------------------------------------
// Unpaged strategies
// -------------------------------------------------------------------------

#[tokio::test]
async fn flat_join_matches_batch_loading() {
    let dataset = mixed_members(21);
    let conditions = [
        SearchCondition::default(),
        SearchCondition::default().with_team_name("teamB"),
        SearchCondition::default().with_age_goe(8),
        SearchCondition::default().with_username("member12"),
    ];

    for condition in &conditions {
        let batch_store = dataset.store();
        let flat_store = dataset.store();
        let batch = Dataset::service(&batch_store, SearchOptions::default())
            .search(condition)
            .await
            .unwrap();
        let flat = Dataset::service(&flat_store, flat_join())
            .search(condition)
            .await
            .unwrap();

        assert_eq!(batch, flat, "strategies disagree for {condition:?}");
        assert_eq!(flat_store.calls(), vec![StoreCall::FetchMemberOrdersFlat]);
    }
}

#[tokio::test]
async fn flat_join_keeps_childless_member_once() {
    let dataset = Dataset::new()
        .member(test_member(1, "buyer"))
        .member(test_member(2, "browser"))
        .order(test_order(10, 1))
        .order(test_order(11, 1))
        .order(test_order(12, 1));
    let store = dataset.store();
    let service = Dataset::service(&store, flat_join());

    let members = service.search(&SearchCondition::default()).await.unwrap();

    assert_eq!(ids(&members), vec![1, 2]);
    assert_eq!(members[0].orders.len(), 3);
    assert!(members[1].orders.is_empty());
}

#[tokio::test]
async fn unpaged_search_is_capped_for_both_strategies() {
    let dataset = mixed_members(30);
    let capped = SearchOptions {
        unpaged_limit: 7,
        ..SearchOptions::default()
    };

    let batch_store = dataset.store();
    let batch = Dataset::service(&batch_store, capped.clone())
        .search(&SearchCondition::default())
        .await
        .unwrap();
    assert_eq!(batch.len(), 7);
    assert_eq!(batch_store.calls()[0], StoreCall::FetchMembers { offset: 0, limit: 7 });

    let flat_store = dataset.store();
    let flat = Dataset::service(
        &flat_store,
        SearchOptions {
            unpaged_strategy: ChildStrategy::FlatJoin,
            ..capped
        },
    )
    .search(&SearchCondition::default())
    .await
    .unwrap();
    assert_eq!(ids(&flat), ids(&batch));
}

#[tokio::test]
async fn flat_join_failure_is_reported_with_stage() {
    let store = std::sync::Arc::new(
        mixed_members(3)
            .memory_store()
            .failing_on(QueryStage::FlatJoin),
    );
    let service = Dataset::service(&store, flat_join());

    let err = service.search(&SearchCondition::default()).await.unwrap_err();
    assert_eq!(err.stage(), Some(QueryStage::FlatJoin));
}

#[tokio::test]
async fn result_serializes_with_flattened_member() {
    let dataset = Dataset::new()
        .member(test_member(5, "member5").with_age(33).in_team(2, "teamB"))
        .order(test_order(50, 5).with_item("lamp").priced(1500, 2));
    let store = dataset.store();
    let service = Dataset::service(&store, SearchOptions::default());

    let members = service.search(&SearchCondition::default()).await.unwrap();
    let json = serde_json::to_value(&members).unwrap();

    assert_eq!(json[0]["username"], "member5");
    assert_eq!(json[0]["team_name"], "teamB");
    assert_eq!(json[0]["orders"][0]["item_name"], "lamp");
    assert_eq!(members[0].total_spent(), 3000);
}
