//! Group membership and group name mappers against a mock directory.

use kc_federation::mapper::IdentityProviderMapper;
use kc_federation::{BrokerEvent, MapperConfig, SkipReason};
use kc_federation_graph::{GraphGroupNamesMapper, GraphGroupsMapper};
use kc_integration_tests::{graph_group, group_mapping, TestEnv, GROUPS_PATH};
use kc_storage::MembershipChange;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

fn names_config() -> MapperConfig {
    MapperConfig::new(
        "azure-group-names",
        GraphGroupNamesMapper::PROVIDER_ID,
        "azure",
    )
    .with_config(GraphGroupNamesMapper::ATTRIBUTE_NAME, "azure_groups")
}

#[tokio::test]
async fn test_memberships_follow_directory_groups() -> anyhow::Result<()> {
    let mut env = TestEnv::new().await?;
    let azure = env.add_group("azure");
    let engineering = env.add_child_group(&azure, "engineering");
    let sales = env.add_child_group(&azure, "sales");
    let staff = env.add_group("staff");
    env.groups.seed_membership(env.user.id, sales.id);
    env.groups.seed_membership(env.user.id, staff.id);

    env.mount_groups(
        json!([graph_group(Some("Engineering")), graph_group(Some("All Company"))]),
        1,
    )
    .await;

    let mapper = GraphGroupsMapper::new(env.gateway.clone());
    let config = group_mapping(&[
        ("Engineering", "azure/engineering"),
        ("Sales", "azure/sales"),
    ]);
    let outcome = env.run(&mapper, &config).await;

    assert!(outcome.is_applied());
    let member_of = env.groups.member_group_ids(env.user.id);
    assert!(member_of.contains(&engineering.id));
    assert!(!member_of.contains(&sales.id));
    // Unmanaged memberships are left alone.
    assert!(member_of.contains(&staff.id));
    Ok(())
}

#[tokio::test]
async fn test_joins_are_applied_before_leaves() -> anyhow::Result<()> {
    let mut env = TestEnv::new().await?;
    let engineering = env.add_group("engineering");
    let sales = env.add_group("sales");
    env.groups.seed_membership(env.user.id, sales.id);
    env.mount_groups(json!([graph_group(Some("Engineering"))]), 1)
        .await;

    let mapper = GraphGroupsMapper::new(env.gateway.clone());
    env.run(
        &mapper,
        &group_mapping(&[("Engineering", "engineering"), ("Sales", "sales")]),
    )
    .await;

    assert_eq!(
        env.groups.changes(),
        vec![
            MembershipChange::Joined {
                user_id: env.user.id,
                group_id: engineering.id
            },
            MembershipChange::Left {
                user_id: env.user.id,
                group_id: sales.id
            },
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_group_pages_are_followed() -> anyhow::Result<()> {
    let mut env = TestEnv::new().await?;
    let engineering = env.add_group("engineering");
    let sales = env.add_group("sales");

    let next_link = format!("{}{GROUPS_PATH}?$skiptoken=page-2", env.server.uri());
    Mock::given(method("GET"))
        .and(path(GROUPS_PATH))
        .and(query_param("$select", "id,displayName,description,mail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [graph_group(Some("Engineering"))],
            "@odata.nextLink": next_link
        })))
        .expect(1)
        .mount(&env.server)
        .await;
    Mock::given(method("GET"))
        .and(path(GROUPS_PATH))
        .and(query_param("$skiptoken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [graph_group(Some("Sales")), graph_group(None)]
        })))
        .expect(1)
        .mount(&env.server)
        .await;

    let mapper = GraphGroupsMapper::new(env.gateway.clone());
    let outcome = env
        .run(
            &mapper,
            &group_mapping(&[("Engineering", "engineering"), ("Sales", "sales")]),
        )
        .await;

    assert!(outcome.is_applied());
    let member_of = env.groups.member_group_ids(env.user.id);
    assert!(member_of.contains(&engineering.id));
    assert!(member_of.contains(&sales.id));
    Ok(())
}

#[tokio::test]
async fn test_directory_failure_changes_nothing() -> anyhow::Result<()> {
    let mut env = TestEnv::new().await?;
    let sales = env.add_group("sales");
    env.groups.seed_membership(env.user.id, sales.id);
    env.mount_groups_status(500).await;

    let mapper = GraphGroupsMapper::new(env.gateway.clone());
    let outcome = env.run(&mapper, &group_mapping(&[("Sales", "sales")])).await;

    assert_eq!(outcome.skip_reason(), Some(SkipReason::RemoteFailure));
    assert!(env.groups.changes().is_empty());
    assert!(env.groups.member_group_ids(env.user.id).contains(&sales.id));
    Ok(())
}

#[tokio::test]
async fn test_foreign_next_link_changes_nothing() -> anyhow::Result<()> {
    let mut env = TestEnv::new().await?;
    let sales = env.add_group("sales");
    env.groups.seed_membership(env.user.id, sales.id);

    Mock::given(method("GET"))
        .and(path(GROUPS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [],
            "@odata.nextLink": "https://attacker.example/v1.0/me/transitiveMemberOf"
        })))
        .expect(1)
        .mount(&env.server)
        .await;

    let mapper = GraphGroupsMapper::new(env.gateway.clone());
    let outcome = env.run(&mapper, &group_mapping(&[("Sales", "sales")])).await;

    assert_eq!(outcome.skip_reason(), Some(SkipReason::RemoteFailure));
    assert!(env.groups.changes().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_group_mappers_share_one_fetch() -> anyhow::Result<()> {
    let mut env = TestEnv::new().await?;
    let research = env.add_group("research");
    env.mount_groups(
        json!([
            graph_group(Some("R&D")),
            graph_group(Some("  All Company ")),
            graph_group(Some("R&D")),
        ]),
        1,
    )
    .await;

    let groups = GraphGroupsMapper::new(env.gateway.clone());
    let names = GraphGroupNamesMapper::new(env.gateway.clone());
    let groups_config = group_mapping(&[("R&D", "research")]);
    let names_config = names_config();
    let mappers: [(&dyn IdentityProviderMapper, &MapperConfig); 2] =
        [(&groups, &groups_config), (&names, &names_config)];

    let runs = env.run_all(&mappers, BrokerEvent::ExistingUser).await;

    assert!(runs.iter().all(|run| run.outcome.is_applied()));
    assert!(env.groups.member_group_ids(env.user.id).contains(&research.id));
    assert_eq!(
        env.user.get_attribute("azure_groups"),
        Some(&vec!["R%26D".to_string(), "All Company".to_string()])
    );
    Ok(())
}

#[tokio::test]
async fn test_repeated_logins_are_idempotent() -> anyhow::Result<()> {
    let mut env = TestEnv::new().await?;
    let engineering = env.add_group("engineering");
    env.mount_groups(json!([graph_group(Some("Engineering"))]), 2)
        .await;

    let mapper = GraphGroupsMapper::new(env.gateway.clone());
    let config = group_mapping(&[("Engineering", "engineering")]);

    env.run(&mapper, &config).await;
    assert!(env.groups.member_group_ids(env.user.id).contains(&engineering.id));
    env.groups.clear_changes();

    env.new_login();
    let outcome = env.run(&mapper, &config).await;

    assert!(outcome.is_applied());
    assert!(env.groups.changes().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_no_groups_clears_names_attribute() -> anyhow::Result<()> {
    let mut env = TestEnv::new().await?;
    env.mount_groups(json!([]), 1).await;
    env.user
        .set_attribute("azure_groups", vec!["Stale".to_string()]);

    let mapper = GraphGroupNamesMapper::new(env.gateway.clone());
    let outcome = env.run(&mapper, &names_config()).await;

    assert!(outcome.is_applied());
    assert!(env.user.get_attribute("azure_groups").is_none());
    Ok(())
}
