//! Profile and manager attribute mappers against a mock directory.

use kc_federation::{MapperConfig, SkipReason};
use kc_federation_graph::{GraphManagerAttributeMapper, GraphUserAttributeMapper};
use kc_integration_tests::TestEnv;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

fn user_config(field: &str, attribute: &str) -> MapperConfig {
    MapperConfig::new("azure-user", GraphUserAttributeMapper::PROVIDER_ID, "azure")
        .with_config(GraphUserAttributeMapper::FIELD_NAME, field)
        .with_config(GraphUserAttributeMapper::ATTRIBUTE_NAME, attribute)
}

fn manager_config(field: &str, attribute: &str) -> MapperConfig {
    MapperConfig::new(
        "azure-manager",
        GraphManagerAttributeMapper::PROVIDER_ID,
        "azure",
    )
    .with_config(GraphManagerAttributeMapper::FIELD_NAME, field)
    .with_config(GraphManagerAttributeMapper::ATTRIBUTE_NAME, attribute)
}

fn megan() -> serde_json::Value {
    json!({
        "id": "48d31887-5fad-4d73-a9f5-3c356e68a038",
        "displayName": "Megan Bowen",
        "givenName": "Megan",
        "surname": "Bowen",
        "mail": "MeganB@Contoso.OnMicrosoft.com",
        "jobTitle": "Auditor",
        "businessPhones": ["+1 412 555 0109", "+1 412 555 0110"],
        "mobilePhone": null,
        "officeLocation": "12/1110",
        "preferredLanguage": "en-US",
        "userPrincipalName": "MeganB@contoso.onmicrosoft.com"
    })
}

#[tokio::test]
async fn test_user_mail_is_lowercased() -> anyhow::Result<()> {
    let mut env = TestEnv::new().await?;
    env.mount_me(megan(), 1).await;

    let mapper = GraphUserAttributeMapper::new(env.gateway.clone());
    let outcome = env.run(&mapper, &user_config("User Mail", "email")).await;

    assert!(outcome.is_applied());
    assert_eq!(
        env.user.get_first_attribute("email"),
        Some("meganb@contoso.onmicrosoft.com")
    );
    Ok(())
}

#[tokio::test]
async fn test_list_field_is_written_multi_valued() -> anyhow::Result<()> {
    let mut env = TestEnv::new().await?;
    env.mount_me(megan(), 1).await;

    let mapper = GraphUserAttributeMapper::new(env.gateway.clone());
    env.run(&mapper, &user_config("User Business Phones", "phones"))
        .await;

    assert_eq!(
        env.user.get_attribute("phones"),
        Some(&vec![
            "+1 412 555 0109".to_string(),
            "+1 412 555 0110".to_string()
        ])
    );
    Ok(())
}

#[tokio::test]
async fn test_null_field_removes_attribute() -> anyhow::Result<()> {
    let mut env = TestEnv::new().await?;
    env.mount_me(megan(), 1).await;
    env.user.set_single_attribute("mobile", "+1 555 0000");

    let mapper = GraphUserAttributeMapper::new(env.gateway.clone());
    let outcome = env.run(&mapper, &user_config("User Mobile Phone", "mobile")).await;

    assert!(outcome.is_applied());
    assert!(env.user.get_attribute("mobile").is_none());
    Ok(())
}

#[tokio::test]
async fn test_profile_is_fetched_once_per_login() -> anyhow::Result<()> {
    let mut env = TestEnv::new().await?;
    // One request for each of the two logins below.
    env.mount_me(megan(), 2).await;

    let mapper = GraphUserAttributeMapper::new(env.gateway.clone());
    let mail = user_config("User Mail", "email");
    let title = user_config("User Job Title", "title");

    env.run(&mapper, &mail).await;
    env.run(&mapper, &title).await;
    assert_eq!(env.user.get_first_attribute("title"), Some("Auditor"));

    env.new_login();
    env.run(&mapper, &mail).await;
    env.run(&mapper, &title).await;
    Ok(())
}

#[tokio::test]
async fn test_manager_attribute_is_mapped() -> anyhow::Result<()> {
    let mut env = TestEnv::new().await?;
    env.mount_manager(
        200,
        json!({ "id": "m-1", "displayName": "Alex Wilber", "mail": "AlexW@Contoso.com" }),
        1,
    )
    .await;

    let mapper = GraphManagerAttributeMapper::new(env.gateway.clone());
    let outcome = env
        .run(&mapper, &manager_config("Manager Mail", "manager_email"))
        .await;

    assert!(outcome.is_applied());
    assert_eq!(
        env.user.get_first_attribute("manager_email"),
        Some("alexw@contoso.com")
    );
    Ok(())
}

#[tokio::test]
async fn test_missing_manager_is_fetched_once_and_skipped() -> anyhow::Result<()> {
    let mut env = TestEnv::new().await?;
    env.mount_manager(404, json!(null), 1).await;
    env.user.set_single_attribute("manager_email", "old@contoso.com");

    let mapper = GraphManagerAttributeMapper::new(env.gateway.clone());
    let first = env
        .run(&mapper, &manager_config("Manager Mail", "manager_email"))
        .await;
    let second = env
        .run(&mapper, &manager_config("Manager Display Name", "manager_name"))
        .await;

    assert_eq!(first.skip_reason(), Some(SkipReason::NotFound));
    assert_eq!(second.skip_reason(), Some(SkipReason::NotFound));
    assert_eq!(
        env.user.get_first_attribute("manager_email"),
        Some("old@contoso.com")
    );
    Ok(())
}

#[tokio::test]
async fn test_server_error_leaves_user_untouched() -> anyhow::Result<()> {
    let mut env = TestEnv::new().await?;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&env.server)
        .await;
    env.user.set_single_attribute("email", "kept@contoso.com");

    let mapper = GraphUserAttributeMapper::new(env.gateway.clone());
    let outcome = env.run(&mapper, &user_config("User Mail", "email")).await;

    assert_eq!(outcome.skip_reason(), Some(SkipReason::RemoteFailure));
    assert_eq!(env.user.get_first_attribute("email"), Some("kept@contoso.com"));
    Ok(())
}

#[tokio::test]
async fn test_missing_token_makes_no_request() -> anyhow::Result<()> {
    let mut env = TestEnv::new().await?;
    env.mount_me(megan(), 0).await;
    env.broker_token = None;

    let mapper = GraphUserAttributeMapper::new(env.gateway.clone());
    let outcome = env.run(&mapper, &user_config("User Mail", "email")).await;

    assert_eq!(outcome.skip_reason(), Some(SkipReason::NoCredential));
    Ok(())
}

#[tokio::test]
async fn test_unsupported_field_makes_no_request() -> anyhow::Result<()> {
    let mut env = TestEnv::new().await?;
    env.mount_me(megan(), 0).await;

    let mapper = GraphUserAttributeMapper::new(env.gateway.clone());
    let outcome = env.run(&mapper, &user_config("User Shoe Size", "shoes")).await;

    assert_eq!(outcome.skip_reason(), Some(SkipReason::UnsupportedField));
    Ok(())
}
