#![cfg(feature = "reqwest")]

mod common;

// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use common::*;
use oauth2_strategy::{
	config::StrategyOptionsBuilder,
	error::ErrorKind,
	strategy::{ClientUpdate, PasswordChange, ReqwestStrategy, Strategy},
};

fn reqwest_strategy(builder: StrategyOptionsBuilder) -> ReqwestStrategy {
	Strategy::with_transport(
		builder.build().expect("Strategy options should build."),
		test_reqwest_transport(),
	)
	.expect("Reqwest strategy should build.")
}

#[tokio::test]
async fn register_client_posts_registration_and_installs_credentials() {
	let server = MockServer::start_async().await;
	let strategy = reqwest_strategy(options(&server.base_url()));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth2/client")
				.header("content-type", "application/json")
				.header("accept", "application/json")
				.json_body(json!({
					"name": "Example Blog",
					"redirect_uri": CALLBACK_URL,
					"blog_uri": "https://blog.example.com/",
				}));
			then.status(200).header("content-type", "application/json").json_body(json!({
				"client_id": CLIENT_ID,
				"client_secret": CLIENT_SECRET,
				"redirect_uri": CALLBACK_URL,
			}));
		})
		.await;
	let registered =
		strategy.register_client("Example Blog", None).await.expect("Registration should succeed.");

	mock.assert_async().await;

	assert_eq!(registered.client_secret.expose(), CLIENT_SECRET);
	assert_eq!(registered.extra.get("redirect_uri"), Some(&json!(CALLBACK_URL)));
	assert_eq!(strategy.client().as_deref(), Some(&credentials()));
}

#[tokio::test]
async fn update_and_redirect_changes_are_signed() {
	let server = MockServer::start_async().await;
	let strategy = reqwest_strategy(options(&server.base_url()).client(credentials()));
	let update = server
		.mock_async(|when, then| {
			when.method(PUT).path("/oauth2/client").json_body(json!({
				"client_id": CLIENT_ID,
				"client_secret": CLIENT_SECRET,
				"description": "Now with more examples.",
			}));
			then.status(200).json_body(json!({ "description": "Now with more examples." }));
		})
		.await;
	let redirect = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/client/redirect").json_body(json!({
				"client_id": CLIENT_ID,
				"client_secret": CLIENT_SECRET,
				"redirect_uri": "https://new.example.com/callback",
			}));
			then.status(200).json_body(json!({ "redirect_uri": "https://new.example.com/callback" }));
		})
		.await;

	strategy
		.update_client(&ClientUpdate::default().description("Now with more examples."))
		.await
		.expect("Client update should succeed.");
	strategy
		.change_callback_url(&url("https://new.example.com/callback"))
		.await
		.expect("Redirect change should succeed.");

	update.assert_async().await;
	redirect.assert_async().await;
}

#[tokio::test]
async fn profiles_use_bearer_tokens_or_signed_queries() {
	let server = MockServer::start_async().await;
	let strategy = reqwest_strategy(options(&server.base_url()).client(credentials()));
	let own = server
		.mock_async(|when, then| {
			when.method(GET).path("/oauth2/userinfo").header("authorization", "Bearer access-1");
			then.status(200).json_body(json!({ "id": 1, "email": "jane@example.com" }));
		})
		.await;
	let other = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/oauth2/userinfo/7")
				.query_param("client_id", CLIENT_ID)
				.query_param("client_secret", CLIENT_SECRET);
			then.status(200).json_body(json!({ "id": 7, "name": "Joe" }));
		})
		.await;
	let profile = strategy.user_profile("access-1").await.expect("Own profile should load.");

	assert_eq!(profile.email(), Some("jane@example.com"));

	let profile = strategy.identity_profile("7").await.expect("Identity profile should load.");

	assert_eq!(profile.name(), Some("Joe"));

	own.assert_async().await;
	other.assert_async().await;
}

#[tokio::test]
async fn password_change_errors_keep_remote_kind() {
	let server = MockServer::start_async().await;
	let strategy = reqwest_strategy(options(&server.base_url()));
	let mock = server
		.mock_async(|when, then| {
			when.method(PUT).path("/oauth2/password").json_body(json!({
				"access_token": "access-1",
				"oldPassword": "old-password",
				"newPassword": "new-password",
			}));
			then.status(403).header("content-type", "application/json").json_body(json!({
				"errors": [{
					"errorType": "NoPermissionError",
					"message": "Access token expired.",
					"help": "Log in again."
				}]
			}));
		})
		.await;
	let err = strategy
		.change_password(&PasswordChange::new("access-1", "old-password", "new-password"))
		.await
		.expect_err("Expired tokens should be rejected.");

	mock.assert_calls_async(1).await;

	assert_eq!(err.kind(), ErrorKind::NoPermission);
	assert_eq!(err.message(), "Access token expired.");
	assert_eq!(err.transport().and_then(|failure| failure.status), Some(403));

	let help = err.help().expect("Remote errors should carry help.");

	assert!(help.contains("/oauth2/password failed."));
	assert!(help.ends_with("Log in again."));
}

#[tokio::test]
async fn complete_authorization_exchanges_code_and_loads_profile() {
	let server = MockServer::start_async().await;
	let strategy = reqwest_strategy(options(&server.base_url()).client(credentials()));
	let token = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth2/token")
				.header("content-type", "application/x-www-form-urlencoded")
				.form_urlencoded_tuple("grant_type", "authorization_code")
				.form_urlencoded_tuple("code", "code-1")
				.form_urlencoded_tuple("client_id", CLIENT_ID)
				.form_urlencoded_tuple("client_secret", CLIENT_SECRET);
			then.status(200).header("content-type", "application/json").json_body(json!({
				"access_token": "access-1",
				"token_type": "bearer",
				"expires_in": 3600,
			}));
		})
		.await;
	let profile = server
		.mock_async(|when, then| {
			when.method(GET).path("/oauth2/userinfo").header("authorization", "Bearer access-1");
			then.status(200).json_body(json!({ "id": "user-1", "email": "jane@example.com" }));
		})
		.await;
	let authenticated =
		strategy.complete_authorization("code-1").await.expect("Login should complete.");

	token.assert_async().await;
	profile.assert_async().await;

	assert_eq!(authenticated.grant.token_type, "bearer");
	assert!(authenticated.grant.refresh_token.is_none());
	assert_eq!(authenticated.profile.id().as_deref(), Some("user-1"));
}

#[tokio::test]
async fn rejected_codes_map_to_no_permission() {
	let server = MockServer::start_async().await;
	let strategy = reqwest_strategy(options(&server.base_url()).client(credentials()));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\",\"error_description\":\"already used\"}");
		})
		.await;
	let err = strategy.exchange_code("code-1").await.expect_err("Reused codes should fail.");

	mock.assert_async().await;

	assert_eq!(err.kind(), ErrorKind::NoPermission);
	assert_eq!(err.message(), "already used");
}

#[tokio::test]
async fn refused_connections_surface_service_unreachable() {
	let strategy = reqwest_strategy(options("http://127.0.0.1:1").retries(1));
	let err = strategy
		.user_profile("access-1")
		.await
		.expect_err("Nothing listens on port 1.");

	assert_eq!(err.kind(), ErrorKind::ServiceUnreachable);
	assert!(err.transport().is_some());
}
