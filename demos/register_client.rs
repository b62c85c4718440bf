//! Demonstrates registering a site as an OAuth client, then completing a login, against a mocked
//! identity service using the default reqwest transport.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use oauth2_strategy::{
	config::StrategyOptions, http::ReqwestTransport, reqwest::Client, strategy::ReqwestStrategy,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let register_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/client");
			then.status(200).header("content-type", "application/json").body(
				"{\"client_id\":\"demo-client\",\"client_secret\":\"demo-secret\",\"name\":\"Demo Blog\"}",
			);
		})
		.await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"bearer\",\"expires_in\":900}",
			);
		})
		.await;
	let profile_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/oauth2/userinfo").header("authorization", "Bearer demo-access");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":1,\"name\":\"Demo Owner\",\"email\":\"owner@example.com\"}");
		})
		.await;
	let options = StrategyOptions::builder()
		.url(Url::parse(&server.base_url())?)
		.callback_url(Url::parse("https://blog.example.com/ghost/oauth/callback")?)
		.site_uri(Url::parse("https://blog.example.com")?)
		.retries(3)
		.retry_hook(|err| eprintln!("Retrying: {err} ({}).", err.context().unwrap_or("-")))
		.build()?;
	// httpmock serves a self-signed certificate.
	let client = Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()?;
	let strategy = ReqwestStrategy::with_transport(options, ReqwestTransport::with_client(client))?;
	let registered = strategy.register_client("Demo Blog", Some("Registered by a demo.")).await?;

	println!("Registered client {}.", registered.client_id);

	let request = strategy.authorization_request(Some("owner@example.com"))?;

	println!("Send the user to {}.", request.authorize_url);

	// The redirect echoes the state back alongside the code.
	request.validate_state(&request.state)?;

	let authenticated = strategy.complete_authorization("demo-code").await?;

	println!(
		"Logged in as {} until {:?}.",
		authenticated.profile.name().unwrap_or("unknown"),
		authenticated.grant.expires_at
	);

	register_mock.assert_async().await;
	token_mock.assert_async().await;
	profile_mock.assert_async().await;

	Ok(())
}
