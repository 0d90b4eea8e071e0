#![cfg(feature = "test")]

// crates.io
use serde_json::json;
// self
use proposal_token::{
	_preludet::*,
	engine::{ProposalEngine, ProposalRequest},
	proposal::{
		OUTSTANDING_MESSAGE, ProposalAction, ProposalToken, Resource, ResourceId, ResourceRef,
		ResourceType,
	},
	target::TargetRecord,
};

struct Team(u32);
impl Resource for Team {
	fn resource_type(&self) -> ResourceType {
		ResourceType::new("Team").expect("Team resource type should be valid.")
	}

	fn resource_id(&self) -> ResourceId {
		ResourceId::new(self.0.to_string()).expect("Team resource id should be valid.")
	}
}

async fn saved(engine: &ProposalEngine, request: ProposalRequest) -> ProposalToken {
	let mut token =
		engine.find_or_new(request).await.expect("Lookup before save should succeed.");

	engine.save(&mut token).await.expect("Proposal fixture should save.");

	token
}

fn validation_messages(err: Error) -> Vec<String> {
	match err {
		Error::Validation(errors) => errors.full_messages(),
		other => panic!("Expected a validation error, got {other:?}."),
	}
}

#[tokio::test]
async fn invite_then_remind_then_accept() {
	let (engine, _, _) = build_test_engine();
	let request = ProposalRequest::new("invitee@example.com", TEST_PROPOSABLE);
	let mut fresh =
		engine.find_or_new(request.clone()).await.expect("Lookup should succeed.");

	assert!(!fresh.is_persisted());
	assert_eq!(engine.action(&fresh).await.expect("Action should resolve."), ProposalAction::Invite);
	assert!(engine.is_invite(&fresh).await.expect("Action should resolve."));

	engine.save(&mut fresh).await.expect("Invite should save.");

	let mut again = engine.find_or_new(request).await.expect("Lookup should succeed.");

	assert_eq!(again.id(), fresh.id(), "find_or_new must return the stored proposal.");
	assert_eq!(again.to_string(), fresh.to_string());
	assert!(engine.is_remind(&again).await.expect("Action should resolve."));
	assert!(engine.remind(&mut again).await.expect("Remind should apply."));
	assert!(again.reminded_at().is_some());
	assert!(engine.accept_strict(&mut again).await.expect("Pending proposal should accept."));

	let stored = engine
		.find_by_token(&fresh.to_string())
		.await
		.expect("Token lookup should succeed.")
		.expect("Accepted proposal should still be stored.");

	assert_eq!(stored.accepted_at(), again.accepted_at());
	assert_eq!(stored.reminded_at(), again.reminded_at());
	assert!(!stored.is_acceptable());
}

#[tokio::test]
async fn registered_email_is_notified() {
	let (engine, _, directory) = build_test_engine();

	directory.insert(
		TEST_PROPOSABLE,
		TargetRecord::new("42", "member@example.com").with_attribute("name", "Member"),
	);

	let token = engine
		.find_or_new(ProposalRequest::new("member@example.com", TEST_PROPOSABLE))
		.await
		.expect("Lookup should succeed.");

	assert!(engine.is_notify(&token).await.expect("Action should resolve."));

	let record = engine.instance_named(&token, "user").await.expect("Accessor should resolve.");

	assert_eq!(record.id, "42");
	assert_eq!(record.attributes["name"], "Member");

	let stranger = ProposalToken::new("stranger@example.com", TEST_PROPOSABLE);

	assert!(engine.instance(&stranger).await.expect("Lookup should succeed.").is_none());
	assert!(matches!(
		engine.instance_strict(&stranger).await,
		Err(Error::TargetRecordNotFound { .. })
	));
}

#[tokio::test]
async fn duplicate_tuple_is_rejected_regardless_of_payload() {
	let (engine, store, _) = build_test_engine();

	saved(&engine, ProposalRequest::new("dup@example.com", TEST_PROPOSABLE)).await;

	let mut twin = ProposalToken::new("dup@example.com", TEST_PROPOSABLE)
		.with(json!({ "role": "admin" }))
		.with_expires_at(OffsetDateTime::now_utc() + Duration::days(3));
	let err = engine.save(&mut twin).await.expect_err("Duplicate tuple must be rejected.");

	assert_eq!(validation_messages(err), [format!("email {OUTSTANDING_MESSAGE}")]);
	assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn resources_scope_uniqueness() {
	let (engine, store, _) = build_test_engine();
	let email = "scoped@example.com";
	let first =
		saved(&engine, ProposalRequest::new(email, TEST_PROPOSABLE).for_resource(&Team(1))).await;
	let second =
		saved(&engine, ProposalRequest::new(email, TEST_PROPOSABLE).for_resource(&Team(2))).await;
	let bare = saved(&engine, ProposalRequest::new(email, TEST_PROPOSABLE)).await;

	assert_eq!(store.len(), 3);
	assert_ne!(first.id(), second.id());
	assert!(bare.resource().is_none());

	let moved = engine
		.retarget(&first, Some(ResourceRef::of(&Team(2))))
		.await
		.expect("Retarget lookup should succeed.");

	assert_eq!(moved.id(), second.id());

	let unused = engine
		.retarget(&first, Some(ResourceRef::of(&Team(3))))
		.await
		.expect("Retarget lookup should succeed.");

	assert!(!unused.is_persisted());
	assert_eq!(unused.resource(), Some(ResourceRef::of(&Team(3))));

	let any = engine
		.find_or_new(ProposalRequest::new(email, TEST_PROPOSABLE))
		.await
		.expect("Unscoped lookup should succeed.");

	assert_eq!(any.id(), first.id(), "Unscoped lookup returns the oldest match.");
}

#[tokio::test]
async fn blank_email_reports_presence_and_shape() {
	let (engine, store, _) = build_test_engine();
	let mut token = ProposalToken::new("", TEST_PROPOSABLE);
	let err = engine.save(&mut token).await.expect_err("Blank email must not save.");

	assert_eq!(validation_messages(err), ["email can't be blank", "email is not valid"]);
	assert!(store.is_empty());
}

#[tokio::test]
async fn argument_contract_reports_each_missing_key() {
	let (engine, _, _) = build_test_engine();
	let mut positional = ProposalToken::new("args@example.com", TEST_PROPOSABLE)
		.with(json!([1, 2]))
		.expecting(vec!["team", "role"]);
	let err = engine.save(&mut positional).await.expect_err("Positional payload must fail.");

	assert_eq!(
		validation_messages(err),
		["arguments must be a hash", "arguments is missing team", "arguments is missing role"]
	);

	let mut keyed = ProposalToken::new("args@example.com", TEST_PROPOSABLE)
		.with(json!({ "team": 7, "role": "" }))
		.expecting(vec!["team", "role"]);
	let err = engine.save(&mut keyed).await.expect_err("Blank value must fail.");

	assert_eq!(validation_messages(err), ["arguments is missing role"]);
}

#[tokio::test]
async fn arguments_survive_the_store() {
	let (engine, _, _) = build_test_engine();
	let mut token = ProposalToken::new("payload@example.com", TEST_PROPOSABLE)
		.with(json!({ "team_id": 7, "roles": ["admin", "owner"] }))
		.expecting("team_id");

	engine.save(&mut token).await.expect("Payload satisfying the contract should save.");

	let stored = engine
		.find_by_token(&token.to_string())
		.await
		.expect("Token lookup should succeed.")
		.expect("Saved proposal should be stored.");
	let arguments = stored.arguments().expect("Stored proposal should keep its payload.");

	assert_eq!(arguments.get("team_id"), Some(&json!(7)));
	assert_eq!(arguments.get("roles"), Some(&json!(["admin", "owner"])));
	assert!(stored.expects().is_none(), "The contract is never persisted.");
}

#[tokio::test]
async fn context_tags_select_proposals() {
	let (engine, _, _) = build_test_engine();

	for (email, context) in [
		("one@example.com", ["org", "1"]),
		("two@example.com", ["org", "1"]),
		("three@example.com", ["org", "2"]),
	] {
		let mut token = ProposalToken::new(email, TEST_PROPOSABLE).with_context(context);

		engine.save(&mut token).await.expect("Context fixture should save.");
	}

	let found = engine.find_by_context(["org", "1"]).await.expect("Context query should succeed.");
	let emails: Vec<_> = found.iter().map(ProposalToken::email).collect();

	assert_eq!(emails, ["one@example.com", "two@example.com"]);
	assert!(engine.find_by_context(["org"]).await.expect("Context query should succeed.").is_empty());
}

#[tokio::test]
async fn unknown_token_lookup_is_empty() {
	let (engine, _, _) = build_test_engine();

	assert!(engine.find_by_token("missing").await.expect("Lookup should succeed.").is_none());
}
