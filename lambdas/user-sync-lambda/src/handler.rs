use aws_lambda_events::event::cognito::CognitoEventUserPoolsPostConfirmation;
use facturapos_shared::config::DbConfig;
use facturapos_shared::db;
use facturapos_shared::types::{SignupProfile, SyncOutcome};
use facturapos_shared::users::{self, PgUserStore};
use facturapos_shared::StoreError;
use lambda_runtime::{Error, LambdaEvent};

/// The only Cognito trigger that performs a sync.
const CONFIRM_SIGNUP_TRIGGER: &str = "PostConfirmation_ConfirmSignUp";

/// PostConfirmation trigger - mirrors the confirmed Cognito user into the
/// relational `users` table.
///
/// Always returns the original event: a failed sync must never block the
/// signup flow, so every internal error is logged and swallowed.
pub(crate) async fn function_handler(
    event: LambdaEvent<CognitoEventUserPoolsPostConfirmation>,
) -> Result<CognitoEventUserPoolsPostConfirmation, Error> {
    let payload = event.payload;

    let trigger = payload
        .cognito_event_user_pools_header
        .trigger_source
        .as_deref()
        .unwrap_or("");
    if trigger != CONFIRM_SIGNUP_TRIGGER {
        tracing::info!("Ignoring trigger source: {}", trigger);
        return Ok(payload);
    }

    let Some(profile) = extract_profile(&payload) else {
        tracing::error!("Confirmation event missing sub or email, skipping user sync");
        return Ok(payload);
    };

    match sync_profile(&profile).await {
        Ok(SyncOutcome::Created) => {
            tracing::info!("Created user record for cognito sub {}", profile.cognito_sub);
        }
        Ok(SyncOutcome::Updated) => {
            tracing::info!("Updated user record for cognito sub {}", profile.cognito_sub);
        }
        Ok(SyncOutcome::Unchanged) => {
            tracing::info!(
                "User record already current for cognito sub {}",
                profile.cognito_sub
            );
        }
        Err(e) => {
            // TODO: route failed syncs to a dead-letter queue for
            // reconciliation; until then this log line is the only trail.
            tracing::error!(
                "User sync failed for cognito sub {}: {}",
                profile.cognito_sub,
                e
            );
        }
    }

    Ok(payload)
}

async fn sync_profile(profile: &SignupProfile) -> Result<SyncOutcome, StoreError> {
    let config = DbConfig::from_env()?;
    let pool = db::shared_pool(&config).await?;
    let store = PgUserStore::new(pool.clone());
    users::sync_user(&store, profile).await
}

/// Pull the fields the sync cares about out of the event. Sub and email are
/// required; everything else is optional. Empty strings count as absent.
fn extract_profile(event: &CognitoEventUserPoolsPostConfirmation) -> Option<SignupProfile> {
    let attributes = &event.request.user_attributes;

    let cognito_sub = non_empty(attributes.get("sub"))?;
    let email = non_empty(attributes.get("email"))?;

    Some(SignupProfile {
        cognito_sub: cognito_sub.to_string(),
        // Normalized before any comparison or write
        email: email.to_lowercase(),
        name: non_empty(attributes.get("name")).map(str::to_string),
        username: non_empty(event.cognito_event_user_pools_header.user_name.as_ref())
            .map(str::to_string),
        phone_number: non_empty(attributes.get("phone_number")).map(str::to_string),
        restaurant_name: non_empty(attributes.get("custom:restaurantName")).map(str::to_string),
    })
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_runtime::Context;

    fn confirmation_event(attributes: &[(&str, &str)]) -> CognitoEventUserPoolsPostConfirmation {
        let mut event = CognitoEventUserPoolsPostConfirmation::default();
        event.cognito_event_user_pools_header.trigger_source =
            Some(CONFIRM_SIGNUP_TRIGGER.to_string());
        event.cognito_event_user_pools_header.user_name = Some("carlos".to_string());
        for (key, value) in attributes {
            event
                .request
                .user_attributes
                .insert(key.to_string(), value.to_string());
        }
        event
    }

    #[tokio::test]
    async fn test_irrelevant_trigger_is_a_no_op() {
        let mut event = confirmation_event(&[("sub", "abc-123"), ("email", "a@b.com")]);
        event.cognito_event_user_pools_header.trigger_source =
            Some("PostConfirmation_ConfirmForgotPassword".to_string());

        let expected = event.clone();
        let returned = function_handler(LambdaEvent::new(event, Context::default()))
            .await
            .unwrap();
        assert_eq!(returned, expected);
    }

    #[tokio::test]
    async fn test_missing_sub_returns_event_unchanged() {
        let event = confirmation_event(&[("email", "a@b.com")]);

        let expected = event.clone();
        let returned = function_handler(LambdaEvent::new(event, Context::default()))
            .await
            .unwrap();
        assert_eq!(returned, expected);
    }

    #[tokio::test]
    async fn test_missing_email_returns_event_unchanged() {
        let event = confirmation_event(&[("sub", "abc-123")]);

        let expected = event.clone();
        let returned = function_handler(LambdaEvent::new(event, Context::default()))
            .await
            .unwrap();
        assert_eq!(returned, expected);
    }

    #[tokio::test]
    async fn test_unreachable_store_still_returns_event() {
        // No DB_* variables in the test environment, so the sync path fails
        // before any connection attempt; the event must come back anyway.
        let event = confirmation_event(&[("sub", "abc-123"), ("email", "user@example.com")]);

        let expected = event.clone();
        let returned = function_handler(LambdaEvent::new(event, Context::default()))
            .await
            .unwrap();
        assert_eq!(returned, expected);
    }

    #[test]
    fn test_extract_profile_normalizes_email() {
        let event = confirmation_event(&[("sub", "abc-123"), ("email", "User@Example.COM")]);

        let profile = extract_profile(&event).unwrap();
        assert_eq!(profile.email, "user@example.com");
    }

    #[test]
    fn test_extract_profile_reads_optional_attributes() {
        let event = confirmation_event(&[
            ("sub", "abc-123"),
            ("email", "carlos@example.com"),
            ("name", "Carlos"),
            ("phone_number", "+525512345678"),
            ("custom:restaurantName", "La Taqueria"),
        ]);

        let profile = extract_profile(&event).unwrap();
        assert_eq!(profile.cognito_sub, "abc-123");
        assert_eq!(profile.name.as_deref(), Some("Carlos"));
        assert_eq!(profile.username.as_deref(), Some("carlos"));
        assert_eq!(profile.phone_number.as_deref(), Some("+525512345678"));
        assert_eq!(profile.restaurant_name.as_deref(), Some("La Taqueria"));
    }

    #[test]
    fn test_extract_profile_treats_empty_values_as_absent() {
        let event = confirmation_event(&[
            ("sub", "abc-123"),
            ("email", "carlos@example.com"),
            ("name", ""),
        ]);
        assert_eq!(extract_profile(&event).unwrap().name, None);

        let event = confirmation_event(&[("sub", ""), ("email", "carlos@example.com")]);
        assert!(extract_profile(&event).is_none());
    }

    #[test]
    fn test_event_wire_shape_deserializes() {
        let raw = r#"{
            "version": "1",
            "region": "us-east-1",
            "userPoolId": "us-east-1_example",
            "userName": "carlos",
            "triggerSource": "PostConfirmation_ConfirmSignUp",
            "callerContext": {
                "awsSdkVersion": "aws-sdk-unknown-unknown",
                "clientId": "client-id"
            },
            "request": {
                "userAttributes": {
                    "sub": "abc-123",
                    "email": "carlos@example.com",
                    "custom:restaurantName": "La Taqueria"
                }
            },
            "response": {}
        }"#;

        let event: CognitoEventUserPoolsPostConfirmation = serde_json::from_str(raw).unwrap();
        assert_eq!(
            event
                .cognito_event_user_pools_header
                .trigger_source
                .as_deref(),
            Some(CONFIRM_SIGNUP_TRIGGER)
        );

        let profile = extract_profile(&event).unwrap();
        assert_eq!(profile.cognito_sub, "abc-123");
        assert_eq!(profile.restaurant_name.as_deref(), Some("La Taqueria"));
    }
}
