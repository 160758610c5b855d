//! Gatehook demo runner.
//!
//! Builds a sample item API and runs a single gateway event through it. The
//! event is read from the file named by the first argument, or from stdin.
//!
//! ```text
//! echo '{"httpMethod":"GET","pathParameters":{"id":"7"}}' | gatehook
//! ```

use gatehook::prelude::*;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

/// Fields accepted when updating an item.
#[derive(Debug, Deserialize)]
struct ItemUpdate {
    name: String,
    racing_name: String,
    points: i64,
}

async fn get_item(event: ApiEvent, ctx: Context) -> Result<Value, LifecycleError> {
    let id = event
        .path_parameters
        .get("id")
        .ok_or_else(|| LifecycleError::not_found("item not found"))?;

    Ok(json!({
        "item_id": id,
        "request_id": ctx.request_id,
    }))
}

async fn update_item(event: ApiEvent, _ctx: Context) -> Result<Value, LifecycleError> {
    let update: ItemUpdate = event.body_as()?;
    tracing::info!(
        "Updating item {:?}: racing_name={}, points={}",
        event.path_parameters.get("id"),
        update.racing_name,
        update.points
    );

    Ok(json!({
        "statusCode": 200,
        "body": {
            "item_id": event.path_parameters.get("id"),
            "name": update.name,
        },
    }))
}

fn build_handler() -> Result<ApiHandler, LifecycleError> {
    ApiHandler::builder()
        .protection(ProtectionOptions::new(ProtectionMode::Fail))
        .cors(CorsOptions {
            allow_origin: Some("*".to_string()),
            allow_headers: vec!["Content-Type".to_string()],
            ..CorsOptions::default()
        })
        .callback_waits_for_empty_event_loop(false)
        .before(|ctx: Context| async move {
            tracing::debug!("Handling event [{}]", ctx.request_id);
            Ok::<Option<Value>, LifecycleError>(None)
        })
        .finally(|ctx: Context| async move {
            tracing::debug!("Finished event [{}]", ctx.request_id);
            Ok::<_, LifecycleError>(())
        })
        .get()
        .validation(Schema::new().path("id", FieldKind::Number))
        .handler(get_item)
        .put()
        .validation(
            Schema::new()
                .path("id", FieldKind::Number)
                .body("name", FieldKind::String)
                .body("racing_name", FieldKind::String)
                .body("points", FieldKind::Number),
        )
        .handler(update_item)
        .build()
}

async fn read_event() -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
    let mut raw = String::new();
    match std::env::args().nth(1) {
        Some(path) => raw = tokio::fs::read_to_string(path).await?,
        None => {
            tokio::io::stdin().read_to_string(&mut raw).await?;
        }
    }
    Ok(serde_json::from_str(&raw)?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let handler = build_handler()?;
    let event = read_event().await?;

    let mut context = Context::new("items", format!("{:x}", std::process::id()));
    let result = handler.execute(&event, &mut context).await?;

    tracing::info!(
        "Invocation complete (wait for empty loop: {})",
        context.callback_waits_for_empty_event_loop
    );
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
