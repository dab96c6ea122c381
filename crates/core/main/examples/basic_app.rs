//! Basic example running one signed and one forged call through the pipeline.
//!
//! Run with: cargo run --example basic_app

use webhook_client::prelude::*;
use webhook_client::sign_payload;
use webhook_client_adapter_memory::{InMemoryTaskQueue, MemoryCallStore};

#[tokio::main]
async fn main() -> Result<(), WebhookClientError> {
    let registry = Arc::new(ConfigRegistry::new());
    registry
        .register(
            WebhookConfig::builder("stripe")
                .signing_secret("abc123")
                .store_headers(StoreHeaders::only(["Signature"]))
                .build()?,
        )
        .await;

    let store = MemoryCallStore::shared();
    let queue = InMemoryTaskQueue::shared();
    let processor = WebhookProcessor::new(registry, store.clone(), queue.clone());

    // A correctly signed call is stored and dispatched
    let body = serde_json::json!({ "type": "invoice.paid", "amount": 4200 }).to_string();
    let signature = sign_payload("abc123", body.as_bytes())?;
    let signed = IncomingWebhook::new("stripe", body.clone(), [("Signature", signature)]);

    let outcome = processor.process(signed).await?;
    println!(
        "Accepted call: stage={} record={:?} status={}",
        outcome.stage, outcome.record_id, outcome.response.status
    );

    if let Some(task) = queue.dequeue().await {
        if let Some(record) = store.get(&task.record_id).await? {
            println!("Task {} references payload {:?}", task.task_ref, record.payload);
        }
    }

    // A forged call is rejected and nothing is stored
    let forged = IncomingWebhook::new("stripe", body, [("Signature", "forged")]);
    match processor.process(forged).await {
        Ok(_) => println!("Forged call was accepted?"),
        Err(err) => println!("Forged call rejected: {err}"),
    }
    println!("Stored calls: {}", store.count().await);

    Ok(())
}
