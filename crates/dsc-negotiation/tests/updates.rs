mod common;

use bytes::Bytes;
use common::*;
use dsc_store::Repository;
use dsc_types::{
    EntityKind, Factory, ResourceDesc, SubscriptionDesc, SubscriptionFactory, Uri,
};
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

async fn hook(server: &MockServer, at: &str, expected: u64) {
    Mock::given(method("POST"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200))
        .expect(expected)
        .mount(server)
        .await;
}

async fn subscribe(provider: &Provider, target: &Uri, url: String, push_data: bool) {
    let subscription = SubscriptionFactory::create(SubscriptionDesc {
        title: Some("watch".into()),
        target: target.clone(),
        url: uri(&url),
        subscriber: consumer_id(),
        push_data,
    })
    .unwrap();
    provider.ctx.store.subscriptions.save(subscription).await.unwrap();
}

/// Wait for the background deliveries to reach the server.
async fn received(server: &MockServer, expected: usize) -> Vec<Request> {
    for _ in 0..200 {
        let requests = server.received_requests().await.unwrap_or_default();
        if requests.len() >= expected {
            return requests;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    server.received_requests().await.unwrap_or_default()
}

async fn resource_link(provider: &Provider, id: Uuid) -> Uri {
    let resource = provider.ctx.store.resources.get(id).await.unwrap().unwrap();
    provider.ctx.self_links.resolve(&resource).unwrap()
}

fn representation_link(provider: &Provider, id: Uuid) -> Uri {
    provider
        .ctx
        .self_links
        .link_for(EntityKind::Representation, id)
        .unwrap()
}

#[tokio::test]
async fn resource_update_cascades_to_representations_and_artifacts() {
    let server = MockServer::start().await;
    hook(&server, "/resource", 1).await;
    hook(&server, "/representation", 1).await;
    hook(&server, "/artifact", 1).await;
    hook(&server, "/elsewhere", 0).await;

    let provider = Provider::new().await;
    let offer = provider.offer("a").await;
    let unrelated = provider.offer("b").await;

    let target = resource_link(&provider, offer.resource).await;
    subscribe(&provider, &target, format!("{}/resource", server.uri()), false).await;
    let target = representation_link(&provider, offer.representation);
    subscribe(&provider, &target, format!("{}/representation", server.uri()), false).await;
    subscribe(&provider, &offer.link, format!("{}/artifact", server.uri()), false).await;
    subscribe(&provider, &unrelated.link, format!("{}/elsewhere", server.uri()), false).await;

    let updated = provider
        .ctx
        .update_resource(
            offer.resource,
            ResourceDesc {
                description: Some("hourly readings".into()),
                ..ResourceDesc::offered("weather data")
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.version, 1);
    assert_eq!(updated.description, "hourly readings");

    let requests = received(&server, 3).await;
    let mut paths: Vec<_> = requests.iter().map(|r| r.url.path().to_string()).collect();
    paths.sort();
    assert_eq!(paths, vec!["/artifact", "/representation", "/resource"]);
}

#[tokio::test]
async fn unchanged_resource_notifies_nobody() {
    let server = MockServer::start().await;
    hook(&server, "/resource", 0).await;

    let provider = Provider::new().await;
    let offer = provider.offer("a").await;
    let target = resource_link(&provider, offer.resource).await;
    subscribe(&provider, &target, format!("{}/resource", server.uri()), false).await;

    let resource = provider
        .ctx
        .update_resource(offer.resource, ResourceDesc::offered("weather data"))
        .await
        .unwrap();
    assert_eq!(resource.version, 0);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn updating_a_missing_resource_is_not_found() {
    let provider = Provider::new().await;
    let err = provider
        .ctx
        .update_resource(Uuid::new_v4(), ResourceDesc::offered("ghost"))
        .await
        .unwrap_err();
    assert_eq!(err.rejection_reason(), dsc_types::RejectionReason::NotFound);
}

#[tokio::test]
async fn representation_update_reaches_only_its_artifacts() {
    let server = MockServer::start().await;
    hook(&server, "/representation", 1).await;
    hook(&server, "/artifact", 1).await;
    hook(&server, "/resource", 0).await;

    let provider = Provider::new().await;
    let offer = provider.offer("a").await;
    let resource = resource_link(&provider, offer.resource).await;
    subscribe(&provider, &resource, format!("{}/resource", server.uri()), false).await;
    let representation = representation_link(&provider, offer.representation);
    subscribe(&provider, &representation, format!("{}/representation", server.uri()), false).await;
    subscribe(&provider, &offer.link, format!("{}/artifact", server.uri()), false).await;

    let handles = provider.ctx.notify_on_update(&representation).await.unwrap();
    assert_eq!(handles.len(), 2);
    let mut delivered = 0;
    for handle in handles {
        delivered += handle.await.unwrap();
    }
    assert_eq!(delivered, 2);
}

#[tokio::test]
async fn artifact_data_update_pushes_new_data() {
    let server = MockServer::start().await;
    hook(&server, "/push", 1).await;

    let provider = Provider::new().await;
    let offer = provider.offer("old").await;
    subscribe(&provider, &offer.link, format!("{}/push", server.uri()), true).await;

    let artifact = provider
        .ctx
        .update_artifact_data(offer.artifact, Bytes::from_static(b"fresh"))
        .await
        .unwrap();
    assert!(artifact.has_local_data());

    let requests = received(&server, 1).await;
    assert_eq!(requests.len(), 1);
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["event"], "UPDATED");
    assert_eq!(body["target"], offer.link.as_str());
    assert_eq!(body["data"]["value"], "fresh");
}

#[tokio::test]
async fn data_update_of_unknown_artifact_is_not_found() {
    let provider = Provider::new().await;
    let err = provider
        .ctx
        .update_artifact_data(Uuid::new_v4(), Bytes::from_static(b"x"))
        .await
        .unwrap_err();
    assert_eq!(err.rejection_reason(), dsc_types::RejectionReason::NotFound);
}
