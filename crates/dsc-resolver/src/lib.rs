//! Artifact data resolution.
//!
//! [`ArtifactResolver`] serves the bytes behind an artifact from one of
//! three places:
//!
//! - bytes held locally by the connector
//! - an HTTP(S) backend queried live through an [`HttpFetcher`]
//! - the providing connector, pulled through an [`ArtifactPuller`] under one
//!   of the agreements linked to the artifact and cached locally
//!
//! Every successful read bumps the artifact's access counter exactly once.
//! Every data write, downloads included, is reported to the resolver's
//! [`ArtifactUpdateListener`].

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod error;
mod fetcher;
mod listener;
mod puller;
mod resolver;

pub use error::{ResolverError, ResolverResult};
pub use fetcher::{build_url, HttpFetcher, ReqwestFetcher};
pub use listener::ArtifactUpdateListener;
pub use puller::{ArtifactPuller, HttpArtifactPuller, PullRequest};
pub use resolver::ArtifactResolver;

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use dsc_linker::Relations;
    use dsc_store::{ConnectorStore, Repository};
    use dsc_types::{
        AgreementDesc, AgreementFactory, Artifact, ArtifactDesc, ArtifactFactory, BasicAuth,
        Entity, Factory, QueryInput, Uri,
    };
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use uuid::Uuid;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Puller answering from a script, recording every request.
    #[derive(Default)]
    struct ScriptedPuller {
        answers: Mutex<Vec<ResolverResult<Bytes>>>,
        seen: Mutex<Vec<PullRequest>>,
    }

    impl ScriptedPuller {
        fn answering(answers: Vec<ResolverResult<Bytes>>) -> Self {
            Self {
                answers: Mutex::new(answers),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn seen(&self) -> Vec<PullRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ArtifactPuller for ScriptedPuller {
        async fn pull(&self, request: &PullRequest) -> ResolverResult<Bytes> {
            self.seen.lock().unwrap().push(request.clone());
            let mut answers = self.answers.lock().unwrap();
            if answers.is_empty() {
                Err(ResolverError::Remote("no scripted answer".into()))
            } else {
                answers.remove(0)
            }
        }
    }

    /// Listener remembering which artifacts changed and to what.
    #[derive(Default)]
    struct RecordingListener {
        updates: Mutex<Vec<(Uuid, Bytes)>>,
    }

    #[async_trait]
    impl ArtifactUpdateListener for RecordingListener {
        async fn artifact_updated(&self, artifact: &Artifact) {
            let data = match &artifact.data {
                dsc_types::Data::Local { value } => value.clone(),
                dsc_types::Data::Remote { .. } => Bytes::new(),
            };
            self.updates.lock().unwrap().push((artifact.id(), data));
        }
    }

    struct Fixture {
        store: ConnectorStore,
        relations: Relations,
        puller: Arc<ScriptedPuller>,
        resolver: ArtifactResolver,
    }

    impl Fixture {
        fn new(puller: ScriptedPuller) -> Self {
            let store = ConnectorStore::in_memory();
            let relations = Relations::new(&store);
            let puller = Arc::new(puller);
            let fetcher = Arc::new(ReqwestFetcher::new(Duration::from_secs(5)).unwrap());
            let resolver = ArtifactResolver::new(&store, &relations, fetcher, puller.clone());
            Self {
                store,
                relations,
                puller,
                resolver,
            }
        }

        async fn artifact(&self, desc: ArtifactDesc) -> Uuid {
            let artifact = ArtifactFactory::create(desc).unwrap();
            self.store.artifacts.save(artifact).await.unwrap().id()
        }

        async fn stored(&self, id: Uuid) -> Artifact {
            self.store.artifacts.get(id).await.unwrap().unwrap()
        }

        async fn agreement_for(&self, artifact: Uuid, remote_id: &str) {
            let agreement = AgreementFactory::create(AgreementDesc {
                remote_id: Some(uri(remote_id)),
                confirmed: true,
                value: "{}".into(),
            })
            .unwrap();
            let id = self.store.agreements.save(agreement).await.unwrap().id();
            self.relations
                .agreement_artifacts
                .add(id, &[artifact])
                .await
                .unwrap();
        }
    }

    fn uri(s: &str) -> Uri {
        Uri::parse(s).unwrap()
    }

    fn mirrored(automated: bool) -> ArtifactDesc {
        ArtifactDesc {
            title: Some("mirror".into()),
            automated_download: automated,
            remote_id: Some(uri("https://provider.example/api/artifacts/1")),
            remote_address: Some(uri("https://provider.example/api/ids/data")),
            ..ArtifactDesc::default()
        }
    }

    #[tokio::test]
    async fn local_read_counts_each_access() {
        let fx = Fixture::new(ScriptedPuller::default());
        let id = fx.artifact(ArtifactDesc::local("hello", "HELLO")).await;

        for expected in 1..=3 {
            let data = fx.resolver.get_data(id, None, None).await.unwrap();
            assert_eq!(&data[..], b"HELLO");
            assert_eq!(fx.stored(id).await.access_counter, expected);
        }
        assert!(fx.puller.seen().is_empty());
    }

    #[tokio::test]
    async fn unknown_artifact_is_not_found() {
        let fx = Fixture::new(ScriptedPuller::default());
        let err = fx
            .resolver
            .get_data(Uuid::new_v4(), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolverError::ResourceNotFound(_)));
    }

    #[tokio::test]
    async fn backend_data_is_read_live() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(ResponseTemplate::new(200).set_body_string("live"))
            .expect(2)
            .mount(&server)
            .await;

        let fx = Fixture::new(ScriptedPuller::default());
        let mut desc = ArtifactDesc::remote("backend", format!("{}/data", server.uri()));
        desc.basic_auth = Some(BasicAuth {
            username: "u".into(),
            password: "p".into(),
        });
        let id = fx.artifact(desc).await;

        for _ in 0..2 {
            let data = fx.resolver.get_data(id, None, None).await.unwrap();
            assert_eq!(&data[..], b"live");
        }
        let stored = fx.stored(id).await;
        assert_eq!(stored.access_counter, 2);
        // Backend-backed data is never cached.
        assert_eq!(stored.byte_size, 0);
    }

    #[tokio::test]
    async fn failed_backend_read_leaves_counter_alone() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let fx = Fixture::new(ScriptedPuller::default());
        let id = fx
            .artifact(ArtifactDesc::remote("backend", server.uri()))
            .await;

        let err = fx.resolver.get_data(id, None, None).await.unwrap_err();
        assert!(matches!(err, ResolverError::Resource(_)));
        assert_eq!(fx.stored(id).await.access_counter, 0);
    }

    #[tokio::test]
    async fn automated_download_tries_each_agreement() {
        let fx = Fixture::new(ScriptedPuller::answering(vec![
            Err(ResolverError::Remote("rejected".into())),
            Ok(Bytes::from_static(b"pulled")),
        ]));
        let id = fx.artifact(mirrored(true)).await;
        fx.agreement_for(id, "https://provider.example/api/agreements/1")
            .await;
        fx.agreement_for(id, "https://provider.example/api/agreements/2")
            .await;

        let query = QueryInput {
            optional: Some("latest".into()),
            ..QueryInput::default()
        };
        let data = fx.resolver.get_data(id, Some(&query), None).await.unwrap();
        assert_eq!(&data[..], b"pulled");

        let seen = fx.puller.seen();
        assert_eq!(seen.len(), 2);
        assert_ne!(seen[0].transfer_contract, seen[1].transfer_contract);
        assert_eq!(seen[0].query, Some(query));
        assert_eq!(
            seen[0].artifact.as_str(),
            "https://provider.example/api/artifacts/1"
        );

        let stored = fx.stored(id).await;
        assert!(stored.has_local_data());
        assert_eq!(stored.byte_size, 6);
        assert!(stored.checksum.is_some());
        assert_eq!(stored.access_counter, 1);
    }

    #[tokio::test]
    async fn explicit_override_skips_download() {
        let fx = Fixture::new(ScriptedPuller::default());
        let id = fx.artifact(mirrored(true)).await;
        fx.agreement_for(id, "https://provider.example/api/agreements/1")
            .await;

        let data = fx.resolver.get_data(id, None, Some(false)).await.unwrap();
        assert!(data.is_empty());
        assert!(fx.puller.seen().is_empty());
        assert_eq!(fx.stored(id).await.access_counter, 1);
    }

    #[tokio::test]
    async fn failing_pulls_report_the_last_error() {
        let fx = Fixture::new(ScriptedPuller::answering(vec![
            Err(ResolverError::Remote("first".into())),
            Err(ResolverError::Remote("second".into())),
        ]));
        let id = fx.artifact(mirrored(true)).await;
        fx.agreement_for(id, "https://provider.example/api/agreements/1")
            .await;
        fx.agreement_for(id, "https://provider.example/api/agreements/2")
            .await;

        let err = fx.resolver.get_data(id, None, None).await.unwrap_err();
        assert!(matches!(err, ResolverError::Remote(msg) if msg == "second"));
        assert_eq!(fx.stored(id).await.access_counter, 0);
    }

    #[tokio::test]
    async fn download_without_agreement_fails() {
        let fx = Fixture::new(ScriptedPuller::default());
        let id = fx.artifact(mirrored(false)).await;

        let err = fx
            .resolver
            .get_data(id, None, Some(true))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolverError::Resource(_)));
    }

    #[tokio::test]
    async fn concurrent_reads_count_every_access() {
        let fx = Arc::new(Fixture::new(ScriptedPuller::default()));
        let id = fx.artifact(ArtifactDesc::local("hello", "HELLO")).await;

        let mut handles = Vec::new();
        for _ in 0..20 {
            let fx = fx.clone();
            handles.push(tokio::spawn(async move {
                fx.resolver.get_data(id, None, None).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(fx.stored(id).await.access_counter, 20);
    }

    #[test]
    fn download_decision_follows_override_then_flags() {
        let mut artifact = ArtifactFactory::create(mirrored(false)).unwrap();
        assert!(!ArtifactResolver::should_download(&artifact, None));
        assert!(ArtifactResolver::should_download(&artifact, Some(true)));

        artifact.automated_download = true;
        assert!(ArtifactResolver::should_download(&artifact, None));
        assert!(!ArtifactResolver::should_download(&artifact, Some(false)));

        artifact.automated_download = false;
        artifact.set_local_data(Bytes::from_static(b"cached"));
        assert!(ArtifactResolver::should_download(&artifact, None));
    }

    #[tokio::test]
    async fn data_writes_reach_the_listener() {
        let mut fx = Fixture::new(ScriptedPuller::answering(vec![Ok(Bytes::from_static(
            b"pulled",
        ))]));
        let listener = Arc::new(RecordingListener::default());
        fx.resolver = ArtifactResolver::new(
            &fx.store,
            &fx.relations,
            Arc::new(ReqwestFetcher::new(Duration::from_secs(5)).unwrap()),
            fx.puller.clone(),
        )
        .with_listener(listener.clone());

        let local = fx.artifact(ArtifactDesc::local("hello", "HELLO")).await;
        fx.resolver
            .set_data(local, Bytes::from_static(b"BYE"))
            .await
            .unwrap();

        let mirror = fx.artifact(mirrored(true)).await;
        fx.agreement_for(mirror, "https://provider.example/api/agreements/1")
            .await;
        fx.resolver.get_data(mirror, None, None).await.unwrap();

        // Plain reads are not updates.
        fx.resolver.get_data(local, None, None).await.unwrap();

        assert_eq!(
            *listener.updates.lock().unwrap(),
            vec![
                (local, Bytes::from_static(b"BYE")),
                (mirror, Bytes::from_static(b"pulled")),
            ]
        );
    }
}
