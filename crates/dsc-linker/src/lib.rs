//! Relation linking for the connector graph.
//!
//! A [`Linker`] manages the edges between one parent record type and one
//! child record type with set semantics:
//!
//! - `add` is idempotent and validates every id before mutating anything
//! - `remove` ignores ids that are not linked
//! - `replace` clears then adds; an empty set clears all links
//!
//! Owning linkers keep the edge list on the parent, non-owning linkers on
//! the children. [`Relations`] wires one linker per edge of the
//! catalog → resource → representation → artifact, contract → rule and
//! agreement → artifact graph.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod error;
mod linker;
mod relations;

pub use error::{LinkError, LinkResult};
pub use linker::{GetLinks, LinkAccess, Linker, SetLinks};
pub use relations::Relations;

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dsc_store::{
        ConnectorStore, InMemoryRepository, Mutation, QueryWindow, Repository, StorageResult,
    };
    use dsc_types::{
        Agreement, AgreementDesc, AgreementFactory, Artifact, ArtifactDesc, ArtifactFactory,
        Entity, EntityKind, Factory, Representation, RepresentationDesc, RepresentationFactory,
    };
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use uuid::Uuid;

    /// Repository wrapper counting reads and writes.
    struct Counting<T> {
        inner: InMemoryRepository<T>,
        reads: AtomicUsize,
        writes: AtomicUsize,
    }

    impl<T> Counting<T> {
        fn new() -> Self {
            Self {
                inner: InMemoryRepository::new(),
                reads: AtomicUsize::new(0),
                writes: AtomicUsize::new(0),
            }
        }

        fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }

        fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        fn read(&self) {
            self.reads.fetch_add(1, Ordering::SeqCst);
        }

        fn write(&self) {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl<T: Entity> Repository<T> for Counting<T> {
        async fn get(&self, id: Uuid) -> StorageResult<Option<T>> {
            self.read();
            self.inner.get(id).await
        }

        async fn get_including_deleted(&self, id: Uuid) -> StorageResult<Option<T>> {
            self.read();
            self.inner.get_including_deleted(id).await
        }

        async fn exists(&self, id: Uuid) -> StorageResult<bool> {
            self.read();
            self.inner.exists(id).await
        }

        async fn missing(&self, ids: &[Uuid]) -> StorageResult<Vec<Uuid>> {
            self.read();
            self.inner.missing(ids).await
        }

        async fn get_many(&self, ids: &[Uuid]) -> StorageResult<Vec<T>> {
            self.read();
            self.inner.get_many(ids).await
        }

        async fn save(&self, entity: T) -> StorageResult<T> {
            self.write();
            self.inner.save(entity).await
        }

        async fn list(&self, window: QueryWindow) -> StorageResult<Vec<T>> {
            self.read();
            self.inner.list(window).await
        }

        async fn delete(&self, id: Uuid) -> StorageResult<bool> {
            self.write();
            self.inner.delete(id).await
        }

        async fn modify(&self, id: Uuid, mutation: Mutation<T>) -> StorageResult<T> {
            self.write();
            self.inner.modify(id, mutation).await
        }
    }

    fn artifacts_of(r: &Representation) -> &[Uuid] {
        &r.artifacts
    }

    fn set_artifacts_of(r: &mut Representation, ids: Vec<Uuid>) {
        r.artifacts = ids;
    }

    struct Fixture {
        representations: Arc<Counting<Representation>>,
        artifacts: Arc<Counting<Artifact>>,
        linker: Linker<Representation, Artifact>,
    }

    impl Fixture {
        fn new() -> Self {
            let representations = Arc::new(Counting::new());
            let artifacts = Arc::new(Counting::new());
            let linker = Linker::owning(
                representations.clone(),
                artifacts.clone(),
                artifacts_of,
                set_artifacts_of,
            );
            Self {
                representations,
                artifacts,
                linker,
            }
        }

        async fn representation(&self) -> Uuid {
            let rep = RepresentationFactory::create(RepresentationDesc::default()).unwrap();
            self.representations.save(rep).await.unwrap().id()
        }

        async fn artifact(&self) -> Uuid {
            let artifact = ArtifactFactory::create(ArtifactDesc::local("a", "x")).unwrap();
            self.artifacts.save(artifact).await.unwrap().id()
        }

        async fn linked(&self, owner: Uuid) -> Vec<Uuid> {
            let mut ids = self.linker.get_ids(owner).await.unwrap();
            ids.sort();
            ids
        }
    }

    #[tokio::test]
    async fn empty_add_performs_no_lookups() {
        let fx = Fixture::new();
        let (reads, writes) = (fx.representations.reads(), fx.representations.writes());

        // Unknown owner: an empty add must not even notice.
        fx.linker.add(Uuid::new_v4(), &[]).await.unwrap();

        assert_eq!(fx.representations.reads(), reads);
        assert_eq!(fx.representations.writes(), writes);
        assert_eq!(fx.artifacts.reads(), 0);
    }

    #[tokio::test]
    async fn add_persists_owner_once() {
        let fx = Fixture::new();
        let owner = fx.representation().await;
        let ids = vec![fx.artifact().await, fx.artifact().await, fx.artifact().await];
        let writes = fx.representations.writes();

        fx.linker.add(owner, &ids).await.unwrap();

        assert_eq!(fx.representations.writes(), writes + 1);
        assert_eq!(fx.linked(owner).await.len(), 3);
    }

    #[tokio::test]
    async fn add_with_unknown_child_leaves_no_partial_edges() {
        let fx = Fixture::new();
        let owner = fx.representation().await;
        let known = fx.artifact().await;
        let unknown = Uuid::new_v4();

        let err = fx.linker.add(owner, &[known, unknown]).await.unwrap_err();
        assert_eq!(
            err,
            LinkError::ResourceNotFound {
                kind: EntityKind::Artifact,
                id: unknown
            }
        );
        assert!(fx.linked(owner).await.is_empty());
    }

    #[tokio::test]
    async fn unknown_owner_is_not_found() {
        let fx = Fixture::new();
        let child = fx.artifact().await;
        let owner = Uuid::new_v4();

        for result in [
            fx.linker.add(owner, &[child]).await,
            fx.linker.remove(owner, &[child]).await,
            fx.linker.replace(owner, &[child]).await,
            fx.linker.get(owner, QueryWindow::all()).await.map(|_| ()),
        ] {
            assert_eq!(
                result,
                Err(LinkError::ResourceNotFound {
                    kind: EntityKind::Representation,
                    id: owner
                })
            );
        }
    }

    #[tokio::test]
    async fn remove_ignores_unlinked_ids() {
        let fx = Fixture::new();
        let owner = fx.representation().await;
        let a = fx.artifact().await;
        let b = fx.artifact().await;
        fx.linker.add(owner, &[a]).await.unwrap();

        fx.linker.remove(owner, &[b, Uuid::new_v4()]).await.unwrap();
        assert_eq!(fx.linked(owner).await, vec![a]);

        fx.linker.remove(owner, &[a]).await.unwrap();
        assert!(fx.linked(owner).await.is_empty());
        // The child itself survives.
        assert!(fx.artifacts.exists(a).await.unwrap());
    }

    #[tokio::test]
    async fn replace_swaps_the_linked_set() {
        let fx = Fixture::new();
        let owner = fx.representation().await;
        let a = fx.artifact().await;
        let b = fx.artifact().await;
        fx.linker.add(owner, &[a]).await.unwrap();
        let writes = fx.representations.writes();

        fx.linker.replace(owner, &[b]).await.unwrap();
        assert_eq!(fx.linked(owner).await, vec![b]);
        assert_eq!(fx.representations.writes(), writes + 1);
    }

    #[tokio::test]
    async fn deleted_children_drop_out_of_get() {
        let fx = Fixture::new();
        let owner = fx.representation().await;
        let a = fx.artifact().await;
        let b = fx.artifact().await;
        fx.linker.add(owner, &[a, b]).await.unwrap();

        fx.artifacts.delete(a).await.unwrap();
        assert_eq!(fx.linked(owner).await, vec![b]);
    }

    #[tokio::test]
    async fn get_pages_children() {
        let fx = Fixture::new();
        let owner = fx.representation().await;
        let mut ids = Vec::new();
        for _ in 0..4 {
            ids.push(fx.artifact().await);
        }
        fx.linker.add(owner, &ids).await.unwrap();

        let page = fx.linker.get(owner, QueryWindow::page(1, 2)).await.unwrap();
        assert_eq!(
            page.iter().map(|a| a.id()).collect::<Vec<_>>(),
            ids[1..3].to_vec()
        );
    }

    #[tokio::test]
    async fn non_owning_view_reads_through_the_owning_side() {
        let store = ConnectorStore::in_memory();
        let relations = Relations::new(&store);

        let artifact = store
            .artifacts
            .save(ArtifactFactory::create(ArtifactDesc::local("a", "x")).unwrap())
            .await
            .unwrap()
            .id();
        let mut agreements = Vec::new();
        for _ in 0..2 {
            let agreement = AgreementFactory::create(AgreementDesc {
                value: "{}".into(),
                ..AgreementDesc::default()
            })
            .unwrap();
            agreements.push(store.agreements.save(agreement).await.unwrap().id());
        }

        relations
            .agreement_artifacts
            .add(agreements[0], &[artifact])
            .await
            .unwrap();
        let seen: Vec<Agreement> = relations
            .artifact_agreements
            .get(artifact, QueryWindow::all())
            .await
            .unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].id(), agreements[0]);

        // Mutating through the inverse view updates the owning side.
        relations
            .artifact_agreements
            .replace(artifact, &[agreements[1]])
            .await
            .unwrap();
        assert!(relations
            .agreement_artifacts
            .get_ids(agreements[0])
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            relations
                .agreement_artifacts
                .get_ids(agreements[1])
                .await
                .unwrap(),
            vec![artifact]
        );

        relations
            .artifact_agreements
            .remove(artifact, &[agreements[1]])
            .await
            .unwrap();
        assert!(relations
            .artifact_agreements
            .get_ids(artifact)
            .await
            .unwrap()
            .is_empty());
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
    }

    proptest! {
        #[test]
        fn add_is_idempotent(children in 1usize..6, picks in prop::collection::vec(0usize..6, 1..10)) {
            runtime().block_on(async {
                let fx = Fixture::new();
                let owner = fx.representation().await;
                let mut ids = Vec::new();
                for _ in 0..children {
                    ids.push(fx.artifact().await);
                }
                let chosen: Vec<Uuid> = picks.iter().map(|i| ids[i % children]).collect();

                fx.linker.add(owner, &chosen).await.unwrap();
                let once = fx.linked(owner).await;
                fx.linker.add(owner, &chosen).await.unwrap();
                let twice = fx.linked(owner).await;

                assert_eq!(once, twice);
                let mut expected = chosen.clone();
                expected.sort();
                expected.dedup();
                assert_eq!(once, expected);
            });
        }

        #[test]
        fn replace_with_empty_clears(children in 0usize..6) {
            runtime().block_on(async {
                let fx = Fixture::new();
                let owner = fx.representation().await;
                let mut ids = Vec::new();
                for _ in 0..children {
                    ids.push(fx.artifact().await);
                }
                fx.linker.add(owner, &ids).await.unwrap();

                fx.linker.replace(owner, &[]).await.unwrap();
                assert!(fx.linked(owner).await.is_empty());
            });
        }
    }
}
