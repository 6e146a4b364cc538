use crate::error::{LinkError, LinkResult};
use dsc_store::{QueryWindow, Repository, StorageError};
use dsc_types::Entity;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Reads the id list a record holds for one relation.
pub type GetLinks<T> = fn(&T) -> &[Uuid];

/// Replaces the id list a record holds for one relation.
pub type SetLinks<T> = fn(&mut T, Vec<Uuid>);

/// Which side of a relation holds the edge list.
pub enum LinkAccess<P, C> {
    /// The parent holds its children's ids.
    Owning {
        children: GetLinks<P>,
        set_children: SetLinks<P>,
    },
    /// Each child holds its parents' ids; the parent's view is a
    /// read-through query over the children.
    NonOwning {
        parents: GetLinks<C>,
        set_parents: SetLinks<C>,
    },
}

impl<P, C> Clone for LinkAccess<P, C> {
    fn clone(&self) -> Self {
        match self {
            LinkAccess::Owning {
                children,
                set_children,
            } => LinkAccess::Owning {
                children: *children,
                set_children: *set_children,
            },
            LinkAccess::NonOwning {
                parents,
                set_parents,
            } => LinkAccess::NonOwning {
                parents: *parents,
                set_parents: *set_parents,
            },
        }
    }
}

/// Set-based link manager between a parent record type and a child record type.
///
/// All mutating operations validate every id before touching anything and
/// write each affected record at most once.
pub struct Linker<P: Entity, C: Entity> {
    owners: Arc<dyn Repository<P>>,
    children: Arc<dyn Repository<C>>,
    access: LinkAccess<P, C>,
}

impl<P: Entity, C: Entity> Clone for Linker<P, C> {
    fn clone(&self) -> Self {
        Self {
            owners: self.owners.clone(),
            children: self.children.clone(),
            access: self.access.clone(),
        }
    }
}

impl<P: Entity, C: Entity> Linker<P, C> {
    pub fn owning(
        owners: Arc<dyn Repository<P>>,
        children: Arc<dyn Repository<C>>,
        get: GetLinks<P>,
        set: SetLinks<P>,
    ) -> Self {
        Self {
            owners,
            children,
            access: LinkAccess::Owning {
                children: get,
                set_children: set,
            },
        }
    }

    pub fn non_owning(
        owners: Arc<dyn Repository<P>>,
        children: Arc<dyn Repository<C>>,
        get: GetLinks<C>,
        set: SetLinks<C>,
    ) -> Self {
        Self {
            owners,
            children,
            access: LinkAccess::NonOwning {
                parents: get,
                set_parents: set,
            },
        }
    }

    /// Page of live children linked to `owner`.
    pub async fn get(&self, owner: Uuid, window: QueryWindow) -> LinkResult<Vec<C>> {
        let parent = self.require_owner(owner).await?;
        let linked = match &self.access {
            LinkAccess::Owning { children, .. } => {
                self.children.get_many(children(&parent)).await?
            }
            LinkAccess::NonOwning { parents, .. } => self.linked_children(owner, *parents).await?,
        };
        Ok(window.apply(linked))
    }

    /// Ids of live children linked to `owner`.
    pub async fn get_ids(&self, owner: Uuid) -> LinkResult<Vec<Uuid>> {
        Ok(self
            .get(owner, QueryWindow::all())
            .await?
            .iter()
            .map(|child| child.id())
            .collect())
    }

    /// Link `ids` to `owner`. Already-linked ids are left alone.
    pub async fn add(&self, owner: Uuid, ids: &[Uuid]) -> LinkResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        self.require_owner(owner).await?;
        self.require_children(ids).await?;
        let ids = dedup(ids);

        match &self.access {
            LinkAccess::Owning {
                children,
                set_children,
            } => {
                let (get, set) = (*children, *set_children);
                self.modify_owner(owner, move |parent| {
                    let mut links = get(parent).to_vec();
                    for id in ids {
                        if !links.contains(&id) {
                            links.push(id);
                        }
                    }
                    set(parent, links);
                })
                .await?;
            }
            LinkAccess::NonOwning {
                parents,
                set_parents,
            } => {
                for child in self.children.get_many(&ids).await? {
                    if !parents(&child).contains(&owner) {
                        self.modify_child(child.id(), *parents, *set_parents, move |links| {
                            if !links.contains(&owner) {
                                links.push(owner);
                            }
                        })
                        .await?;
                    }
                }
            }
        }

        debug!(kind = %P::KIND, owner = %owner, child_kind = %C::KIND, "links added");
        Ok(())
    }

    /// Unlink `ids` from `owner`. Ids that are not linked are ignored.
    pub async fn remove(&self, owner: Uuid, ids: &[Uuid]) -> LinkResult<()> {
        self.require_owner(owner).await?;
        if ids.is_empty() {
            return Ok(());
        }
        let ids = dedup(ids);

        match &self.access {
            LinkAccess::Owning {
                children,
                set_children,
            } => {
                let (get, set) = (*children, *set_children);
                self.modify_owner(owner, move |parent| {
                    let links = get(parent)
                        .iter()
                        .filter(|id| !ids.contains(*id))
                        .copied()
                        .collect();
                    set(parent, links);
                })
                .await?;
            }
            LinkAccess::NonOwning {
                parents,
                set_parents,
            } => {
                for child in self.children.get_many(&ids).await? {
                    if parents(&child).contains(&owner) {
                        self.modify_child(child.id(), *parents, *set_parents, move |links| {
                            links.retain(|id| *id != owner);
                        })
                        .await?;
                    }
                }
            }
        }

        debug!(kind = %P::KIND, owner = %owner, child_kind = %C::KIND, "links removed");
        Ok(())
    }

    /// Make `ids` the exact set of children of `owner`. An empty `ids`
    /// clears all links.
    pub async fn replace(&self, owner: Uuid, ids: &[Uuid]) -> LinkResult<()> {
        self.require_owner(owner).await?;
        if !ids.is_empty() {
            self.require_children(ids).await?;
        }
        let ids = dedup(ids);

        match &self.access {
            LinkAccess::Owning { set_children, .. } => {
                let set = *set_children;
                self.modify_owner(owner, move |parent| set(parent, ids)).await?;
            }
            LinkAccess::NonOwning {
                parents,
                set_parents,
            } => {
                for child in self.linked_children(owner, *parents).await? {
                    if !ids.contains(&child.id()) {
                        self.modify_child(child.id(), *parents, *set_parents, move |links| {
                            links.retain(|id| *id != owner);
                        })
                        .await?;
                    }
                }
                for child in self.children.get_many(&ids).await? {
                    if !parents(&child).contains(&owner) {
                        self.modify_child(child.id(), *parents, *set_parents, move |links| {
                            if !links.contains(&owner) {
                                links.push(owner);
                            }
                        })
                        .await?;
                    }
                }
            }
        }

        debug!(kind = %P::KIND, owner = %owner, child_kind = %C::KIND, "links replaced");
        Ok(())
    }

    async fn require_owner(&self, owner: Uuid) -> LinkResult<P> {
        self.owners
            .get(owner)
            .await?
            .ok_or(LinkError::ResourceNotFound {
                kind: P::KIND,
                id: owner,
            })
    }

    async fn require_children(&self, ids: &[Uuid]) -> LinkResult<()> {
        match self.children.missing(ids).await?.first() {
            Some(id) => Err(LinkError::ResourceNotFound {
                kind: C::KIND,
                id: *id,
            }),
            None => Ok(()),
        }
    }

    async fn linked_children(&self, owner: Uuid, parents: GetLinks<C>) -> LinkResult<Vec<C>> {
        Ok(self
            .children
            .list(QueryWindow::all())
            .await?
            .into_iter()
            .filter(|child| parents(child).contains(&owner))
            .collect())
    }

    async fn modify_owner<F>(&self, owner: Uuid, change: F) -> LinkResult<()>
    where
        F: FnOnce(&mut P) + Send + 'static,
    {
        self.owners
            .modify(
                owner,
                Box::new(move |parent| {
                    change(parent);
                    Ok(())
                }),
            )
            .await
            .map_err(|e| match e {
                StorageError::NotFound(_) => LinkError::ResourceNotFound {
                    kind: P::KIND,
                    id: owner,
                },
                other => LinkError::Storage(other),
            })?;
        Ok(())
    }

    async fn modify_child<F>(
        &self,
        child: Uuid,
        get: GetLinks<C>,
        set: SetLinks<C>,
        change: F,
    ) -> LinkResult<()>
    where
        F: FnOnce(&mut Vec<Uuid>) + Send + 'static,
    {
        self.children
            .modify(
                child,
                Box::new(move |record| {
                    let mut links = get(record).to_vec();
                    change(&mut links);
                    set(record, links);
                    Ok(())
                }),
            )
            .await
            .map_err(|e| match e {
                StorageError::NotFound(_) => LinkError::ResourceNotFound {
                    kind: C::KIND,
                    id: child,
                },
                other => LinkError::Storage(other),
            })?;
        Ok(())
    }
}

fn dedup(ids: &[Uuid]) -> Vec<Uuid> {
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(id) {
            out.push(*id);
        }
    }
    out
}
