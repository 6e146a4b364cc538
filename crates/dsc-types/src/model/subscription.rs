use super::{set_if_changed, Factory};
use crate::entity::{impl_entity, EntityKind, EntityMeta};
use crate::error::TypesResult;
use crate::Uri;
use serde::{Deserialize, Serialize};

/// A callback registered for changes to a resource or artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(flatten)]
    pub meta: EntityMeta,
    pub title: String,
    /// Self-link of the watched resource or artifact.
    pub target: Uri,
    /// Callback notified on change.
    pub url: Uri,
    /// Identity of the subscriber.
    pub subscriber: Uri,
    /// Include the current artifact data in notifications.
    pub push_data: bool,
}

impl_entity!(Subscription, EntityKind::Subscription);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionDesc {
    #[serde(default)]
    pub title: Option<String>,
    pub target: Uri,
    pub url: Uri,
    pub subscriber: Uri,
    #[serde(default)]
    pub push_data: bool,
}

pub struct SubscriptionFactory;

impl Factory for SubscriptionFactory {
    type Entity = Subscription;
    type Desc = SubscriptionDesc;

    fn create(desc: SubscriptionDesc) -> TypesResult<Subscription> {
        Ok(Subscription {
            meta: EntityMeta::new(),
            title: desc.title.unwrap_or_default(),
            target: desc.target,
            url: desc.url,
            subscriber: desc.subscriber,
            push_data: desc.push_data,
        })
    }

    fn update(subscription: &mut Subscription, desc: SubscriptionDesc) -> TypesResult<bool> {
        let mut changed = false;
        set_if_changed(&mut subscription.title, desc.title.unwrap_or_default(), &mut changed);
        set_if_changed(&mut subscription.target, desc.target, &mut changed);
        set_if_changed(&mut subscription.url, desc.url, &mut changed);
        set_if_changed(&mut subscription.subscriber, desc.subscriber, &mut changed);
        set_if_changed(&mut subscription.push_data, desc.push_data, &mut changed);
        Ok(changed)
    }
}
