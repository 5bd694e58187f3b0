//! Per-app components storage.
//!
//! Each app keeps all of its components in one metadata value under
//! [`COMPONENTS_META_KEY`]. Every operation loads the whole collection,
//! scans it linearly and, for mutations, writes the whole collection back.
//! There is no locking across that read-modify-write: two writers on the
//! same app race and the last write wins.
//!
//! Slug uniqueness is not enforced here. Lookups by slug return the first
//! match in id order; callers that care check [`ComponentStore::exists`]
//! with an `except` id before writing.

use serde_json::Value;
use tracing::{debug, instrument};

use crate::component::{Component, ComponentId, ComponentRef, Components};
use crate::error::{StoreError, StoreResult};
use crate::meta::{AppId, MetadataStore};

/// Metadata key holding an app's components collection.
pub const COMPONENTS_META_KEY: &str = "_appkit_components";

/// CRUD over the components collection of each app.
///
/// Holds no state besides the injected metadata facility.
#[derive(Clone)]
pub struct ComponentStore<M> {
    meta: M,
}

impl<M: MetadataStore> ComponentStore<M> {
    pub fn new(meta: M) -> Self {
        Self { meta }
    }

    /// The underlying metadata facility.
    pub fn metadata(&self) -> &M {
        &self.meta
    }

    /// All components of `app`, ordered by id. Empty if none were stored.
    #[instrument(skip(self))]
    pub async fn list(&self, app: AppId) -> StoreResult<Components> {
        let stored = self.meta.get(app, COMPONENTS_META_KEY).await?;
        decode(stored)
    }

    /// Number of components stored for `app`.
    pub async fn count(&self, app: AppId) -> StoreResult<usize> {
        Ok(self.list(app).await?.len())
    }

    /// Apps that have a components collection, even an empty one.
    pub async fn apps(&self) -> StoreResult<Vec<AppId>> {
        self.meta.owners(COMPONENTS_META_KEY).await
    }

    /// First component matching `reference`, in id order.
    #[instrument(skip(self))]
    pub async fn find(&self, app: AppId, reference: &ComponentRef) -> StoreResult<Option<Component>> {
        let components = self.list(app).await?;
        Ok(first_match(&components, reference, None).map(|(_, component)| component.clone()))
    }

    pub async fn find_by_slug(&self, app: AppId, slug: &str) -> StoreResult<Option<Component>> {
        self.find(app, &ComponentRef::Slug(slug.to_string())).await
    }

    pub async fn find_by_id(&self, app: AppId, id: ComponentId) -> StoreResult<Option<Component>> {
        self.find(app, &ComponentRef::Id(id)).await
    }

    /// Id of the first component matching `reference`, skipping `except`.
    ///
    /// `except: None` skips nothing; `Some(0)` skips the component stored
    /// under id 0, which is a real id here. Nothing about the component's
    /// type is checked, so components whose type is no longer known still
    /// exist here and can be reported by higher layers. Pass `except` to ask
    /// whether some *other* component already uses a slug.
    #[instrument(skip(self))]
    pub async fn exists(
        &self,
        app: AppId,
        reference: &ComponentRef,
        except: Option<ComponentId>,
    ) -> StoreResult<Option<ComponentId>> {
        let components = self.list(app).await?;
        Ok(first_match(&components, reference, except).map(|(id, _)| id))
    }

    /// Current id of `component`, resolved through its slug.
    pub async fn component_id(
        &self,
        app: AppId,
        component: &Component,
    ) -> StoreResult<Option<ComponentId>> {
        self.exists(app, &ComponentRef::Slug(component.slug.clone()), None)
            .await
    }

    /// Insert `component`, or overwrite the one stored under `id`.
    ///
    /// Without an id the next id (`max + 1`, or 1 for an empty collection)
    /// is allocated; a collection already holding `u64::MAX` is rejected
    /// with [`StoreError::InvalidArgument`]. `Some(0)` targets the component
    /// stored under id 0 rather than meaning "no id". With an id that is not
    /// stored nothing is written and `None` is returned.
    #[instrument(skip(self, component), fields(slug = %component.slug))]
    pub async fn upsert(
        &self,
        app: AppId,
        component: Component,
        id: Option<ComponentId>,
    ) -> StoreResult<Option<ComponentId>> {
        let mut components = self.list(app).await?;

        let id = match id {
            None => next_id(&components)?,
            Some(id) => match first_match(&components, &ComponentRef::Id(id), None) {
                Some((resolved, _)) => resolved,
                None => {
                    debug!(app_id = app, component_id = id, "upsert target not found");
                    return Ok(None);
                }
            },
        };

        components.insert(id, component);
        self.save(app, &components).await?;
        debug!(app_id = app, component_id = id, "component saved");
        Ok(Some(id))
    }

    /// Remove the component stored under `id`. Returns `false`, without
    /// writing, if there is none.
    #[instrument(skip(self))]
    pub async fn delete(&self, app: AppId, id: ComponentId) -> StoreResult<bool> {
        let mut components = self.list(app).await?;
        if components.remove(&id).is_none() {
            return Ok(false);
        }
        self.save(app, &components).await?;
        debug!(app_id = app, component_id = id, "component deleted");
        Ok(true)
    }

    /// Components whose type `is_known` rejects, in id order.
    pub async fn dangling<F>(
        &self,
        app: AppId,
        is_known: F,
    ) -> StoreResult<Vec<(ComponentId, Component)>>
    where
        F: Fn(&str) -> bool,
    {
        let components = self.list(app).await?;
        Ok(components
            .into_iter()
            .filter(|(_, component)| !is_known(&component.kind))
            .collect())
    }

    async fn save(&self, app: AppId, components: &Components) -> StoreResult<()> {
        let value = serde_json::to_value(components)?;
        self.meta.set(app, COMPONENTS_META_KEY, value).await
    }
}

/// Decode a stored collection. Absent, `null`, `""` and `[]` all mean an
/// empty collection.
fn decode(stored: Option<Value>) -> StoreResult<Components> {
    match stored {
        None | Some(Value::Null) => Ok(Components::new()),
        Some(Value::String(s)) if s.is_empty() => Ok(Components::new()),
        Some(Value::Array(items)) if items.is_empty() => Ok(Components::new()),
        Some(value) => Ok(serde_json::from_value(value)?),
    }
}

fn first_match<'a>(
    components: &'a Components,
    reference: &ComponentRef,
    except: Option<ComponentId>,
) -> Option<(ComponentId, &'a Component)> {
    components
        .iter()
        .find(|(id, component)| reference.matches(**id, component) && except != Some(**id))
        .map(|(id, component)| (*id, component))
}

fn next_id(components: &Components) -> StoreResult<ComponentId> {
    match components.keys().next_back() {
        None => Ok(1),
        Some(max) => max.checked_add(1).ok_or_else(|| {
            StoreError::InvalidArgument(format!("no component id left after {max}"))
        }),
    }
}

// ── tests ────────────────────────────────────────────────────────────
