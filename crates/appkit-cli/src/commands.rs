//! Handlers for `appkit components ...`.
//!
//! Each action returns a [`Report`] which `main.rs` prints either as text
//! or as JSON. Duplicate slugs are refused here; the store itself accepts
//! them.

use std::fmt;

use anyhow::{bail, Context, Result};
use appkit_store::{AppId, Component, ComponentId, ComponentRef, ComponentStore, MetadataStore};
use serde::Serialize;
use tracing::info;

use crate::cli::{ComponentAction, ComponentFields};

/// A component together with its id, as printed.
#[derive(Debug, Serialize)]
pub struct Entry {
    pub id: ComponentId,
    #[serde(flatten)]
    pub component: Component,
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.id, self.component.slug, self.component.kind)?;
        if !self.component.label.is_empty() {
            write!(f, " \"{}\"", self.component.label)?;
        }
        Ok(())
    }
}

/// Outcome of a components action.
#[derive(Debug, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Report {
    List { app: AppId, components: Vec<Entry> },
    Show { app: AppId, component: Entry },
    Added { app: AppId, component: Entry },
    Updated { app: AppId, component: Entry },
    Deleted { app: AppId, id: ComponentId },
    Exists { app: AppId, id: Option<ComponentId> },
    Check { app: AppId, dangling: Vec<Entry> },
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List { app, components } => {
                writeln!(f, "  App {app}: {} component(s)", components.len())?;
                for entry in components {
                    writeln!(f, "    {entry}")?;
                }
                Ok(())
            }
            Self::Show { component, .. } => {
                writeln!(f, "  {component}")?;
                for (key, value) in &component.component.options {
                    writeln!(f, "    {key} = {value}")?;
                }
                Ok(())
            }
            Self::Added { app, component } => writeln!(f, "  [+] Added {component} to app {app}"),
            Self::Updated { app, component } => {
                writeln!(f, "  [=] Updated {component} in app {app}")
            }
            Self::Deleted { app, id } => writeln!(f, "  [-] Deleted component {id} from app {app}"),
            Self::Exists { id: Some(id), .. } => writeln!(f, "  {id}"),
            Self::Exists { app, id: None } => writeln!(f, "  Not found in app {app}"),
            Self::Check { app, dangling } if dangling.is_empty() => {
                writeln!(f, "  App {app}: all component types are known")
            }
            Self::Check { app, dangling } => {
                writeln!(
                    f,
                    "  App {app}: {} component(s) with an unknown type",
                    dangling.len()
                )?;
                for entry in dangling {
                    writeln!(f, "    [!] {entry} -- remove it or reinstall its type")?;
                }
                Ok(())
            }
        }
    }
}

/// Run one components action against `store`.
///
/// `default_known_types` is used by `check` when no `--known-type` was
/// given.
pub async fn run<M: MetadataStore>(
    store: &ComponentStore<M>,
    app: AppId,
    action: ComponentAction,
    default_known_types: &[String],
) -> Result<Report> {
    match action {
        ComponentAction::List => {
            let components = store.list(app).await?;
            Ok(Report::List {
                app,
                components: components
                    .into_iter()
                    .map(|(id, component)| Entry { id, component })
                    .collect(),
            })
        }

        ComponentAction::Show { target } => {
            let Some(id) = store.exists(app, &target, None).await? else {
                bail!("no component with {target} in app {app}");
            };
            let component = store
                .find_by_id(app, id)
                .await?
                .with_context(|| format!("component {id} vanished from app {app}"))?;
            Ok(Report::Show {
                app,
                component: Entry { id, component },
            })
        }

        ComponentAction::Add { slug, kind, fields } => {
            ensure_slug_free(store, app, &slug, None).await?;
            let mut component = Component::new(slug, kind);
            apply_fields(&mut component, fields)?;

            let id = store
                .upsert(app, component.clone(), None)
                .await?
                .context("store did not allocate an id")?;
            info!(app_id = app, component_id = id, slug = %component.slug, "component added");
            Ok(Report::Added {
                app,
                component: Entry { id, component },
            })
        }

        ComponentAction::Update {
            id,
            slug,
            kind,
            fields,
        } => {
            let Some(mut component) = store.find_by_id(app, id).await? else {
                bail!("no component with id {id} in app {app}");
            };
            if let Some(slug) = slug {
                ensure_slug_free(store, app, &slug, Some(id)).await?;
                component.slug = slug;
            }
            if let Some(kind) = kind {
                component.kind = kind;
            }
            apply_fields(&mut component, fields)?;

            let Some(id) = store.upsert(app, component.clone(), Some(id)).await? else {
                bail!("component {id} was removed from app {app} during the update");
            };
            info!(app_id = app, component_id = id, slug = %component.slug, "component updated");
            Ok(Report::Updated {
                app,
                component: Entry { id, component },
            })
        }

        ComponentAction::Delete { id } => {
            if !store.delete(app, id).await? {
                bail!("no component with id {id} in app {app}");
            }
            info!(app_id = app, component_id = id, "component deleted");
            Ok(Report::Deleted { app, id })
        }

        ComponentAction::Exists { target, except } => {
            let id = store.exists(app, &target, except).await?;
            Ok(Report::Exists { app, id })
        }

        ComponentAction::Check { known_types } => {
            let known = if known_types.is_empty() {
                default_known_types
            } else {
                known_types.as_slice()
            };
            let dangling = store
                .dangling(app, |kind| known.iter().any(|k| k == kind))
                .await?;
            Ok(Report::Check {
                app,
                dangling: dangling
                    .into_iter()
                    .map(|(id, component)| Entry { id, component })
                    .collect(),
            })
        }
    }
}

async fn ensure_slug_free<M: MetadataStore>(
    store: &ComponentStore<M>,
    app: AppId,
    slug: &str,
    except: Option<ComponentId>,
) -> Result<()> {
    if slug.trim().is_empty() {
        bail!("component slug must not be empty");
    }
    let reference = ComponentRef::Slug(slug.to_string());
    if let Some(other) = store.exists(app, &reference, except).await? {
        bail!("slug '{slug}' is already used by component {other} in app {app}");
    }
    Ok(())
}

fn apply_fields(component: &mut Component, fields: ComponentFields) -> Result<()> {
    if let Some(label) = fields.label {
        component.label = label;
    }
    if let Some(raw) = fields.options {
        let value: serde_json::Value =
            serde_json::from_str(&raw).context("--options must be valid JSON")?;
        let serde_json::Value::Object(options) = value else {
            bail!("--options must be a JSON object");
        };
        component.options = options;
    }
    Ok(())
}
