//! Action parameters and the locators that stand in for live entities.
//!
//! A [`Param`] is either plain data or a reference to a container-resolvable
//! [`Entity`]. Entities are not durable; before a job is written to storage
//! each one is collapsed to a [`Locator`] and re-resolved after reading.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::container::Container;
use crate::error::ContainerError;

/// Durable reference to a container-resolvable entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Locator {
    /// Entity kind, the key the container's resolver is bound under.
    pub kind: String,
    /// Primary key of the entity.
    pub key: Value,
    /// Storage connection, when the entity does not live on the default one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<String>,
}

impl Locator {
    pub fn new(kind: impl Into<String>, key: impl Into<Value>) -> Self {
        Self {
            kind: kind.into(),
            key: key.into(),
            connection: None,
        }
    }

    pub fn on_connection(mut self, connection: impl Into<String>) -> Self {
        self.connection = Some(connection.into());
        self
    }
}

/// A live object owned by the host's storage layer.
pub trait Entity: Send + Sync + fmt::Debug + 'static {
    /// The locator that re-resolves to an equivalent entity.
    fn locator(&self) -> Locator;

    fn as_any(&self) -> &dyn Any;
}

/// One argument passed to an action.
#[derive(Debug, Clone)]
pub enum Param {
    /// Plain data.
    Value(Value),
    /// A live, container-resolvable entity.
    Entity(Arc<dyn Entity>),
    /// A list of parameters, transformed element by element.
    List(Vec<Param>),
    /// A collapsed entity waiting to be re-resolved.
    Locator(Locator),
}

impl Param {
    pub fn entity<E: Entity>(entity: E) -> Self {
        Self::Entity(Arc::new(entity))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Downcast a live entity parameter.
    pub fn as_entity<E: Entity>(&self) -> Option<&E> {
        match self {
            Self::Entity(e) => e.as_any().downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Replace live entities with their locators, recursing into lists.
    ///
    /// Applying this to an already collapsed parameter changes nothing.
    pub fn collapse(&mut self) {
        match self {
            Self::Entity(e) => *self = Self::Locator(e.locator()),
            Self::List(items) => items.iter_mut().for_each(Param::collapse),
            Self::Value(_) | Self::Locator(_) => {}
        }
    }

    /// Re-resolve locators into live entities, recursing into lists.
    ///
    /// Applying this to a parameter with no locators changes nothing.
    pub fn restore(&mut self, container: &Container) -> Result<(), (Locator, ContainerError)> {
        match self {
            Self::Locator(locator) => {
                let entity = container
                    .resolve_entity(locator)
                    .map_err(|e| (locator.clone(), e))?;
                *self = Self::Entity(entity);
            }
            Self::List(items) => {
                for item in items.iter_mut() {
                    item.restore(container)?;
                }
            }
            Self::Value(_) | Self::Entity(_) => {}
        }
        Ok(())
    }

    /// The durable form of this parameter.
    pub fn reduce(&self) -> ReducedParam {
        match self {
            Self::Value(v) => ReducedParam::Value(v.clone()),
            Self::Entity(e) => ReducedParam::Locator(e.locator()),
            Self::List(items) => ReducedParam::List(items.iter().map(Param::reduce).collect()),
            Self::Locator(l) => ReducedParam::Locator(l.clone()),
        }
    }
}

impl From<Value> for Param {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Arc<dyn Entity>> for Param {
    fn from(entity: Arc<dyn Entity>) -> Self {
        Self::Entity(entity)
    }
}

/// Serializable parameter: plain data and locators only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ReducedParam {
    Value(Value),
    Locator(Locator),
    List(Vec<ReducedParam>),
}

impl From<ReducedParam> for Param {
    fn from(reduced: ReducedParam) -> Self {
        match reduced {
            ReducedParam::Value(v) => Param::Value(v),
            ReducedParam::Locator(l) => Param::Locator(l),
            ReducedParam::List(items) => Param::List(items.into_iter().map(Param::from).collect()),
        }
    }
}
