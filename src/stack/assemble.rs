//! Turn opened containers into one lazy stack.

use std::sync::Arc;

use tracing::debug;

use super::container::Container;
use super::lazy::{LazyPlane, LazyStack, Stack};
use crate::error::OpenError;

/// Wrap every page of every container as a lazy plane.
///
/// Containers are walked in the given order and pages in series order, so
/// plane `i` of the result is the `i`-th page in container-then-page order.
/// Only the first series of each container is used; callers check that
/// there is exactly one. No page is decoded and shapes are taken from the
/// container's metadata as-is, without checking that they agree.
///
/// # Errors
/// `OpenError::Empty` when the containers hold no pages at all.
pub fn assemble(containers: &[Arc<dyn Container>]) -> Result<Stack, OpenError> {
    let mut planes = Vec::new();

    for container in containers {
        let Some(series) = container.series().first() else {
            continue;
        };
        for page in &series.pages {
            planes.push(LazyPlane::new(
                Arc::clone(container),
                page.index,
                page.shape.clone(),
                series.dtype,
            ));
        }
    }

    debug!(
        containers = containers.len(),
        planes = planes.len(),
        "assembled lazy stack"
    );

    match planes.len() {
        0 => Err(OpenError::Empty),
        1 => Ok(Stack::Single(planes.remove(0))),
        _ => Ok(Stack::Stacked(LazyStack::new(planes)?)),
    }
}
