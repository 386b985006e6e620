//! Event-loop driver (§4.5): pops the Timeline's earliest batch and hands
//! each event to its handler. Mirrors the teacher's runner in spirit — pop,
//! handle, repeat — but dispatches on event kind directly rather than
//! through a `bevy_ecs::Schedule`, since this domain has exactly two event
//! kinds and no cross-cutting per-tick systems to gate with `run_if`.

use bevy_ecs::prelude::World;

use crate::arrival;
use crate::clock::{EventSubject, Timeline};
use crate::dispatch;
use crate::error::{SimError, SimResult};

/// Guards against a runaway timeline (a bug that keeps rescheduling events
/// forever); real scenarios finish in a few thousand steps.
pub const MAX_STEPS: usize = 2_000_000;

/// Pop and process the next tied batch of events. Returns `false` once the
/// timeline is empty.
pub fn run_next_event(world: &mut World) -> SimResult<bool> {
    let popped = world.resource_mut::<Timeline>().pop_earliest();
    let Some((t, group)) = popped else {
        return Ok(false);
    };
    for event in group {
        match event.subject {
            EventSubject::Dispatch {
                route_id,
                vehicle_index,
            } => dispatch::dispatch(world, t, route_id, vehicle_index)?,
            EventSubject::Arrive { vehicle, stop_index } => {
                arrival::arrival(world, t, vehicle, stop_index)?
            }
        }
    }
    Ok(true)
}

/// Drains the timeline to completion, returning the number of batches processed.
pub fn run_until_empty(world: &mut World) -> SimResult<usize> {
    let mut steps = 0usize;
    while run_next_event(world)? {
        steps += 1;
        if steps >= MAX_STEPS {
            return Err(SimError::InternalInvariantViolated(
                "timeline did not drain within the step budget".to_string(),
            ));
        }
    }
    Ok(steps)
}
